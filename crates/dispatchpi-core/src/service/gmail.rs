//! Gmail REST API mail source.
//!
//! Only the three read calls the frames need are implemented: message listing
//! with a search query, full message retrieval and attachment download.

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::caption::clean_caption;
use super::{AttachmentPart, MailSource, MessageDetail, MessageRef, ProviderError};

/// Default Gmail API endpoint.
pub const DEFAULT_API_BASE: &str = "https://gmail.googleapis.com";

/// Gmail emits URL-safe base64, sometimes with padding and sometimes without.
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Mail source backed by the Gmail REST API.
#[derive(Debug, Clone)]
pub struct GmailClient {
    http_client: Client,
    api_base: String,
    user_id: String,
    access_token: String,
}

impl GmailClient {
    /// Creates a client for the authenticated user (`me`).
    #[must_use]
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            http_client: Client::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            user_id: "me".to_string(),
            access_token: access_token.into(),
        }
    }

    /// Sets the API endpoint.
    #[must_use]
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    fn messages_url(&self) -> String {
        format!("{}/gmail/v1/users/{}/messages", self.api_base, self.user_id)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ProviderError::Auth(response.text().await.unwrap_or_default()));
        }
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.json().await?)
    }
}

impl MailSource for GmailClient {
    async fn list_candidate_messages(&self, query: &str) -> Result<Vec<MessageRef>, ProviderError> {
        let list: MessageList = self.get_json(&self.messages_url(), &[("q", query)]).await?;
        tracing::debug!(query, count = list.messages.len(), "Listed messages");
        Ok(list
            .messages
            .into_iter()
            .map(|m| MessageRef { id: m.id })
            .collect())
    }

    async fn fetch_message_detail(&self, message_id: &str) -> Result<MessageDetail, ProviderError> {
        let url = format!("{}/{message_id}", self.messages_url());
        let message: GmailMessage = self.get_json(&url, &[("format", "full")]).await?;
        Ok(message_detail(message))
    }

    async fn fetch_attachment_bytes(
        &self,
        message_id: &str,
        attachment_handle: &str,
    ) -> Result<Vec<u8>, ProviderError> {
        let url = format!(
            "{}/{message_id}/attachments/{attachment_handle}",
            self.messages_url()
        );
        let body: MessagePartBody = self.get_json(&url, &[]).await?;
        let data = body
            .data
            .ok_or_else(|| ProviderError::Decode("attachment has no data".to_string()))?;
        decode_base64(&data)
    }
}

/// Response of `users.messages.list`.
#[derive(Debug, Deserialize)]
struct MessageList {
    /// Absent when nothing matches.
    #[serde(default)]
    messages: Vec<MessageId>,
}

#[derive(Debug, Deserialize)]
struct MessageId {
    id: String,
}

/// Response of `users.messages.get` with `format=full`.
#[derive(Debug, Deserialize)]
struct GmailMessage {
    id: String,
    #[serde(default)]
    payload: MessagePart,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePart {
    #[serde(default)]
    part_id: String,
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    filename: String,
    #[serde(default)]
    headers: Vec<Header>,
    #[serde(default)]
    body: MessagePartBody,
    #[serde(default)]
    parts: Vec<MessagePart>,
}

#[derive(Debug, Deserialize)]
struct Header {
    name: String,
    value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessagePartBody {
    attachment_id: Option<String>,
    data: Option<String>,
}

/// Reduces a full Gmail message to sender, caption and attachment parts.
fn message_detail(message: GmailMessage) -> MessageDetail {
    let payload = message.payload;

    let sender = payload
        .headers
        .iter()
        .rev()
        .find(|h| h.name.eq_ignore_ascii_case("From"))
        .map(|h| h.value.clone())
        .unwrap_or_default();

    let mut caption = String::new();
    let mut attachments = Vec::new();
    // Every attachment shares the last non-empty text found in the message.
    for part in payload.parts {
        if let Some(text) = part_text(&part) {
            caption = text;
        }

        // Parts without a file name are signatures, logos and the like.
        if let Some(handle) = part.body.attachment_id
            && !part.filename.is_empty()
        {
            attachments.push(AttachmentPart {
                part_id: part.part_id,
                attachment_handle: handle,
                filename: part.filename,
            });
        }
    }

    MessageDetail {
        id: message.id,
        sender,
        caption,
        attachments,
    }
}

/// Body text carried by a top-level part, cleaned, if any.
///
/// Undecodable bodies yield no text and never fail the message. Bytes that
/// are not UTF-8 are replaced.
fn part_text(part: &MessagePart) -> Option<String> {
    let data = if let Some(first) = part.parts.first() {
        first.body.data.as_deref()
    } else if part.mime_type == "text/plain" {
        part.body.data.as_deref()
    } else {
        None
    };

    let bytes = match decode_base64(data?) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!(part_id = %part.part_id, error = %e, "Ignoring undecodable text part");
            return None;
        }
    };
    let text = String::from_utf8_lossy(&bytes);
    if text.is_empty() {
        return None;
    }
    Some(clean_caption(&text))
}

fn decode_base64(data: &str) -> Result<Vec<u8>, ProviderError> {
    URL_SAFE_LENIENT
        .decode(data.trim())
        .map_err(|e| ProviderError::Decode(e.to_string()))
}
