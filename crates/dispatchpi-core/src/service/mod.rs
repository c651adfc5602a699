//! Services that feed the queues and consume their output.
//!
//! The scheduler only talks to a mail provider and a renderer through the
//! [`MailSource`] and [`Renderer`] traits. [`GmailClient`] is the production
//! mail source.

pub mod caption;
pub mod gmail;
mod render;

use std::future::Future;

pub use caption::clean_caption;
pub use gmail::GmailClient;
pub use render::{RawRenderer, Renderer};

/// Errors that can occur while talking to the mail provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with an error status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error body returned by the provider.
        message: String,
    },

    /// Authentication was rejected.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Response content could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}

/// A message returned by a listing call, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRef {
    /// Provider message identifier.
    pub id: String,
}

/// An attachment part of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPart {
    /// Part identifier within the message, stable across calls.
    pub part_id: String,
    /// Provider handle used to download the bytes. Changes between calls.
    pub attachment_handle: String,
    /// Attachment file name. Inline logos and similar parts have none.
    pub filename: String,
}

/// The parts of a message the scheduler cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDetail {
    /// Provider message identifier.
    pub id: String,
    /// Value of the `From` header.
    pub sender: String,
    /// Cleaned caption text. May be empty.
    pub caption: String,
    /// Attachment parts, in message order.
    pub attachments: Vec<AttachmentPart>,
}

/// A mail provider that can list messages and download attachments.
pub trait MailSource {
    /// Lists messages matching the provider search `query`, newest first.
    fn list_candidate_messages(
        &self,
        query: &str,
    ) -> impl Future<Output = Result<Vec<MessageRef>, ProviderError>> + Send;

    /// Fetches sender, caption and attachment parts of a message.
    fn fetch_message_detail(
        &self,
        message_id: &str,
    ) -> impl Future<Output = Result<MessageDetail, ProviderError>> + Send;

    /// Downloads the raw bytes of an attachment.
    fn fetch_attachment_bytes(
        &self,
        message_id: &str,
        attachment_handle: &str,
    ) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;
}
