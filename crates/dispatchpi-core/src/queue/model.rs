//! Queued attachment model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An image attachment pulled from the shared inbox, waiting for its day on a frame.
///
/// Identity is carried by `unique_attachment_id`. The provider's attachment handle
/// changes on every API call and is only used to fetch bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailImage {
    /// Stable identity of the attachment, `"{message_id}_{part_id}"`.
    pub unique_attachment_id: String,
    /// Provider handle used to download the attachment bytes.
    pub temporary_attachment_id: String,
    /// Identifier of the message carrying the attachment.
    pub message_id: String,
    /// Caption taken from the message body. May be empty.
    pub text: String,
    /// Day on which the image is shown. Assigned by the queue on enqueue.
    #[serde(default, with = "iso_date")]
    pub display_date: Option<NaiveDate>,
}

impl EmailImage {
    /// Creates a new, not yet scheduled image record.
    #[must_use]
    pub fn new(
        unique_attachment_id: impl Into<String>,
        temporary_attachment_id: impl Into<String>,
        message_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            unique_attachment_id: unique_attachment_id.into(),
            temporary_attachment_id: temporary_attachment_id.into(),
            message_id: message_id.into(),
            text: text.into(),
            display_date: None,
        }
    }

    /// Sets the display date.
    #[must_use]
    pub const fn with_display_date(mut self, display_date: NaiveDate) -> Self {
        self.display_date = Some(display_date);
        self
    }

    /// Builds the stable attachment identity from message and part identifiers.
    #[must_use]
    pub fn attachment_identity(message_id: &str, part_id: &str) -> String {
        format!("{message_id}_{part_id}")
    }

    /// Returns true if the image is scheduled for `today` or later.
    #[must_use]
    pub fn is_due_on_or_after(&self, today: NaiveDate) -> bool {
        self.display_date.is_some_and(|date| date >= today)
    }
}

/// Serde helpers for `Option<NaiveDate>` stored as an ISO-8601 string or `null`.
///
/// Datetime strings are accepted on read and truncated to their date part.
mod iso_date {
    use chrono::{NaiveDate, NaiveDateTime};
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)] // Required by serde with= signature
    pub fn serialize<S>(date: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => serializer.serialize_str(&date.format("%Y-%m-%d").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(s) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        if s.is_empty() {
            return Ok(None);
        }

        NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .or_else(|_| s.parse::<NaiveDateTime>().map(|dt| dt.date()))
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid display_date {s:?}: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_new_is_unscheduled() {
        let image = EmailImage::new("m1_1", "tmp", "m1", "hello");
        assert_eq!(image.unique_attachment_id, "m1_1");
        assert!(image.display_date.is_none());
        assert!(!image.is_due_on_or_after(date(2024, 1, 1)));
    }

    #[test]
    fn test_attachment_identity() {
        assert_eq!(EmailImage::attachment_identity("18c2f", "1"), "18c2f_1");
    }

    #[test]
    fn test_serialize_fields() {
        let image =
            EmailImage::new("m1_2", "ANGjdJ", "m1", "from grandma").with_display_date(date(2024, 3, 9));
        let value = serde_json::to_value(&image).unwrap();
        assert_eq!(
            value,
            json!({
                "unique_attachment_id": "m1_2",
                "temporary_attachment_id": "ANGjdJ",
                "message_id": "m1",
                "text": "from grandma",
                "display_date": "2024-03-09",
            })
        );
    }

    #[test]
    fn test_unset_date_serializes_as_null() {
        let image = EmailImage::new("m1_2", "t", "m1", "");
        let value = serde_json::to_value(&image).unwrap();
        assert!(value["display_date"].is_null());

        let back: EmailImage = serde_json::from_value(value).unwrap();
        assert_eq!(back, image);
    }

    #[test]
    fn test_deserialize_accepts_datetime() {
        let image: EmailImage = serde_json::from_value(json!({
            "unique_attachment_id": "a",
            "temporary_attachment_id": "b",
            "message_id": "c",
            "text": "",
            "display_date": "2024-03-09T00:00:00",
        }))
        .unwrap();
        assert_eq!(image.display_date, Some(date(2024, 3, 9)));
    }

    #[test]
    fn test_deserialize_rejects_missing_identity() {
        let result: Result<EmailImage, _> = serde_json::from_value(json!({
            "temporary_attachment_id": "b",
            "message_id": "c",
            "text": "",
            "display_date": null,
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_absent_date() {
        let image: EmailImage = serde_json::from_value(json!({
            "unique_attachment_id": "a",
            "temporary_attachment_id": "b",
            "message_id": "c",
            "text": "",
        }))
        .unwrap();
        assert!(image.display_date.is_none());
    }

    #[test]
    fn test_deserialize_rejects_bad_date() {
        let result: Result<EmailImage, _> = serde_json::from_value(json!({
            "unique_attachment_id": "a",
            "temporary_attachment_id": "b",
            "message_id": "c",
            "text": "",
            "display_date": "next tuesday",
        }));
        assert!(result.is_err());
    }
}
