//! The parts of a Telegram message the ingestion pipeline reads.

use teloxide::types::Message;

/// A channel post reduced to what ingestion needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestMessage {
    pub chat_id: i64,
    pub chat_title: Option<String>,
    pub message_id: i64,
    pub text: Option<String>,
    pub caption: Option<String>,
    /// Largest photo size, when the post carries a photo.
    pub photo_file_id: Option<String>,
    /// Unix seconds.
    pub date: i64,
}

impl IngestMessage {
    /// Creates a plain text message.
    pub fn text(chat_id: i64, message_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            message_id,
            text: Some(text.into()),
            date: chrono::Utc::now().timestamp(),
            ..Self::default()
        }
    }

    /// Extracts the ingestion fields from a teloxide message.
    pub fn from_message(msg: &Message) -> Self {
        Self {
            chat_id: msg.chat.id.0,
            chat_title: msg.chat.title().map(str::to_string),
            message_id: i64::from(msg.id.0),
            text: msg.text().map(str::to_string),
            caption: msg.caption().map(str::to_string),
            photo_file_id: msg
                .photo()
                .and_then(|sizes| sizes.last())
                .map(|photo| photo.file.id.to_string()),
            date: msg.date.timestamp(),
        }
    }

    /// Returns true if the post carries a photo.
    pub fn has_photo(&self) -> bool {
        self.photo_file_id.is_some()
    }

    /// Returns the text to parse: caption and text joined for photo posts,
    /// otherwise whichever is present.
    pub fn body(&self) -> String {
        let text = self.text.as_deref().map(str::trim).filter(|t| !t.is_empty());
        let caption = self.caption.as_deref().map(str::trim).filter(|c| !c.is_empty());

        match (caption, text) {
            (Some(caption), Some(text)) if self.has_photo() => format!("{}\n{}", caption, text),
            (_, Some(text)) => text.to_string(),
            (Some(caption), None) => caption.to_string(),
            (None, None) => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_prefers_text() {
        let msg = IngestMessage::text(-100, 1, "  Boat Airdopes https://amzn.to/x  ");
        assert_eq!(msg.body(), "Boat Airdopes https://amzn.to/x");
        assert!(!msg.has_photo());
    }

    #[test]
    fn test_body_joins_caption_for_photos() {
        let msg = IngestMessage {
            caption: Some("Noise Smartwatch".to_string()),
            text: Some("https://fkrt.it/abc".to_string()),
            photo_file_id: Some("AgAD".to_string()),
            ..IngestMessage::default()
        };
        assert_eq!(msg.body(), "Noise Smartwatch\nhttps://fkrt.it/abc");
    }

    #[test]
    fn test_body_caption_only() {
        let msg = IngestMessage {
            caption: Some("Deal https://amzn.to/y".to_string()),
            photo_file_id: Some("AgAD".to_string()),
            ..IngestMessage::default()
        };
        assert_eq!(msg.body(), "Deal https://amzn.to/y");
        assert_eq!(IngestMessage::default().body(), "");
    }
}
