use base64::Engine;
use serde::{Deserialize, Serialize};

/// MessageError は送信メッセージの検証エラーを表す。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MessageError {
    #[error("text message part is null or empty")]
    EmptyText,

    #[error("invalid attachment: {0}")]
    InvalidAttachment(String),
}

/// FileEncoding は添付ファイルデータのエンコーディングを表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileEncoding {
    Text,
    Base64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub file_name: String,
    pub file_encoding: FileEncoding,
    pub file_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_content_type: Option<String>,
}

/// MessageContent は 1 回の送信で全チャネルに配られるメッセージを表す。永続化しない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContent {
    #[serde(default)]
    pub title: String,
    pub text_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<Attachment>,
}

impl MessageContent {
    pub fn new(title: impl Into<String>, text_description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text_description: text_description.into(),
            html_description: None,
            attachment: None,
        }
    }

    pub fn validate(&self) -> Result<(), MessageError> {
        if self.text_description.trim().is_empty() {
            return Err(MessageError::EmptyText);
        }
        if let Some(attachment) = &self.attachment {
            if attachment.file_name.trim().is_empty() {
                return Err(MessageError::InvalidAttachment(
                    "file_name is null or empty".to_string(),
                ));
            }
            if attachment.file_encoding == FileEncoding::Base64 {
                base64::engine::general_purpose::STANDARD
                    .decode(attachment.file_data.as_bytes())
                    .map_err(|e| MessageError::InvalidAttachment(e.to_string()))?;
            }
        }
        Ok(())
    }

    /// タイトルと本文を空行で連結した文字列（チャット系チャネルの本文）。
    pub fn build_message_with_title(&self) -> String {
        format!("{}\n\n{}", self.title, self.text_description)
    }

    /// 送信サイズの見積もり（ヘッダー長を除く本文と添付の合計バイト数）。
    pub fn content_length(&self) -> usize {
        self.title.len()
            + self.text_description.len()
            + self.html_description.as_ref().map_or(0, String::len)
            + self.attachment.as_ref().map_or(0, |a| a.file_data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_rejected() {
        let msg = MessageContent::new("title", "  ");
        assert_eq!(msg.validate(), Err(MessageError::EmptyText));
        assert_eq!(
            MessageError::EmptyText.to_string(),
            "text message part is null or empty"
        );
    }

    #[test]
    fn test_valid_message() {
        let msg = MessageContent::new("title", "body");
        assert!(msg.validate().is_ok());
        assert_eq!(msg.build_message_with_title(), "title\n\nbody");
    }

    #[test]
    fn test_base64_attachment_checked() {
        let mut msg = MessageContent::new("t", "b");
        msg.attachment = Some(Attachment {
            file_name: "report.pdf".to_string(),
            file_encoding: FileEncoding::Base64,
            file_data: "not base64!!".to_string(),
            file_content_type: None,
        });
        assert!(matches!(msg.validate(), Err(MessageError::InvalidAttachment(_))));

        msg.attachment = Some(Attachment {
            file_name: "report.pdf".to_string(),
            file_encoding: FileEncoding::Base64,
            file_data: "aGVsbG8=".to_string(),
            file_content_type: Some("application/pdf".to_string()),
        });
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn test_content_length() {
        let mut msg = MessageContent::new("ab", "cde");
        msg.html_description = Some("<p>x</p>".to_string());
        assert_eq!(msg.content_length(), 2 + 3 + 8);
    }
}
