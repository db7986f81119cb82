//! Provider message resources and their display-ready form.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::html::{self, AttachmentRef};

/// Body content type of a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyContentType {
    Html,
    #[default]
    Text,
}

impl BodyContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyContentType::Html => "html",
            BodyContentType::Text => "text",
        }
    }

    /// Unknown labels are treated as plain text.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("html") {
            BodyContentType::Html
        } else {
            BodyContentType::Text
        }
    }
}

impl fmt::Display for BodyContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for BodyContentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BodyContentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label
            .as_deref()
            .map(BodyContentType::from_label)
            .unwrap_or_default())
    }
}

/// Message importance flag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Importance {
    Low,
    #[default]
    Normal,
    High,
}

impl Importance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Importance::Low => "low",
            Importance::Normal => "normal",
            Importance::High => "high",
        }
    }

    /// Unknown labels are treated as normal importance.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "low" => Importance::Low,
            "high" => Importance::High,
            _ => Importance::Normal,
        }
    }
}

impl Serialize for Importance {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Importance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let label = Option::<String>::deserialize(deserializer)?;
        Ok(label
            .as_deref()
            .map(Importance::from_label)
            .unwrap_or_default())
    }
}

/// Name and address of a mailbox.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailAddress {
    pub name: Option<String>,
    pub address: Option<String>,
}

/// Sender or recipient entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Recipient {
    pub email_address: EmailAddress,
}

impl Recipient {
    pub fn address(&self) -> Option<&str> {
        self.email_address.address.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.email_address.name.as_deref()
    }
}

/// Message body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ItemBody {
    pub content_type: BodyContentType,
    pub content: Option<String>,
}

/// A message resource as returned by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Message {
    pub id: Option<String>,
    pub subject: Option<String>,
    pub from: Option<Recipient>,
    pub to_recipients: Vec<Recipient>,
    pub cc_recipients: Vec<Recipient>,
    pub bcc_recipients: Vec<Recipient>,
    pub body: Option<ItemBody>,
    pub body_preview: Option<String>,
    pub received_date_time: Option<String>,
    pub has_attachments: bool,
    pub is_read: bool,
    pub importance: Importance,
}

impl Message {
    /// Parse a single message resource.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        if !value.is_object() {
            return Err(Error::Message("expected a message object".into()));
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn sender_address(&self) -> &str {
        self.from
            .as_ref()
            .and_then(Recipient::address)
            .unwrap_or("Unknown")
    }

    /// Sender display name, falling back to the address.
    pub fn sender_name(&self) -> &str {
        self.from
            .as_ref()
            .and_then(Recipient::name)
            .unwrap_or_else(|| self.sender_address())
    }

    pub fn subject_or_default(&self) -> &str {
        self.subject.as_deref().unwrap_or("No subject")
    }
}

/// A page of messages (folder listing or search result).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageCollection {
    pub value: Vec<Message>,
    #[serde(
        rename = "@odata.nextLink",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub next_link: Option<String>,
}

impl MessageCollection {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        if !value.get("value").is_some_and(Value::is_array) {
            return Err(Error::Message(
                "expected a collection with a 'value' array".into(),
            ));
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// A mail folder.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MailFolder {
    pub id: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_item_count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread_item_count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderCollection {
    pub value: Vec<MailFolder>,
}

impl FolderCollection {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        if !value.get("value").is_some_and(Value::is_array) {
            return Err(Error::Message(
                "expected a folder collection with a 'value' array".into(),
            ));
        }
        Ok(serde_json::from_value(value)?)
    }
}

/// A message prepared for display: HTML bodies are flattened to text and
/// scanned for attachment links, text bodies pass through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailContent {
    pub id: Option<String>,
    pub subject: String,
    pub from: String,
    pub from_name: String,
    pub to_recipients: Vec<String>,
    pub cc_recipients: Vec<String>,
    pub bcc_recipients: Vec<String>,
    pub received_date: Option<String>,
    pub content_type: BodyContentType,
    pub readable_content: String,
    pub body_preview: String,
    pub has_attachments: bool,
    pub attachments_info: Vec<AttachmentRef>,
    pub importance: Importance,
}

impl EmailContent {
    pub fn from_message(message: &Message) -> Self {
        let (content_type, content) = message
            .body
            .as_ref()
            .map(|body| (body.content_type, body.content.as_deref().unwrap_or("")))
            .unwrap_or((BodyContentType::Text, ""));

        let (readable_content, attachments_info) = match content_type {
            BodyContentType::Html => (
                html::convert(content),
                html::extract_attachments_info(content),
            ),
            BodyContentType::Text => (content.to_string(), Vec::new()),
        };

        let sender = message.from.as_ref();
        Self {
            id: message.id.clone(),
            subject: message.subject_or_default().to_string(),
            from: message.sender_address().to_string(),
            from_name: sender
                .and_then(Recipient::name)
                .unwrap_or_default()
                .to_string(),
            to_recipients: addresses(&message.to_recipients),
            cc_recipients: addresses(&message.cc_recipients),
            bcc_recipients: addresses(&message.bcc_recipients),
            received_date: message.received_date_time.clone(),
            content_type,
            readable_content,
            body_preview: message.body_preview.clone().unwrap_or_default(),
            has_attachments: message.has_attachments,
            attachments_info,
            importance: message.importance,
        }
    }
}

fn addresses(recipients: &[Recipient]) -> Vec<String> {
    recipients
        .iter()
        .map(|r| r.address().unwrap_or_default().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HTML_MESSAGE: &str = r#"{
        "id": "AAMk1",
        "subject": "Report",
        "from": {"emailAddress": {"name": "Alice", "address": "alice@example.com"}},
        "toRecipients": [{"emailAddress": {"address": "bob@example.com"}}],
        "ccRecipients": [],
        "body": {"contentType": "HTML", "content": "<p>See <a href=\"r.pdf\">attachment</a></p>"},
        "bodyPreview": "See attachment",
        "receivedDateTime": "2024-03-01T09:30:00Z",
        "hasAttachments": true,
        "importance": "high"
    }"#;

    #[test]
    fn test_parse_message() {
        let message = Message::from_json_str(HTML_MESSAGE).unwrap();
        assert_eq!(message.id.as_deref(), Some("AAMk1"));
        assert_eq!(message.sender_name(), "Alice");
        assert_eq!(message.importance, Importance::High);
        assert_eq!(
            message.body.as_ref().unwrap().content_type,
            BodyContentType::Html
        );
        assert!(!message.is_read);
    }

    #[test]
    fn test_html_body_is_converted() {
        let message = Message::from_json_str(HTML_MESSAGE).unwrap();
        let content = EmailContent::from_message(&message);
        assert_eq!(content.readable_content, "See attachment [r.pdf]");
        assert_eq!(content.attachments_info.len(), 1);
        assert_eq!(content.attachments_info[0].url, "r.pdf");
        assert_eq!(content.to_recipients, vec!["bob@example.com"]);
        assert!(content.cc_recipients.is_empty());
    }

    #[test]
    fn test_text_body_passes_through() {
        let json = r#"{"body": {"contentType": "text", "content": "<p>literal</p>  spaced"}}"#;
        let content = EmailContent::from_message(&Message::from_json_str(json).unwrap());
        assert_eq!(content.readable_content, "<p>literal</p>  spaced");
        assert!(content.attachments_info.is_empty());
        assert_eq!(content.subject, "No subject");
        assert_eq!(content.from, "Unknown");
        assert_eq!(content.from_name, "");
        assert_eq!(content.importance, Importance::Normal);
    }

    #[test]
    fn test_null_and_unknown_labels() {
        let json = r#"{"subject": null, "importance": "urgent", "body": {"contentType": null}}"#;
        let message = Message::from_json_str(json).unwrap();
        assert_eq!(message.subject_or_default(), "No subject");
        assert_eq!(message.importance, Importance::Normal);
        assert_eq!(
            message.body.unwrap().content_type,
            BodyContentType::Text
        );
    }

    #[test]
    fn test_sender_name_falls_back_to_address() {
        let json = r#"{"from": {"emailAddress": {"address": "x@example.com"}}}"#;
        let message = Message::from_json_str(json).unwrap();
        assert_eq!(message.sender_name(), "x@example.com");
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(matches!(
            Message::from_json_str("[1, 2]"),
            Err(Error::Message(_))
        ));
        assert!(matches!(
            Message::from_json_str("{"),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_message_collection() {
        let json = r#"{"value": [{"id": "1", "isRead": true}, {"id": "2"}], "@odata.nextLink": "https://next"}"#;
        let page = MessageCollection::from_json_str(json).unwrap();
        assert_eq!(page.value.len(), 2);
        assert!(page.value[0].is_read);
        assert_eq!(page.next_link.as_deref(), Some("https://next"));
        assert!(MessageCollection::from_json_str(r#"{"id": "1"}"#).is_err());
    }

    #[test]
    fn test_folder_collection() {
        let json = r#"{"value": [{"id": "AQ1", "displayName": "Inbox", "unreadItemCount": 3}]}"#;
        let folders = FolderCollection::from_json_str(json).unwrap();
        assert_eq!(folders.value[0].display_name, "Inbox");
        assert_eq!(folders.value[0].unread_item_count, Some(3));
    }

    #[test]
    fn test_content_serializes_labels() {
        let message = Message::from_json_str(HTML_MESSAGE).unwrap();
        let json = serde_json::to_value(EmailContent::from_message(&message)).unwrap();
        assert_eq!(json["content_type"], "html");
        assert_eq!(json["importance"], "high");
        assert_eq!(json["attachments_info"][0]["name"], "attachment");
    }
}
