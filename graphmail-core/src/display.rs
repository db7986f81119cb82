//! Console rendering of messages, listings and folders.

use std::fmt::Write as _;

use chrono::DateTime;
use chrono_tz::Tz;

use crate::config::DisplayConfig;
use crate::message::{EmailContent, Importance, MailFolder, Message};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders display-ready text; callers print the result verbatim.
#[derive(Debug, Clone)]
pub struct Renderer {
    config: DisplayConfig,
    tz: Option<Tz>,
}

impl Renderer {
    pub fn new(config: DisplayConfig, tz: Option<Tz>) -> Self {
        Self { config, tz }
    }

    fn marker(&self, emoji: &str, text: &str) -> String {
        if self.config.emoji {
            format!("{emoji} {text}")
        } else {
            text.to_string()
        }
    }

    fn importance_marker(&self, importance: Importance) -> &'static str {
        match (self.config.emoji, importance) {
            (true, Importance::High) => "🔴",
            (true, Importance::Low) => "🟡",
            (true, Importance::Normal) => "🔵",
            (false, Importance::High) => "[high]",
            (false, Importance::Low) => "[low]",
            (false, Importance::Normal) => "[normal]",
        }
    }

    fn status_markers(&self, message: &Message) -> String {
        let (read, unread, attached) = if self.config.emoji {
            ("📖", "📨", "📎")
        } else {
            (" ", "*", "@")
        };
        let mut out = String::from(if message.is_read { read } else { unread });
        if message.has_attachments {
            out.push_str(attached);
        }
        out
    }

    /// Full view of one message.
    pub fn render_email(&self, email: &EmailContent) -> String {
        let heavy = "=".repeat(self.config.rule_width);
        let light = "-".repeat(self.config.rule_width);
        let mut out = String::new();

        let _ = writeln!(out, "{heavy}");
        let _ = writeln!(
            out,
            "{} SUBJECT: {}",
            self.importance_marker(email.importance),
            email.subject
        );
        let _ = writeln!(out, "{heavy}");

        let from = format!("FROM: {} <{}>", email.from_name, email.from);
        let _ = writeln!(out, "{}", self.marker("📧", &from));
        let to = format!("TO: {}", email.to_recipients.join(", "));
        let _ = writeln!(out, "{}", self.marker("📨", &to));
        if !email.cc_recipients.is_empty() {
            let cc = format!("CC: {}", email.cc_recipients.join(", "));
            let _ = writeln!(out, "{}", self.marker("📋", &cc));
        }
        if !email.bcc_recipients.is_empty() {
            let bcc = format!("BCC: {} recipients", email.bcc_recipients.len());
            let _ = writeln!(out, "{}", self.marker("📋", &bcc));
        }

        let date = email
            .received_date
            .as_deref()
            .map(|raw| format_received(raw, self.tz))
            .unwrap_or_else(|| "Unknown".to_string());
        let _ = writeln!(out, "{}", self.marker("📅", &format!("DATE: {date}")));

        let has = match (self.config.emoji, email.has_attachments) {
            (true, true) => "✅ Yes",
            (true, false) => "❌ No",
            (false, true) => "Yes",
            (false, false) => "No",
        };
        let _ = writeln!(out, "{}", self.marker("📎", &format!("ATTACHMENTS: {has}")));

        if !email.attachments_info.is_empty() {
            let mentioned = format!("MENTIONED ATTACHMENTS: {}", email.attachments_info.len());
            let _ = writeln!(out, "{}", self.marker("📋", &mentioned));
            for attachment in &email.attachments_info {
                let _ = writeln!(out, "   - {}", attachment.name);
            }
        }
        let _ = writeln!(out, "{light}");

        if self.config.show_preview && !email.body_preview.is_empty() {
            let preview = format!("PREVIEW: {}", email.body_preview);
            let _ = writeln!(out, "{}", self.marker("📝", &preview));
            let _ = writeln!(out, "{light}");
        }

        let _ = writeln!(out, "{}", self.marker("📄", "CONTENT:"));
        let _ = writeln!(out, "{light}");
        let _ = writeln!(out, "{}", email.readable_content);
        out.push_str(&heavy);
        out
    }

    /// Folder listing: one header line, two lines per message.
    pub fn render_message_list(&self, messages: &[Message], folder: &str) -> String {
        let header = format!("Found {} emails in {folder}:", messages.len());
        let mut out = self.marker("📥", &header);
        for (index, message) in messages.iter().enumerate() {
            let date = message
                .received_date_time
                .as_deref()
                .map(|raw| format_received(raw, self.tz))
                .unwrap_or_default();
            let _ = write!(
                out,
                "\n{:2}. {} {}\n     From: {} | Date: {} | ID: {}",
                index + 1,
                self.status_markers(message),
                message.subject_or_default(),
                message.sender_name(),
                date,
                message.id.as_deref().unwrap_or_default()
            );
        }
        out
    }

    /// Search results: like a listing, but shows the sender address only.
    pub fn render_search_results(&self, messages: &[Message], query: &str) -> String {
        let header = format!("Found {} emails for query '{query}':", messages.len());
        let mut out = self.marker("🔍", &header);
        for (index, message) in messages.iter().enumerate() {
            let _ = write!(
                out,
                "\n{:2}. {} {}\n     From: {} | ID: {}",
                index + 1,
                self.status_markers(message),
                message.subject_or_default(),
                message.sender_address(),
                message.id.as_deref().unwrap_or_default()
            );
        }
        out
    }

    pub fn render_folders(&self, folders: &[MailFolder]) -> String {
        let mut out = self.marker("📁", "Available folders:");
        for folder in folders {
            let _ = write!(out, "\n  - {} (ID: {})", folder.display_name, folder.id);
        }
        out
    }
}

/// Render a provider timestamp as `YYYY-MM-DD HH:MM:SS`, in `tz` when set.
///
/// Values that are not RFC 3339 keep their first 19 characters with the
/// `T` separator replaced by a space.
pub fn format_received(raw: &str, tz: Option<Tz>) -> String {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => match tz {
            Some(tz) => dt.with_timezone(&tz).format(DATE_FORMAT).to_string(),
            None => dt.format(DATE_FORMAT).to_string(),
        },
        Err(_) => raw.chars().take(19).collect::<String>().replace('T', " "),
    }
}
