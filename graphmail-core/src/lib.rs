//! graphmail-core: Core library for graphmail - HTML flattening, message
//! model, rendering, and configuration.
//!
//! This crate provides the foundation for the graphmail client, including:
//! - Structural HTML-to-text conversion of message bodies
//! - Attachment link detection
//! - Typed provider message, listing and folder resources
//! - Console renderers for messages, listings and folders
//! - Configuration and path discovery

pub mod config;
pub mod display;
pub mod error;
pub mod html;
pub mod message;
pub mod paths;

pub use config::{AppConfig, DisplayConfig, MailConfig};
pub use display::Renderer;
pub use error::{Error, Result};
pub use html::{AttachmentRef, HtmlConverter};
pub use message::{EmailContent, FolderCollection, Message, MessageCollection};
pub use paths::AppPaths;

/// Convert HTML content to readable plain text.
///
/// Headings, lists, tables, links and paragraphs keep their visual
/// structure; see [`html::convert`].
pub fn html_to_text(html: &str) -> String {
    html::convert(html)
}
