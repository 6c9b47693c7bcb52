//! API request and response types

use crate::export::ExportDocument;
use crate::runtime::Outgoing;
use crate::state_machine::ReplyMarkup;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// One inbound user message
#[derive(Debug, Deserialize)]
pub struct InboundMessageRequest {
    pub user_id: i64,
    pub text: String,
}

/// Replies to deliver, in order
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub replies: Vec<ReplyPayload>,
}

/// A single reply: text with optional buttons, or a document
#[derive(Debug, Default, Serialize)]
pub struct ReplyPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Suggested reply labels, one inner list per row
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<Vec<String>>>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub remove_keyboard: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<DocumentPayload>,
}

/// Attached file, base64 encoded
#[derive(Debug, Serialize)]
pub struct DocumentPayload {
    pub filename: String,
    pub media_type: String,
    pub data: String,
}

impl From<Outgoing> for ReplyPayload {
    fn from(outgoing: Outgoing) -> Self {
        match outgoing {
            Outgoing::Text { text, markup } => {
                let mut payload = ReplyPayload {
                    text: Some(text),
                    ..Default::default()
                };
                match markup {
                    ReplyMarkup::Keep => {}
                    ReplyMarkup::Buttons(rows) => payload.buttons = Some(rows),
                    ReplyMarkup::Remove => payload.remove_keyboard = true,
                }
                payload
            }
            Outgoing::Document(document) => ReplyPayload {
                document: Some(document.into()),
                ..Default::default()
            },
        }
    }
}

impl From<ExportDocument> for DocumentPayload {
    fn from(document: ExportDocument) -> Self {
        Self {
            filename: document.filename,
            media_type: document.media_type,
            data: BASE64.encode(&document.bytes),
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
