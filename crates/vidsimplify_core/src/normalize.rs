use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::{CategoryKind, InputKind, SubmissionPayload};

/// Raw user input before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInput {
    /// Typed text or a URL. For [`InputKind::PdfDocument`] this is an already
    /// encoded document, optionally framed as a data URL.
    Text(String),
    /// Document bytes as read from disk.
    Document(Vec<u8>),
}

/// Turns raw input into the payload accepted by the job service.
///
/// Pure: emptiness is not checked here, see [`SubmissionPayload::is_submittable`].
pub fn normalize(kind: InputKind, raw: RawInput, category: CategoryKind) -> SubmissionPayload {
    let content = match raw {
        RawInput::Text(text) if kind == InputKind::PdfDocument => {
            strip_data_url_prefix(&text).to_string()
        }
        RawInput::Text(text) => text,
        RawInput::Document(bytes) => encode_document(&bytes),
    };
    SubmissionPayload {
        kind,
        content,
        category,
    }
}

/// Standard base64 of the document body.
pub fn encode_document(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn decode_document(content: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(strip_data_url_prefix(content))
}

/// Drops a `data:<mime>;base64,` style prefix, keeping only the encoded body.
/// Input without such a prefix is returned unchanged.
pub fn strip_data_url_prefix(content: &str) -> &str {
    if !content.starts_with("data:") {
        return content;
    }
    match content.split_once(',') {
        Some((_, body)) => body,
        None => content,
    }
}
