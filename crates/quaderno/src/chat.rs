//! Assistant replies, which come back as JSON, plain text, images or audio
//! depending on the response content type.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
pub enum ChatReply {
    Json(Value),
    Text(String),
    Image { content_type: String, bytes: Vec<u8> },
    Audio { content_type: String, bytes: Vec<u8> },
}

/// How a response body should be read, from its `Content-Type`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Json,
    Text,
    Image,
    Audio,
}

impl ReplyKind {
    pub fn from_content_type(content_type: &str) -> Self {
        let mime = media_type(content_type);
        if mime == "application/json" || mime.ends_with("+json") {
            ReplyKind::Json
        } else if mime.starts_with("image/") {
            ReplyKind::Image
        } else if mime.starts_with("audio/") {
            ReplyKind::Audio
        } else {
            ReplyKind::Text
        }
    }
}

/// `image/png; charset=binary` -> `image/png`
fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

impl ChatReply {
    /// Build a reply from a raw body and its declared content type
    pub fn from_body(content_type: &str, bytes: Vec<u8>) -> Result<Self, serde_json::Error> {
        let reply = match ReplyKind::from_content_type(content_type) {
            ReplyKind::Json => ChatReply::Json(serde_json::from_slice(&bytes)?),
            ReplyKind::Image => ChatReply::Image {
                content_type: media_type(content_type),
                bytes,
            },
            ReplyKind::Audio => ChatReply::Audio {
                content_type: media_type(content_type),
                bytes,
            },
            ReplyKind::Text => ChatReply::Text(String::from_utf8_lossy(&bytes).into_owned()),
        };
        Ok(reply)
    }

    /// Text to show inline, if the reply has any.
    ///
    /// JSON replies are searched for a `reply`, `response` or `message`
    /// string; other JSON is shown as-is.
    pub fn text(&self) -> Option<String> {
        match self {
            ChatReply::Text(text) => Some(text.clone()),
            ChatReply::Json(value) => Some(
                ["reply", "response", "message"]
                    .iter()
                    .find_map(|key| value.get(key).and_then(Value::as_str))
                    .map(str::to_string)
                    .unwrap_or_else(|| value.to_string()),
            ),
            ChatReply::Image { .. } | ChatReply::Audio { .. } => None,
        }
    }

    /// Write a binary reply to `dir`, returning the file path.
    ///
    /// Text and JSON replies are not written.
    pub fn save_blob(&self, dir: &Path, stem: &str) -> Result<Option<PathBuf>> {
        let (content_type, bytes) = match self {
            ChatReply::Image {
                content_type,
                bytes,
            }
            | ChatReply::Audio {
                content_type,
                bytes,
            } => (content_type, bytes),
            ChatReply::Json(_) | ChatReply::Text(_) => return Ok(None),
        };

        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = dir.join(format!("{stem}.{}", extension(content_type)));
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(Some(path))
    }
}

fn extension(content_type: &str) -> &str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/svg+xml" => "svg",
        "audio/mpeg" => "mp3",
        other => other
            .split_once('/')
            .map(|(_, sub)| sub)
            .filter(|sub| !sub.is_empty() && sub.chars().all(|c| c.is_ascii_alphanumeric()))
            .unwrap_or("bin"),
    }
}
