//! Wire types shared with the dashboard backend.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Pdf,
    Doc,
    Text,
    Url,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Pdf => "pdf",
            SourceType::Doc => "doc",
            SourceType::Text => "text",
            SourceType::Url => "url",
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pdf" => Ok(SourceType::Pdf),
            "doc" => Ok(SourceType::Doc),
            "text" => Ok(SourceType::Text),
            "url" => Ok(SourceType::Url),
            other => Err(format!("unknown source type `{other}`")),
        }
    }
}

/// A selectable reference attached to a notebook.
///
/// Only `selected` changes during normal use; the whole list is what gets
/// written back to the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Source {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub source_type: SourceType,
    pub selected: bool,
    #[serde(rename = "dateAdded", default)]
    pub date_added: String,
}

/// A resource returned by discovery search
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resource {
    pub id: String,
    pub title: String,
    pub subject: String,
    pub level: String,
    #[serde(rename = "type")]
    pub resource_type: SourceType,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: String,
}

/// Entry of the backend's document listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}
