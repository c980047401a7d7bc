use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Column a lesson card sits in on the board
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum LessonStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
}

impl LessonStatus {
    /// All statuses in column order
    pub const ALL: [LessonStatus; 3] = [
        LessonStatus::Scheduled,
        LessonStatus::InProgress,
        LessonStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LessonStatus::Scheduled => "scheduled",
            LessonStatus::InProgress => "in-progress",
            LessonStatus::Completed => "completed",
        }
    }

    /// Human readable column title
    pub fn label(&self) -> &'static str {
        match self {
            LessonStatus::Scheduled => "Scheduled",
            LessonStatus::InProgress => "In Progress",
            LessonStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LessonStatus {
    type Err = IngestError;

    /// Accepts the spellings found across the different lesson feeds
    /// (`in-progress`, `in_progress`, `inProgress`), case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_' && !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "scheduled" => Ok(LessonStatus::Scheduled),
            "inprogress" => Ok(LessonStatus::InProgress),
            "completed" => Ok(LessonStatus::Completed),
            _ => Err(IngestError::UnknownStatus(s.to_string())),
        }
    }
}

/// A single schedulable teaching unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lesson {
    pub id: u64,

    pub title: String,

    /// Scheduled date in YYYY-MM-DD format
    pub date: String,

    /// Start time in HH:MM format, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,

    /// Free-form duration label (e.g. "45 min")
    #[serde(default)]
    pub duration: String,

    pub status: LessonStatus,
}

/// Errors raised while converting raw lesson records into [`Lesson`]s
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("lesson record has no id")]
    MissingId,

    #[error("lesson id `{0}` is not a non-negative integer")]
    InvalidId(String),

    #[error("malformed lesson record: {0}")]
    Malformed(String),

    #[error("lesson {0} has no title")]
    MissingTitle(u64),

    #[error("unknown lesson status `{0}`")]
    UnknownStatus(String),
}

/// Lesson identifiers show up both as JSON numbers and as numeric strings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RawId {
    Number(u64),
    Text(String),
}

impl RawId {
    fn parse(&self) -> Result<u64, IngestError> {
        match self {
            RawId::Number(n) => Ok(*n),
            RawId::Text(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| IngestError::InvalidId(s.clone())),
        }
    }
}

/// Lesson record as it appears in fixture and API payloads, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawLesson {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RawId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(
        default,
        alias = "scheduledDate",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<String>,

    #[serde(
        default,
        alias = "scheduledTime",
        skip_serializing_if = "Option::is_none"
    )]
    pub time: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl RawLesson {
    /// Decode one record. A field of the wrong JSON type rejects only this record.
    pub fn from_value(value: &serde_json::Value) -> Result<Self, IngestError> {
        Self::deserialize(value).map_err(|e| IngestError::Malformed(e.to_string()))
    }
}

impl TryFrom<&RawLesson> for Lesson {
    type Error = IngestError;

    fn try_from(raw: &RawLesson) -> Result<Self, Self::Error> {
        let id = raw.id.as_ref().ok_or(IngestError::MissingId)?.parse()?;

        let title = raw
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(IngestError::MissingTitle(id))?
            .to_string();

        let status = match raw.status.as_deref() {
            Some(s) => s.parse()?,
            None => LessonStatus::default(),
        };

        Ok(Lesson {
            id,
            title,
            date: raw.date.clone().unwrap_or_default(),
            time: raw.time.clone(),
            duration: raw.duration.clone().unwrap_or_default(),
            status,
        })
    }
}

/// A class roster entry, with the lessons planned for that class
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassGroup {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub students: u32,
    /// Raw records, validated one by one when the board is built
    #[serde(default)]
    pub lessons: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Student {
    pub id: String,
    pub name: String,
    #[serde(rename = "classId")]
    pub class_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LessonPlan {
    pub id: String,
    pub title: String,
    #[serde(rename = "classId")]
    pub class_id: String,
    #[serde(default)]
    pub objectives: Vec<String>,
}

/// Kind of a notebook source or discoverable resource
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Pdf,
    Doc,
    Text,
    Url,
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

/// A selectable reference document attached to a notebook
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

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notebook {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Initial source list; served through the sources endpoints only
    #[serde(default, skip_serializing)]
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum DocumentType {
    Pdf,
    Docx,
    Txt,
}

/// Entry of the static document listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
}

/// An external resource that discovery can surface and import
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resource {
    pub id: String,
    pub title: String,
    pub subject: String,
    pub level: String,
    #[serde(rename = "type")]
    pub resource_type: SourceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub description: String,
}
