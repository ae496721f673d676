use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::BookError;

pub const MIN_CHAPTERS: u8 = 1;
pub const MAX_CHAPTERS: u8 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Genre {
    #[default]
    Fiction,
    NonFiction,
    Mystery,
    Romance,
    SciFi,
    Fantasy,
}

impl Genre {
    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Fiction => "fiction",
            Genre::NonFiction => "non-fiction",
            Genre::Mystery => "mystery",
            Genre::Romance => "romance",
            Genre::SciFi => "sci-fi",
            Genre::Fantasy => "fantasy",
        }
    }
}

impl FromStr for Genre {
    type Err = BookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fiction" => Ok(Genre::Fiction),
            "non-fiction" => Ok(Genre::NonFiction),
            "mystery" => Ok(Genre::Mystery),
            "romance" => Ok(Genre::Romance),
            "sci-fi" => Ok(Genre::SciFi),
            "fantasy" => Ok(Genre::Fantasy),
            other => Err(BookError::InvalidField {
                field: "genre".into(),
                message: format!("unknown genre '{}'", other),
            }),
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Paragraphs-per-chapter target the backend writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl BookLength {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookLength::Short => "short",
            BookLength::Medium => "medium",
            BookLength::Long => "long",
        }
    }
}

impl FromStr for BookLength {
    type Err = BookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "short" => Ok(BookLength::Short),
            "medium" => Ok(BookLength::Medium),
            "long" => Ok(BookLength::Long),
            other => Err(BookError::InvalidField {
                field: "length".into(),
                message: format!("unknown length '{}'", other),
            }),
        }
    }
}

impl fmt::Display for BookLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters of the book to generate, sent as the body of the create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookConfig {
    pub title: String,
    pub author: String,
    pub genre: Genre,
    pub chapters: u8,
    pub length: BookLength,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            title: String::new(),
            author: String::new(),
            genre: Genre::default(),
            chapters: 5,
            length: BookLength::default(),
        }
    }
}

impl BookConfig {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn with_genre(mut self, genre: Genre) -> Self {
        self.genre = genre;
        self
    }

    pub fn with_chapters(mut self, chapters: u8) -> Self {
        self.chapters = chapters;
        self
    }

    pub fn with_length(mut self, length: BookLength) -> Self {
        self.length = length;
        self
    }

    /// Update one field from its form name and raw text value.
    ///
    /// The config is left untouched when the value does not parse.
    pub fn set_field(&mut self, name: &str, value: &str) -> Result<(), BookError> {
        match name {
            "title" => self.title = value.to_string(),
            "author" => self.author = value.to_string(),
            "genre" => self.genre = value.parse()?,
            "length" => self.length = value.parse()?,
            "chapters" => self.chapters = parse_chapters(value)?,
            other => {
                return Err(BookError::InvalidField {
                    field: other.to_string(),
                    message: "unknown field".into(),
                });
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), BookError> {
        if self.title.is_empty() {
            return Err(BookError::Validation("Book title is required".into()));
        }
        if !(MIN_CHAPTERS..=MAX_CHAPTERS).contains(&self.chapters) {
            return Err(BookError::Validation(format!(
                "Chapters must be between {} and {}",
                MIN_CHAPTERS, MAX_CHAPTERS
            )));
        }
        Ok(())
    }
}

fn parse_chapters(value: &str) -> Result<u8, BookError> {
    let chapters: u8 = value.trim().parse().map_err(|_| BookError::InvalidField {
        field: "chapters".into(),
        message: format!("'{}' is not a whole number", value),
    })?;
    if !(MIN_CHAPTERS..=MAX_CHAPTERS).contains(&chapters) {
        return Err(BookError::InvalidField {
            field: "chapters".into(),
            message: format!("must be between {} and {}", MIN_CHAPTERS, MAX_CHAPTERS),
        });
    }
    Ok(chapters)
}

/// Job status as reported by the backend. Anything that is not terminal
/// (`queued`, `processing`, ...) counts as pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Pending,
    Completed,
    Error,
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "completed" => JobStatus::Completed,
            "error" => JobStatus::Error,
            _ => JobStatus::Pending,
        }
    }
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub job_id: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub progress: u32,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: JobStatus,
}

/// A finished job ready to be fetched from the download endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub job_id: String,
    pub url: String,
    pub filename: String,
}
