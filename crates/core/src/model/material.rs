use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::MaterialId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MaterialError {
    #[error("material title cannot be empty")]
    EmptyTitle,

    #[error("unknown material kind: {0}")]
    UnknownKind(String),
}

/// Whether a material is studied from or only used as an exam reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialKind {
    Study,
    Exam,
}

impl MaterialKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MaterialKind::Study => "study",
            MaterialKind::Exam => "exam",
        }
    }
}

impl fmt::Display for MaterialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaterialKind {
    type Err = MaterialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "study" => Ok(MaterialKind::Study),
            "exam" => Ok(MaterialKind::Exam),
            _ => Err(MaterialError::UnknownKind(s.to_string())),
        }
    }
}

/// A document whose extracted text has been stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Material {
    id: MaterialId,
    title: String,
    kind: MaterialKind,
    page_count: Option<u32>,
    text: String,
}

impl Material {
    /// # Errors
    ///
    /// Returns `MaterialError::EmptyTitle` if the title is blank.
    pub fn new(
        id: MaterialId,
        title: impl Into<String>,
        kind: MaterialKind,
        page_count: Option<u32>,
        text: impl Into<String>,
    ) -> Result<Self, MaterialError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(MaterialError::EmptyTitle);
        }
        Ok(Self {
            id,
            title,
            kind,
            page_count,
            text: text.into(),
        })
    }

    #[must_use]
    pub fn id(&self) -> MaterialId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn kind(&self) -> MaterialKind {
        self.kind
    }

    #[must_use]
    pub fn page_count(&self) -> Option<u32> {
        self.page_count
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn to_reference(&self) -> ReferenceMaterial {
        ReferenceMaterial {
            title: self.title.clone(),
            page_count: self.page_count,
            text: self.text.clone(),
        }
    }
}

/// Exam material shown to the model as a style reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceMaterial {
    pub title: String,
    pub page_count: Option<u32>,
    pub text: String,
}

impl ReferenceMaterial {
    /// The first `max_chars` characters of the text, and whether more followed.
    #[must_use]
    pub fn preview(&self, max_chars: usize) -> (&str, bool) {
        truncate_chars(&self.text, max_chars)
    }
}

/// Cut `text` to at most `max_chars` characters on a char boundary.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&text[..byte_idx], true),
        None => (text, false),
    }
}
