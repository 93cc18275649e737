use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const MAX_OBJECTIVES: usize = 20;
pub const MAX_PITFALLS: usize = 20;
/// Entries longer than this many characters are truncated.
pub const MAX_ENTRY_CHARS: usize = 500;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExamConfigError {
    #[error("too many learning objectives: {count} (max {MAX_OBJECTIVES})")]
    TooManyObjectives { count: usize },

    #[error("too many common pitfalls: {count} (max {MAX_PITFALLS})")]
    TooManyPitfalls { count: usize },

    #[error("time constraint must be a positive number of minutes")]
    InvalidTimeConstraint,

    #[error("unknown exam type: {0}")]
    UnknownExamType(String),

    #[error("unknown difficulty level: {0}")]
    UnknownDifficulty(String),
}

//
// ─── ENUMS ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExamType {
    MultipleChoice,
    Essay,
    ShortAnswer,
    Practical,
    #[default]
    Mixed,
}

impl ExamType {
    pub const ALL: [ExamType; 5] = [
        ExamType::MultipleChoice,
        ExamType::Essay,
        ExamType::ShortAnswer,
        ExamType::Practical,
        ExamType::Mixed,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExamType::MultipleChoice => "multiple-choice",
            ExamType::Essay => "essay",
            ExamType::ShortAnswer => "short-answer",
            ExamType::Practical => "practical",
            ExamType::Mixed => "mixed",
        }
    }
}

impl fmt::Display for ExamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExamType {
    type Err = ExamConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        ExamType::ALL
            .into_iter()
            .find(|kind| kind.as_str() == needle)
            .ok_or_else(|| ExamConfigError::UnknownExamType(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 3] = [
        DifficultyLevel::Beginner,
        DifficultyLevel::Intermediate,
        DifficultyLevel::Advanced,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DifficultyLevel::Beginner => "beginner",
            DifficultyLevel::Intermediate => "intermediate",
            DifficultyLevel::Advanced => "advanced",
        }
    }
}

impl fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DifficultyLevel {
    type Err = ExamConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        DifficultyLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == needle)
            .ok_or_else(|| ExamConfigError::UnknownDifficulty(s.to_string()))
    }
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Validated exam preparation settings.
///
/// Saving a config replaces the previous one wholesale; there is no merge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ExamConfigDraft")]
pub struct ExamConfig {
    exam_type: ExamType,
    learning_objectives: Vec<String>,
    difficulty_level: DifficultyLevel,
    common_pitfalls: Vec<String>,
    time_constraints: Option<u32>,
    special_instructions: String,
}

/// Unvalidated form input for an [`ExamConfig`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExamConfigDraft {
    pub exam_type: ExamType,
    pub learning_objectives: Vec<String>,
    pub difficulty_level: DifficultyLevel,
    pub common_pitfalls: Vec<String>,
    pub time_constraints: Option<u32>,
    pub special_instructions: String,
}

impl ExamConfigDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize and validate the draft.
    ///
    /// Entries are trimmed, blank ones dropped and long ones cut to
    /// [`MAX_ENTRY_CHARS`] characters.
    ///
    /// # Errors
    ///
    /// Returns `ExamConfigError` if a list holds more than 20 entries or the
    /// time constraint is zero.
    pub fn validate(self) -> Result<ExamConfig, ExamConfigError> {
        let learning_objectives = normalize_entries(self.learning_objectives);
        if learning_objectives.len() > MAX_OBJECTIVES {
            return Err(ExamConfigError::TooManyObjectives {
                count: learning_objectives.len(),
            });
        }

        let common_pitfalls = normalize_entries(self.common_pitfalls);
        if common_pitfalls.len() > MAX_PITFALLS {
            return Err(ExamConfigError::TooManyPitfalls {
                count: common_pitfalls.len(),
            });
        }

        if self.time_constraints == Some(0) {
            return Err(ExamConfigError::InvalidTimeConstraint);
        }

        Ok(ExamConfig {
            exam_type: self.exam_type,
            learning_objectives,
            difficulty_level: self.difficulty_level,
            common_pitfalls,
            time_constraints: self.time_constraints,
            special_instructions: self.special_instructions.trim().to_string(),
        })
    }
}

impl TryFrom<ExamConfigDraft> for ExamConfig {
    type Error = ExamConfigError;

    fn try_from(draft: ExamConfigDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl ExamConfig {
    #[must_use]
    pub fn exam_type(&self) -> ExamType {
        self.exam_type
    }

    #[must_use]
    pub fn learning_objectives(&self) -> &[String] {
        &self.learning_objectives
    }

    #[must_use]
    pub fn difficulty_level(&self) -> DifficultyLevel {
        self.difficulty_level
    }

    #[must_use]
    pub fn common_pitfalls(&self) -> &[String] {
        &self.common_pitfalls
    }

    /// Time limit in minutes, if any.
    #[must_use]
    pub fn time_constraints(&self) -> Option<u32> {
        self.time_constraints
    }

    #[must_use]
    pub fn special_instructions(&self) -> &str {
        &self.special_instructions
    }

    /// A draft pre-filled with this config, for editing.
    #[must_use]
    pub fn to_draft(&self) -> ExamConfigDraft {
        ExamConfigDraft {
            exam_type: self.exam_type,
            learning_objectives: self.learning_objectives.clone(),
            difficulty_level: self.difficulty_level,
            common_pitfalls: self.common_pitfalls.clone(),
            time_constraints: self.time_constraints,
            special_instructions: self.special_instructions.clone(),
        }
    }
}

fn normalize_entries(entries: Vec<String>) -> Vec<String> {
    entries
        .into_iter()
        .map(|entry| entry.trim().chars().take(MAX_ENTRY_CHARS).collect::<String>())
        .filter(|entry| !entry.is_empty())
        .collect()
}
