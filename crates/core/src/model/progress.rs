use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::grade::percentage;

/// Maximum number of weak areas retained; the oldest entry is evicted first.
pub const MAX_WEAK_AREAS: usize = 5;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("correct answers ({correct}) exceed questions answered ({answered})")]
    CorrectExceedsAnswered { correct: u32, answered: u32 },

    #[error("too many weak areas: {len}")]
    TooManyWeakAreas { len: usize },
}

//
// ─── ACTIONS ───────────────────────────────────────────────────────────────────
//

/// Transitions accepted by [`ProgressState::apply`].
///
/// Serialized as `{"type": "QUESTION_ANSWERED", "data": {...}}`. Any other
/// `type` deserializes to `Unknown`, which leaves the state untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressAction {
    #[serde(rename_all = "camelCase")]
    QuestionAnswered { is_correct: bool, topic: String },
    TopicStudied { topic: String },
    ResetSession,
    #[serde(other)]
    Unknown,
}

impl ProgressAction {
    #[must_use]
    pub fn question_answered(is_correct: bool, topic: impl Into<String>) -> Self {
        Self::QuestionAnswered {
            is_correct,
            topic: topic.into(),
        }
    }

    #[must_use]
    pub fn topic_studied(topic: impl Into<String>) -> Self {
        Self::TopicStudied {
            topic: topic.into(),
        }
    }
}

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Cumulative study progress for one session.
///
/// Only [`ProgressState::apply`] produces new states, so
/// `correct_answers <= questions_answered` and
/// `weak_areas.len() <= MAX_WEAK_AREAS` hold for every value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressState {
    questions_answered: u32,
    correct_answers: u32,
    topics_studied: BTreeSet<String>,
    weak_areas: Vec<String>,
    concept_mastery: BTreeMap<String, u32>,
}

impl ProgressState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure reducer: returns the state after `action`.
    #[must_use]
    pub fn apply(&self, action: &ProgressAction) -> Self {
        match action {
            ProgressAction::QuestionAnswered { is_correct, topic } => {
                let mut next = self.clone();
                next.questions_answered = next.questions_answered.saturating_add(1);
                if *is_correct {
                    next.correct_answers = next.correct_answers.saturating_add(1);
                } else {
                    next.weak_areas = with_weak_area(&self.weak_areas, topic);
                }
                next
            }
            ProgressAction::TopicStudied { topic } => {
                let mut next = self.clone();
                next.topics_studied.insert(topic.clone());
                let level = next.concept_mastery.entry(topic.clone()).or_insert(0);
                *level = level.saturating_add(1);
                next
            }
            ProgressAction::ResetSession => Self::default(),
            ProgressAction::Unknown => self.clone(),
        }
    }

    #[must_use]
    pub fn questions_answered(&self) -> u32 {
        self.questions_answered
    }

    #[must_use]
    pub fn correct_answers(&self) -> u32 {
        self.correct_answers
    }

    #[must_use]
    pub fn topics_studied(&self) -> &BTreeSet<String> {
        &self.topics_studied
    }

    /// Weak areas, oldest first.
    #[must_use]
    pub fn weak_areas(&self) -> &[String] {
        &self.weak_areas
    }

    #[must_use]
    pub fn concept_mastery(&self) -> &BTreeMap<String, u32> {
        &self.concept_mastery
    }

    /// Accuracy as a whole percentage, rounded half up; 0 before any answer.
    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        percentage(self.correct_answers, self.questions_answered)
    }

    #[must_use]
    pub fn to_record(&self) -> ProgressRecord {
        ProgressRecord {
            questions_answered: self.questions_answered,
            correct_answers: self.correct_answers,
            topics_studied: self.topics_studied.iter().cloned().collect(),
            weak_areas: self.weak_areas.clone(),
            concept_mastery: self.concept_mastery.clone(),
        }
    }
}

fn with_weak_area(weak_areas: &[String], topic: &str) -> Vec<String> {
    if weak_areas.iter().any(|area| area == topic) {
        return weak_areas.to_vec();
    }
    let mut next: Vec<String> = weak_areas.to_vec();
    next.push(topic.to_string());
    let overflow = next.len().saturating_sub(MAX_WEAK_AREAS);
    next.drain(..overflow);
    next
}

//
// ─── PERSISTED SHAPE ───────────────────────────────────────────────────────────
//

/// Plain, serializable shape of a [`ProgressState`] snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressRecord {
    pub questions_answered: u32,
    pub correct_answers: u32,
    pub topics_studied: Vec<String>,
    pub weak_areas: Vec<String>,
    pub concept_mastery: BTreeMap<String, u32>,
}

impl ProgressRecord {
    /// Rehydrate a progress state, re-checking its invariants.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError` if the counters or the weak-area list are out of bounds.
    pub fn into_state(self) -> Result<ProgressState, ProgressError> {
        if self.correct_answers > self.questions_answered {
            return Err(ProgressError::CorrectExceedsAnswered {
                correct: self.correct_answers,
                answered: self.questions_answered,
            });
        }
        if self.weak_areas.len() > MAX_WEAK_AREAS {
            return Err(ProgressError::TooManyWeakAreas {
                len: self.weak_areas.len(),
            });
        }
        Ok(ProgressState {
            questions_answered: self.questions_answered,
            correct_answers: self.correct_answers,
            topics_studied: self.topics_studied.into_iter().collect(),
            weak_areas: self.weak_areas,
            concept_mastery: self.concept_mastery,
        })
    }
}
