use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::model::{Grade, ProgressState, classify};
use crate::time::format_session_duration;

/// Read-only view of a session's progress for the dashboard mode.
///
/// Always derived from a [`ProgressState`]; the grade is never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardSummary {
    pub questions_answered: u32,
    pub correct_answers: u32,
    pub grade: Grade,
    pub topics_studied: Vec<String>,
    pub weak_areas: Vec<String>,
    pub concept_mastery: BTreeMap<String, u32>,
    pub session_duration: String,
}

impl DashboardSummary {
    #[must_use]
    pub fn from_progress(
        progress: &ProgressState,
        started_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            questions_answered: progress.questions_answered(),
            correct_answers: progress.correct_answers(),
            grade: classify(progress.correct_answers(), progress.questions_answered()),
            topics_studied: progress.topics_studied().iter().cloned().collect(),
            weak_areas: progress.weak_areas().to_vec(),
            concept_mastery: progress.concept_mastery().clone(),
            session_duration: format_session_duration(started_at, now),
        }
    }

    /// Accuracy shown next to the grade; always equal to `grade.percentage`.
    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        self.grade.percentage
    }
}
