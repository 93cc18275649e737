use serde::{Deserialize, Serialize};
use std::fmt;

/// Lower bounds (inclusive) of each passing band, in percent.
pub const DISTINCTION_THRESHOLD: u32 = 90;
pub const MERIT_THRESHOLD: u32 = 76;
pub const PASS_THRESHOLD: u32 = 55;

/// Marker an evaluation must contain for an answer to count as correct.
pub const CORRECT_MARKER: &str = "correct: yes";

/// Classification of cumulative quiz accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GradeBand {
    Distinction,
    Merit,
    Pass,
    Fail,
}

impl GradeBand {
    /// Band for a whole percentage, thresholds checked high to low.
    #[must_use]
    pub fn from_percentage(percentage: u32) -> Self {
        if percentage >= DISTINCTION_THRESHOLD {
            GradeBand::Distinction
        } else if percentage >= MERIT_THRESHOLD {
            GradeBand::Merit
        } else if percentage >= PASS_THRESHOLD {
            GradeBand::Pass
        } else {
            GradeBand::Fail
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            GradeBand::Distinction => "Pass with Distinction",
            GradeBand::Merit => "Pass with Merit",
            GradeBand::Pass => "Pass",
            GradeBand::Fail => "Not Yet Passing",
        }
    }
}

impl fmt::Display for GradeBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of classifying a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grade {
    pub band: GradeBand,
    pub percentage: u32,
}

impl Grade {
    #[must_use]
    pub fn label(&self) -> &'static str {
        self.band.label()
    }
}

/// Whole-number percentage of `correct` over `answered`, rounded half up.
///
/// Returns 0 when nothing has been answered. `correct` is capped at `answered`.
#[must_use]
pub fn percentage(correct: u32, answered: u32) -> u32 {
    if answered == 0 {
        return 0;
    }
    let correct = u64::from(correct.min(answered));
    let answered = u64::from(answered);
    let rounded = (200 * correct + answered) / (2 * answered);
    u32::try_from(rounded).unwrap_or(100)
}

#[must_use]
pub fn classify(correct: u32, answered: u32) -> Grade {
    let percentage = percentage(correct, answered);
    Grade {
        band: GradeBand::from_percentage(percentage),
        percentage,
    }
}

/// Whether an evaluation text marks the answer as correct.
///
/// Case-insensitive substring match on [`CORRECT_MARKER`]; anything else,
/// including "partial", counts as incorrect.
#[must_use]
pub fn is_marked_correct(evaluation: &str) -> bool {
    evaluation.to_lowercase().contains(CORRECT_MARKER)
}
