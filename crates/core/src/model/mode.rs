use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown mode: {0}")]
pub struct ModeParseError(pub String);

/// Active teaching behavior of a session.
///
/// Selects the mode-specific instruction block of the system prompt. The
/// dashboard mode has no instruction block of its own and is treated like
/// `Learn` whenever a prompt has to be built.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Learn,
    Review,
    Quiz,
    Dashboard,
}

impl Mode {
    pub const ALL: [Mode; 4] = [Mode::Learn, Mode::Review, Mode::Quiz, Mode::Dashboard];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Learn => "learn",
            Mode::Review => "review",
            Mode::Quiz => "quiz",
            Mode::Dashboard => "dashboard",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == needle)
            .ok_or_else(|| ModeParseError(s.to_string()))
    }
}
