use crate::error::ErrorCode;

/// One entry of the on-screen transcript.
///
/// The transcript also carries error turns and unanswered user messages,
/// neither of which reach the durable conversation log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayTurn {
    User { content: String },
    Assistant { content: String, is_mock: bool },
    Error { code: ErrorCode, message: String },
}

impl DisplayTurn {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        DisplayTurn::User {
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>, is_mock: bool) -> Self {
        DisplayTurn::Assistant {
            content: content.into(),
            is_mock,
        }
    }

    #[must_use]
    pub fn content(&self) -> &str {
        match self {
            DisplayTurn::User { content } | DisplayTurn::Assistant { content, .. } => content,
            DisplayTurn::Error { message, .. } => message,
        }
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, DisplayTurn::Error { .. })
    }
}
