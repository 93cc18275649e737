use serde::{Deserialize, Serialize};

//
// ─── TURNS ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One message of a conversation, serialized as `{role, content}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

//
// ─── LOG ───────────────────────────────────────────────────────────────────────
//

/// Append-only conversation history replayed into every request.
///
/// `append` never touches the receiver; it returns a new log with exactly
/// one user turn followed by one assistant turn added at the end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationLog {
    turns: Vec<ConversationTurn>,
}

impl ConversationLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn append(&self, user_text: &str, assistant_text: &str) -> Self {
        let mut turns = Vec::with_capacity(self.turns.len() + 2);
        turns.extend_from_slice(&self.turns);
        turns.push(ConversationTurn::user(user_text));
        turns.push(ConversationTurn::assistant(assistant_text));
        Self { turns }
    }

    #[must_use]
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// The slice of history to replay under the given window policy.
    #[must_use]
    pub fn replay(&self, window: HistoryWindow) -> &[ConversationTurn] {
        window.apply(&self.turns)
    }
}

//
// ─── REPLAY WINDOW ─────────────────────────────────────────────────────────────
//

/// Bounds how much history is replayed into a request.
///
/// The log itself keeps growing; only the replayed slice is bounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HistoryWindow {
    #[default]
    Unbounded,
    /// Replay at most this many trailing messages, starting on a user turn.
    ///
    /// A leading assistant turn is skipped, so an odd count replays one
    /// message fewer and `LastMessages(1)` replays nothing.
    LastMessages(usize),
}

impl HistoryWindow {
    #[must_use]
    pub fn apply(self, turns: &[ConversationTurn]) -> &[ConversationTurn] {
        match self {
            HistoryWindow::Unbounded => turns,
            HistoryWindow::LastMessages(max) => {
                let mut start = turns.len().saturating_sub(max);
                while start < turns.len() && turns[start].role != Role::User {
                    start += 1;
                }
                &turns[start..]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_with(pairs: usize) -> ConversationLog {
        (0..pairs).fold(ConversationLog::new(), |log, i| {
            log.append(&format!("q{i}"), &format!("a{i}"))
        })
    }

    #[test]
    fn append_adds_two_turns_and_keeps_prefix() {
        let history = log_with(2);
        let next = history.append("why?", "because");

        assert_eq!(next.len(), history.len() + 2);
        assert_eq!(&next.turns()[..history.len()], history.turns());
        assert_eq!(next.turns()[4], ConversationTurn::user("why?"));
        assert_eq!(next.turns()[5], ConversationTurn::assistant("because"));
        assert_eq!(history.len(), 4);
    }

    #[test]
    fn turns_serialize_with_lowercase_roles() {
        let json = serde_json::to_string(&ConversationTurn::assistant("hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
    }

    #[test]
    fn unbounded_window_replays_everything() {
        let log = log_with(3);
        assert_eq!(log.replay(HistoryWindow::Unbounded).len(), 6);
    }

    #[test]
    fn bounded_window_starts_on_user_turn() {
        let log = log_with(3);

        let even = log.replay(HistoryWindow::LastMessages(4));
        assert_eq!(even.len(), 4);
        assert_eq!(even[0], ConversationTurn::user("q1"));

        let odd = log.replay(HistoryWindow::LastMessages(3));
        assert_eq!(odd.len(), 2);
        assert_eq!(odd[0], ConversationTurn::user("q2"));

        assert!(log.replay(HistoryWindow::LastMessages(1)).is_empty());
        assert!(log.replay(HistoryWindow::LastMessages(0)).is_empty());
    }
}
