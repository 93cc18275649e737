use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tutor_core::model::{ConversationTurn, DifficultyLevel, ExamType, Mode};

use crate::error::LlmError;

/// Token counts reported for one completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Everything a transport needs to answer one turn.
///
/// `system` and `messages` go on the wire; the remaining fields describe the
/// session so a transport that never reaches the network can still tailor
/// its reply.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub mode: Mode,
    pub system: String,
    pub messages: Vec<ConversationTurn>,
    pub document_text: Arc<str>,
    pub exam: Option<(ExamType, DifficultyLevel)>,
    pub reference_count: usize,
}

impl LlmRequest {
    /// The newest user message, if any.
    #[must_use]
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|turn| turn.role == tutor_core::model::Role::User)
            .map(|turn| turn.content.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmReply {
    pub message: String,
    pub usage: Option<TokenUsage>,
    pub is_mock: bool,
}

/// Stateless request/response completion client.
#[async_trait]
pub trait LlmTransport: Send + Sync {
    /// Send one request.
    ///
    /// # Errors
    ///
    /// Returns `LlmError` when the request fails or the service reports an error.
    async fn send(&self, request: &LlmRequest) -> Result<LlmReply, LlmError>;

    /// True for transports that never touch the network.
    fn is_mock(&self) -> bool {
        false
    }
}
