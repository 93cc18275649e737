use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;
use tutor_core::model::{Mode, truncate_chars};

use super::transport::{LlmReply, LlmRequest, LlmTransport, TokenUsage};
use crate::error::LlmError;

/// Characters of the document echoed back in mock replies.
pub const MOCK_PREVIEW_CHARS: usize = 200;

const MOCK_USAGE: TokenUsage = TokenUsage {
    input_tokens: 100,
    output_tokens: 150,
};

/// Network-free transport used when no credential is configured.
///
/// Waits a fixed delay, then returns a canned reply for the request's mode.
#[derive(Debug, Clone)]
pub struct MockLlmTransport {
    delay: Duration,
}

impl MockLlmTransport {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl LlmTransport for MockLlmTransport {
    async fn send(&self, request: &LlmRequest) -> Result<LlmReply, LlmError> {
        tokio::time::sleep(self.delay).await;
        debug!(mode = %request.mode, "returning mock completion");
        Ok(LlmReply {
            message: canned_reply(request),
            usage: Some(MOCK_USAGE),
            is_mock: true,
        })
    }

    fn is_mock(&self) -> bool {
        true
    }
}

fn canned_reply(request: &LlmRequest) -> String {
    let preview = if request.document_text.is_empty() {
        "No document content".to_string()
    } else {
        truncate_chars(&request.document_text, MOCK_PREVIEW_CHARS).0.to_string()
    };

    let mut notes = String::new();
    if let Some((exam_type, difficulty)) = request.exam {
        notes.push_str(&format!(
            "\n\n**Exam Mode**: Preparing for {exam_type} exam at {difficulty} level"
        ));
    }
    if request.reference_count > 0 {
        notes.push_str(&format!(
            "\n\n**Exam Materials Loaded**: Using {} exam material(s) as reference for question format and style",
            request.reference_count
        ));
    }

    match request.mode {
        Mode::Review => {
            let opener = if request
                .last_user_message()
                .is_some_and(|m| m.to_lowercase().contains("what"))
            {
                "The main concept is..."
            } else {
                "To answer your question..."
            };
            format!(
                "Based on your textbook (\"{preview}...\"), here's the answer:\n\n\
                 {opener}\n\n\
                 **Key Points:**\n\
                 - Point 1 from the textbook\n\
                 - Point 2 with supporting details\n\
                 - Point 3 connecting to other topics\n\n\
                 **Pages Referenced**: 5, 12, 18\n\n\
                 Related topics you might want to review:\n\
                 - Related Topic A\n\
                 - Related Topic B{notes}\n\n\
                 *[Note: This is a MOCK response. Configure an API key to use the real model]*"
            )
        }
        Mode::Quiz => format!(
            "**Question**: What is the primary function of the key concept in \"{preview}...\"?\n\n\
             Please provide your answer in 2-3 sentences, explaining both the function and its significance.{notes}\n\n\
             *[Note: This is a MOCK quiz question. Configure an API key for real adaptive quizzes]*"
        ),
        Mode::Learn | Mode::Dashboard => format!(
            "Great question! Let me help you understand this concept.\n\n\
             Based on your textbook (first {MOCK_PREVIEW_CHARS} chars: \"{preview}...\"), here's a step-by-step explanation:\n\n\
             1. **Key Concept**: This topic is fundamental to understanding the broader subject\n\
             2. **Why It Matters**: It connects to other important concepts you'll learn\n\
             3. **Real-World Example**: Think of it like an everyday analogy\n\n\
             **Reference**: See pages 15-20 in your textbook for more details.\n\n\
             Would you like me to explain any part in more detail?{notes}\n\n\
             *[Note: This is a MOCK response for testing. Configure an API key to use the real model]*"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tutor_core::model::{ConversationTurn, DifficultyLevel, ExamType};

    fn request(mode: Mode, document: &str, question: &str) -> LlmRequest {
        LlmRequest {
            mode,
            system: String::new(),
            messages: vec![ConversationTurn::user(question)],
            document_text: Arc::from(document),
            exam: None,
            reference_count: 0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn waits_then_replies_with_preview() {
        let transport = MockLlmTransport::new(Duration::from_millis(1500));
        let document = "x".repeat(500);
        let started = tokio::time::Instant::now();

        let reply = transport
            .send(&request(Mode::Learn, &document, "explain"))
            .await
            .unwrap();

        assert!(started.elapsed() >= Duration::from_millis(1500));
        assert!(reply.is_mock);
        assert_eq!(reply.usage, Some(MOCK_USAGE));
        assert!(reply.message.contains(&"x".repeat(MOCK_PREVIEW_CHARS)));
        assert!(!reply.message.contains(&"x".repeat(MOCK_PREVIEW_CHARS + 1)));
        assert!(reply.message.contains("MOCK"));
    }

    #[tokio::test]
    async fn reply_depends_on_mode() {
        let transport = MockLlmTransport::new(Duration::ZERO);

        let quiz = transport.send(&request(Mode::Quiz, "doc", "go")).await.unwrap();
        assert!(quiz.message.starts_with("**Question**"));

        let review = transport
            .send(&request(Mode::Review, "doc", "What is osmosis?"))
            .await
            .unwrap();
        assert!(review.message.contains("The main concept is..."));

        let dashboard = transport.send(&request(Mode::Dashboard, "doc", "hi")).await.unwrap();
        assert!(dashboard.message.starts_with("Great question!"));
    }

    #[tokio::test]
    async fn mentions_exam_context() {
        let transport = MockLlmTransport::new(Duration::ZERO);
        let mut req = request(Mode::Learn, "doc", "hi");
        req.exam = Some((ExamType::Essay, DifficultyLevel::Advanced));
        req.reference_count = 2;

        let reply = transport.send(&req).await.unwrap();
        assert!(reply.message.contains("Preparing for essay exam at advanced level"));
        assert!(reply.message.contains("Using 2 exam material(s)"));
    }
}
