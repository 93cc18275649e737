#![forbid(unsafe_code)]

pub mod error;
pub mod llm;
pub mod study_service;
pub mod tutor;

pub use tutor_core::Clock;

pub use error::{ConfigError, LlmError, StudyServiceError};
pub use llm::{
    ErrorCode, HttpLlmTransport, LlmConfig, LlmReply, LlmRequest, LlmTransport, MockLlmTransport,
    TokenUsage, transport_from_config,
};
pub use study_service::{SessionContext, StudyService};
pub use tutor::{
    AnswerSubmitter, Debouncer, DisplayTurn, Rejection, TurnOutcome, TurnReply, TutorSession,
};
