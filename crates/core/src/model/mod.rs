mod conversation;
mod exam_config;
pub mod grade;
mod ids;
mod material;
mod mode;
mod progress;

pub use conversation::{ConversationLog, ConversationTurn, HistoryWindow, Role};
pub use exam_config::{
    DifficultyLevel, ExamConfig, ExamConfigDraft, ExamConfigError, ExamType, MAX_ENTRY_CHARS,
    MAX_OBJECTIVES, MAX_PITFALLS,
};
pub use grade::{Grade, GradeBand, classify, is_marked_correct, percentage};
pub use ids::MaterialId;
pub use material::{Material, MaterialError, MaterialKind, ReferenceMaterial, truncate_chars};
pub use mode::{Mode, ModeParseError};
pub use progress::{MAX_WEAK_AREAS, ProgressAction, ProgressError, ProgressRecord, ProgressState};
