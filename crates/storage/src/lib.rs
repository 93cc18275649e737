#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    ExamConfigRepository, InMemoryRepository, MaterialRepository, NewMaterialRecord,
    NewStudySessionRecord, Storage, StorageError, StudySessionRecord, StudySessionRepository,
};
