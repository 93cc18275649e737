use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tutor_core::model::{
    ExamConfig, Material, MaterialId, MaterialKind, Mode, ProgressRecord,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── RECORDS ───────────────────────────────────────────────────────────────────
//

/// Material to be stored; the repository assigns the id.
#[derive(Debug, Clone)]
pub struct NewMaterialRecord {
    pub title: String,
    pub kind: MaterialKind,
    pub page_count: Option<u32>,
    pub text: String,
}

/// A finished study session to be stored.
#[derive(Debug, Clone)]
pub struct NewStudySessionRecord {
    pub material_id: MaterialId,
    pub mode: Mode,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub progress: ProgressRecord,
}

/// Persisted study session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudySessionRecord {
    pub id: i64,
    pub material_id: MaterialId,
    pub mode: Mode,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub progress: ProgressRecord,
}

impl StudySessionRecord {
    /// Whole minutes between start and end.
    #[must_use]
    pub fn duration_minutes(&self) -> i64 {
        (self.ended_at - self.started_at).num_minutes().max(0)
    }
}

//
// ─── CONTRACTS ─────────────────────────────────────────────────────────────────
//

/// Repository contract for study documents and exam materials.
#[async_trait]
pub trait MaterialRepository: Send + Sync {
    /// Store a new material.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the material cannot be stored.
    async fn insert_material(&self, material: NewMaterialRecord) -> Result<MaterialId, StorageError>;

    /// Fetch a material by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_material(&self, id: MaterialId) -> Result<Material, StorageError>;

    /// List materials ordered by id, optionally restricted to one kind.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on persistence failures.
    async fn list_materials(&self, kind: Option<MaterialKind>) -> Result<Vec<Material>, StorageError>;

    /// Delete a material together with its exam config and sessions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn delete_material(&self, id: MaterialId) -> Result<(), StorageError>;
}

/// Exam configuration per study material. Saving replaces; it never merges.
#[async_trait]
pub trait ExamConfigRepository: Send + Sync {
    /// # Errors
    ///
    /// Returns `StorageError` if the config cannot be stored.
    async fn save_exam_config(
        &self,
        material_id: MaterialId,
        config: &ExamConfig,
    ) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on persistence or decoding failures.
    async fn get_exam_config(&self, material_id: MaterialId)
    -> Result<Option<ExamConfig>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` on persistence failures.
    async fn clear_exam_config(&self, material_id: MaterialId) -> Result<(), StorageError>;
}

#[async_trait]
pub trait StudySessionRepository: Send + Sync {
    /// Append a finished session, returning its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be stored.
    async fn append_session(&self, session: NewStudySessionRecord) -> Result<i64, StorageError>;

    /// Sessions for a material, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on persistence or decoding failures.
    async fn list_sessions(
        &self,
        material_id: MaterialId,
    ) -> Result<Vec<StudySessionRecord>, StorageError>;
}

//
// ─── IN-MEMORY ─────────────────────────────────────────────────────────────────
//

#[derive(Default)]
struct MemoryState {
    materials: HashMap<MaterialId, Material>,
    exam_configs: HashMap<MaterialId, ExamConfig>,
    sessions: Vec<StudySessionRecord>,
    next_material_id: u64,
    next_session_id: i64,
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<T>(
        &self,
        f: impl FnOnce(&mut MemoryState) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        f(&mut guard)
    }
}

#[async_trait]
impl MaterialRepository for InMemoryRepository {
    async fn insert_material(&self, material: NewMaterialRecord) -> Result<MaterialId, StorageError> {
        self.with_state(|state| {
            state.next_material_id += 1;
            let id = MaterialId::new(state.next_material_id);
            let material = Material::new(
                id,
                material.title,
                material.kind,
                material.page_count,
                material.text,
            )
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
            state.materials.insert(id, material);
            Ok(id)
        })
    }

    async fn get_material(&self, id: MaterialId) -> Result<Material, StorageError> {
        self.with_state(|state| state.materials.get(&id).cloned().ok_or(StorageError::NotFound))
    }

    async fn list_materials(&self, kind: Option<MaterialKind>) -> Result<Vec<Material>, StorageError> {
        self.with_state(|state| {
            let mut found: Vec<Material> = state
                .materials
                .values()
                .filter(|m| kind.is_none_or(|k| m.kind() == k))
                .cloned()
                .collect();
            found.sort_by_key(Material::id);
            Ok(found)
        })
    }

    async fn delete_material(&self, id: MaterialId) -> Result<(), StorageError> {
        self.with_state(|state| {
            state.materials.remove(&id).ok_or(StorageError::NotFound)?;
            state.exam_configs.remove(&id);
            state.sessions.retain(|s| s.material_id != id);
            Ok(())
        })
    }
}

#[async_trait]
impl ExamConfigRepository for InMemoryRepository {
    async fn save_exam_config(
        &self,
        material_id: MaterialId,
        config: &ExamConfig,
    ) -> Result<(), StorageError> {
        self.with_state(|state| {
            if !state.materials.contains_key(&material_id) {
                return Err(StorageError::NotFound);
            }
            state.exam_configs.insert(material_id, config.clone());
            Ok(())
        })
    }

    async fn get_exam_config(
        &self,
        material_id: MaterialId,
    ) -> Result<Option<ExamConfig>, StorageError> {
        self.with_state(|state| Ok(state.exam_configs.get(&material_id).cloned()))
    }

    async fn clear_exam_config(&self, material_id: MaterialId) -> Result<(), StorageError> {
        self.with_state(|state| {
            state.exam_configs.remove(&material_id);
            Ok(())
        })
    }
}

#[async_trait]
impl StudySessionRepository for InMemoryRepository {
    async fn append_session(&self, session: NewStudySessionRecord) -> Result<i64, StorageError> {
        self.with_state(|state| {
            if session.ended_at < session.started_at {
                return Err(StorageError::Serialization(
                    "session ends before it starts".into(),
                ));
            }
            if !state.materials.contains_key(&session.material_id) {
                return Err(StorageError::NotFound);
            }
            state.next_session_id += 1;
            let id = state.next_session_id;
            state.sessions.push(StudySessionRecord {
                id,
                material_id: session.material_id,
                mode: session.mode,
                started_at: session.started_at,
                ended_at: session.ended_at,
                progress: session.progress,
            });
            Ok(id)
        })
    }

    async fn list_sessions(
        &self,
        material_id: MaterialId,
    ) -> Result<Vec<StudySessionRecord>, StorageError> {
        self.with_state(|state| {
            let mut found: Vec<StudySessionRecord> = state
                .sessions
                .iter()
                .filter(|s| s.material_id == material_id)
                .cloned()
                .collect();
            found.sort_by_key(|s| (s.started_at, s.id));
            Ok(found)
        })
    }
}

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub materials: Arc<dyn MaterialRepository>,
    pub exam_configs: Arc<dyn ExamConfigRepository>,
    pub sessions: Arc<dyn StudySessionRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            materials: Arc::new(repo.clone()),
            exam_configs: Arc::new(repo.clone()),
            sessions: Arc::new(repo),
        }
    }
}
