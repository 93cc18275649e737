use std::sync::Arc;

use storage::repository::{
    ExamConfigRepository, MaterialRepository, NewMaterialRecord, NewStudySessionRecord, Storage,
    StudySessionRecord, StudySessionRepository,
};
use tracing::{debug, info};
use tutor_core::model::{
    ExamConfig, ExamConfigDraft, HistoryWindow, Material, MaterialId, MaterialKind,
    ReferenceMaterial,
};

use crate::Clock;
use crate::error::StudyServiceError;
use crate::llm::LlmTransport;
use crate::tutor::TutorSession;

/// A document opened for study, with everything the session reads from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub document: Material,
    pub references: Vec<ReferenceMaterial>,
    pub exam_config: Option<ExamConfig>,
}

impl SessionContext {
    /// Start a tutoring session over this document.
    #[must_use]
    pub fn start_session(
        self,
        transport: Arc<dyn LlmTransport>,
        window: HistoryWindow,
        clock: Clock,
    ) -> TutorSession {
        TutorSession::new(transport, self.document.text())
            .with_references(self.references)
            .with_exam_config(self.exam_config)
            .with_history_window(window)
            .with_clock(clock)
    }
}

/// Loads materials and exam settings for sessions and stores their results.
#[derive(Clone)]
pub struct StudyService {
    clock: Clock,
    materials: Arc<dyn MaterialRepository>,
    exam_configs: Arc<dyn ExamConfigRepository>,
    sessions: Arc<dyn StudySessionRepository>,
}

impl StudyService {
    #[must_use]
    pub fn new(clock: Clock, storage: &Storage) -> Self {
        Self {
            clock,
            materials: Arc::clone(&storage.materials),
            exam_configs: Arc::clone(&storage.exam_configs),
            sessions: Arc::clone(&storage.sessions),
        }
    }

    /// Store extracted document text.
    ///
    /// # Errors
    ///
    /// Returns `StudyServiceError::Material` for a blank title.
    /// Returns `StudyServiceError::Storage` if persistence fails.
    pub async fn import_material(
        &self,
        title: &str,
        kind: MaterialKind,
        page_count: Option<u32>,
        text: String,
    ) -> Result<MaterialId, StudyServiceError> {
        // The real id is assigned on insert.
        let checked = Material::new(MaterialId::new(0), title, kind, page_count, text)?;
        let id = self
            .materials
            .insert_material(NewMaterialRecord {
                title: checked.title().to_string(),
                kind,
                page_count,
                text: checked.text().to_string(),
            })
            .await?;
        info!(material_id = %id, %kind, "material imported");
        Ok(id)
    }

    /// # Errors
    ///
    /// Returns `StudyServiceError::Storage` if repository access fails.
    pub async fn list_materials(
        &self,
        kind: Option<MaterialKind>,
    ) -> Result<Vec<Material>, StudyServiceError> {
        Ok(self.materials.list_materials(kind).await?)
    }

    /// Load a document for study.
    ///
    /// A study document brings every exam material along as references and
    /// its saved exam configuration, if any.
    ///
    /// # Errors
    ///
    /// Returns `StudyServiceError::Storage` if the material is missing or
    /// repository access fails.
    pub async fn open(&self, material_id: MaterialId) -> Result<SessionContext, StudyServiceError> {
        let document = self.materials.get_material(material_id).await?;
        let references: Vec<ReferenceMaterial> = match document.kind() {
            MaterialKind::Study => self
                .materials
                .list_materials(Some(MaterialKind::Exam))
                .await?
                .iter()
                .map(Material::to_reference)
                .collect(),
            MaterialKind::Exam => Vec::new(),
        };
        let exam_config = self.exam_configs.get_exam_config(material_id).await?;
        debug!(
            material_id = %material_id,
            references = references.len(),
            has_exam_config = exam_config.is_some(),
            "material opened"
        );
        Ok(SessionContext {
            document,
            references,
            exam_config,
        })
    }

    /// Validate and save an exam configuration, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns `StudyServiceError::ExamConfig` if the draft is invalid.
    /// Returns `StudyServiceError::Storage` if the material is missing or
    /// persistence fails.
    pub async fn save_exam_config(
        &self,
        material_id: MaterialId,
        draft: ExamConfigDraft,
    ) -> Result<ExamConfig, StudyServiceError> {
        let config = draft.validate()?;
        self.exam_configs
            .save_exam_config(material_id, &config)
            .await?;
        info!(material_id = %material_id, exam_type = %config.exam_type(), "exam config saved");
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `StudyServiceError::Storage` if repository access fails.
    pub async fn clear_exam_config(&self, material_id: MaterialId) -> Result<(), StudyServiceError> {
        Ok(self.exam_configs.clear_exam_config(material_id).await?)
    }

    /// Persist a snapshot of `session` as a completed study session.
    ///
    /// # Errors
    ///
    /// Returns `StudyServiceError::Storage` if the material is missing or
    /// persistence fails.
    pub async fn record_session(
        &self,
        material_id: MaterialId,
        session: &TutorSession,
    ) -> Result<i64, StudyServiceError> {
        let record = NewStudySessionRecord {
            material_id,
            mode: session.mode(),
            started_at: session.started_at(),
            ended_at: self.clock.now(),
            progress: session.progress().to_record(),
        };
        let id = self.sessions.append_session(record).await?;
        info!(material_id = %material_id, session_id = id, "study session recorded");
        Ok(id)
    }

    /// Past sessions for a document, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StudyServiceError::Storage` if repository access fails.
    pub async fn session_history(
        &self,
        material_id: MaterialId,
    ) -> Result<Vec<StudySessionRecord>, StudyServiceError> {
        Ok(self.sessions.list_sessions(material_id).await?)
    }
}
