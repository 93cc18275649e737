use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tutor_core::model::{MaterialId, Mode, ProgressRecord};

use super::SqliteRepository;
use super::mapping::{conn, material_id_from_i64, material_id_to_i64, ser};
use crate::repository::{
    NewStudySessionRecord, StorageError, StudySessionRecord, StudySessionRepository,
};

fn map_session_row(row: &SqliteRow) -> Result<StudySessionRecord, StorageError> {
    let mode: Mode = row
        .try_get::<String, _>("mode")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let progress: ProgressRecord =
        serde_json::from_str(&row.try_get::<String, _>("progress_json").map_err(ser)?)
            .map_err(ser)?;

    Ok(StudySessionRecord {
        id: row.try_get("id").map_err(ser)?,
        material_id: material_id_from_i64(row.try_get::<i64, _>("material_id").map_err(ser)?)?,
        mode,
        started_at: row.try_get("started_at").map_err(ser)?,
        ended_at: row.try_get("ended_at").map_err(ser)?,
        progress,
    })
}

#[async_trait::async_trait]
impl StudySessionRepository for SqliteRepository {
    async fn append_session(&self, session: NewStudySessionRecord) -> Result<i64, StorageError> {
        if session.ended_at < session.started_at {
            return Err(StorageError::Serialization("session ends before it starts".into()));
        }
        let progress_json = serde_json::to_string(&session.progress).map_err(ser)?;

        let res = sqlx::query(
            r"
            INSERT INTO study_sessions (material_id, mode, started_at, ended_at, progress_json)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(material_id_to_i64(session.material_id)?)
        .bind(session.mode.as_str())
        .bind(session.started_at)
        .bind(session.ended_at)
        .bind(progress_json)
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_foreign_key_violation() => StorageError::NotFound,
            other => conn(other),
        })?;

        Ok(res.last_insert_rowid())
    }

    async fn list_sessions(
        &self,
        material_id: MaterialId,
    ) -> Result<Vec<StudySessionRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, material_id, mode, started_at, ended_at, progress_json
            FROM study_sessions
            WHERE material_id = ?1
            ORDER BY started_at ASC, id ASC
            ",
        )
        .bind(material_id_to_i64(material_id)?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_session_row).collect()
    }
}
