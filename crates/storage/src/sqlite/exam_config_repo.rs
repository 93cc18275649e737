use sqlx::Row;
use tutor_core::model::{ExamConfig, MaterialId};

use super::SqliteRepository;
use super::mapping::{conn, material_id_to_i64, ser};
use crate::repository::{ExamConfigRepository, StorageError};

#[async_trait::async_trait]
impl ExamConfigRepository for SqliteRepository {
    async fn save_exam_config(
        &self,
        material_id: MaterialId,
        config: &ExamConfig,
    ) -> Result<(), StorageError> {
        let json = serde_json::to_string(config).map_err(ser)?;

        let res = sqlx::query(
            r"
            INSERT INTO exam_configs (material_id, config_json)
            SELECT id, ?2 FROM materials WHERE id = ?1
            ON CONFLICT(material_id) DO UPDATE SET config_json = excluded.config_json
            ",
        )
        .bind(material_id_to_i64(material_id)?)
        .bind(json)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_exam_config(
        &self,
        material_id: MaterialId,
    ) -> Result<Option<ExamConfig>, StorageError> {
        let row = sqlx::query("SELECT config_json FROM exam_configs WHERE material_id = ?1")
            .bind(material_id_to_i64(material_id)?)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let json: String = row.try_get("config_json").map_err(ser)?;
        serde_json::from_str(&json).map(Some).map_err(ser)
    }

    async fn clear_exam_config(&self, material_id: MaterialId) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM exam_configs WHERE material_id = ?1")
            .bind(material_id_to_i64(material_id)?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
