use tutor_core::model::{Material, MaterialId, MaterialKind};

use super::SqliteRepository;
use super::mapping::{conn, map_material_row, material_id_from_i64, material_id_to_i64};
use crate::repository::{MaterialRepository, NewMaterialRecord, StorageError};

#[async_trait::async_trait]
impl MaterialRepository for SqliteRepository {
    async fn insert_material(&self, material: NewMaterialRecord) -> Result<MaterialId, StorageError> {
        if material.title.trim().is_empty() {
            return Err(StorageError::Serialization("material title cannot be empty".into()));
        }

        let res = sqlx::query(
            r"
            INSERT INTO materials (title, kind, page_count, content_text)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(material.title.trim())
        .bind(material.kind.as_str())
        .bind(material.page_count.map(i64::from))
        .bind(material.text)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        material_id_from_i64(res.last_insert_rowid())
    }

    async fn get_material(&self, id: MaterialId) -> Result<Material, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, title, kind, page_count, content_text
            FROM materials WHERE id = ?1
            ",
        )
        .bind(material_id_to_i64(id)?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => map_material_row(&row),
            None => Err(StorageError::NotFound),
        }
    }

    async fn list_materials(&self, kind: Option<MaterialKind>) -> Result<Vec<Material>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, kind, page_count, content_text
            FROM materials
            WHERE ?1 IS NULL OR kind = ?1
            ORDER BY id ASC
            ",
        )
        .bind(kind.map(MaterialKind::as_str))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut materials = Vec::with_capacity(rows.len());
        for row in rows {
            materials.push(map_material_row(&row)?);
        }
        Ok(materials)
    }

    async fn delete_material(&self, id: MaterialId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM materials WHERE id = ?1")
            .bind(material_id_to_i64(id)?)
            .execute(&self.pool)
            .await
            .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
