use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use tutor_core::model::{Material, MaterialId, MaterialKind};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn material_id_to_i64(id: MaterialId) -> Result<i64, StorageError> {
    i64::try_from(id.value()).map_err(|_| StorageError::Serialization("material_id overflow".into()))
}

pub(crate) fn material_id_from_i64(v: i64) -> Result<MaterialId, StorageError> {
    u64::try_from(v)
        .map(MaterialId::new)
        .map_err(|_| StorageError::Serialization("material_id sign overflow".into()))
}

pub(crate) fn map_material_row(row: &SqliteRow) -> Result<Material, StorageError> {
    let id = material_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let kind: MaterialKind = row
        .try_get::<String, _>("kind")
        .map_err(ser)?
        .parse()
        .map_err(ser)?;
    let page_count = row
        .try_get::<Option<i64>, _>("page_count")
        .map_err(ser)?
        .map(|v| {
            u32::try_from(v)
                .map_err(|_| StorageError::Serialization(format!("invalid page_count: {v}")))
        })
        .transpose()?;

    Material::new(
        id,
        row.try_get::<String, _>("title").map_err(ser)?,
        kind,
        page_count,
        row.try_get::<String, _>("content_text").map_err(ser)?,
    )
    .map_err(ser)
}
