use std::collections::HashSet;

use formation_core::model::{
    Content, ContentId, Formation, FormationId, Module, ModuleId,
};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{
    content_id_from_i64, formation_id_from_i64, id_i64, map_content_row, map_formation_row,
    map_module_row, module_id_from_i64,
};
use crate::repository::{
    FormationRepository, ModuleRepository, NewContentRecord, NewFormationRecord, NewModuleRecord,
    StorageError,
};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl FormationRepository for SqliteRepository {
    async fn insert_new_formation(
        &self,
        formation: NewFormationRecord,
    ) -> Result<FormationId, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO formations (title, description, kind, duration_minutes, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ",
        )
        .bind(formation.title)
        .bind(formation.description)
        .bind(formation.kind)
        .bind(i64::from(formation.duration_minutes))
        .bind(formation.created_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        formation_id_from_i64(res.last_insert_rowid())
    }

    async fn get_formation(&self, id: FormationId) -> Result<Option<Formation>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, title, description, kind, duration_minutes, created_at
            FROM formations
            WHERE id = ?1
            ",
        )
        .bind(id_i64("formation_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.map(|r| map_formation_row(&r)).transpose()
    }

    async fn list_formations(&self, limit: u32) -> Result<Vec<Formation>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, title, description, kind, duration_minutes, created_at
            FROM formations
            ORDER BY id ASC
            LIMIT ?1
            ",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_formation_row).collect()
    }

    async fn update_formation(&self, formation: &Formation) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE formations
            SET title = ?2, description = ?3, kind = ?4, duration_minutes = ?5
            WHERE id = ?1
            ",
        )
        .bind(id_i64("formation_id", formation.id().value())?)
        .bind(formation.title())
        .bind(formation.description())
        .bind(formation.kind())
        .bind(i64::from(formation.duration_minutes()))
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ModuleRepository for SqliteRepository {
    async fn insert_new_module(&self, module: NewModuleRecord) -> Result<ModuleId, StorageError> {
        let formation_id = id_i64("formation_id", module.formation_id.value())?;

        let mut tx = self.pool.begin().await.map_err(conn)?;

        let exists = sqlx::query("SELECT 1 FROM formations WHERE id = ?1")
            .bind(formation_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(conn)?;
        if exists.is_none() {
            return Err(StorageError::NotFound);
        }

        // appended at the end of the formation's order
        let res = sqlx::query(
            r"
            INSERT INTO modules (formation_id, title, description, position, created_at)
            VALUES (
                ?1, ?2, ?3,
                (SELECT COALESCE(MAX(position) + 1, 0) FROM modules WHERE formation_id = ?1),
                ?4
            )
            ",
        )
        .bind(formation_id)
        .bind(module.title)
        .bind(module.description)
        .bind(module.created_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        let id = module_id_from_i64(res.last_insert_rowid())?;
        tx.commit().await.map_err(conn)?;
        Ok(id)
    }

    async fn get_module(&self, id: ModuleId) -> Result<Option<Module>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, formation_id, title, description, created_at
            FROM modules
            WHERE id = ?1
            ",
        )
        .bind(id_i64("module_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.map(|r| map_module_row(&r)).transpose()
    }

    async fn list_modules(&self, formation_id: FormationId) -> Result<Vec<Module>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, formation_id, title, description, created_at
            FROM modules
            WHERE formation_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(id_i64("formation_id", formation_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_module_row).collect()
    }

    async fn reorder_modules(
        &self,
        formation_id: FormationId,
        order: &[ModuleId],
    ) -> Result<(), StorageError> {
        let formation = id_i64("formation_id", formation_id.value())?;

        let mut tx = self.pool.begin().await.map_err(conn)?;

        let rows = sqlx::query("SELECT id FROM modules WHERE formation_id = ?1")
            .bind(formation)
            .fetch_all(&mut *tx)
            .await
            .map_err(conn)?;
        let mut existing = HashSet::with_capacity(rows.len());
        for row in &rows {
            existing.insert(module_id_from_i64(row.try_get::<i64, _>("id").map_err(conn)?)?);
        }

        let mut seen = HashSet::with_capacity(order.len());
        for id in order {
            if !existing.contains(id) {
                return Err(StorageError::NotFound);
            }
            // a duplicate would leave two modules tied at one position
            if !seen.insert(*id) {
                return Err(StorageError::Conflict);
            }
        }
        if order.len() != existing.len() {
            return Err(StorageError::Conflict);
        }

        for (position, id) in order.iter().enumerate() {
            sqlx::query("UPDATE modules SET position = ?1 WHERE id = ?2 AND formation_id = ?3")
                .bind(i64::try_from(position).map_err(conn)?)
                .bind(id_i64("module_id", id.value())?)
                .bind(formation)
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn insert_new_content(
        &self,
        content: NewContentRecord,
    ) -> Result<ContentId, StorageError> {
        let module_id = id_i64("module_id", content.module_id.value())?;

        let mut tx = self.pool.begin().await.map_err(conn)?;

        let exists = sqlx::query("SELECT 1 FROM modules WHERE id = ?1")
            .bind(module_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(conn)?;
        if exists.is_none() {
            return Err(StorageError::NotFound);
        }

        let res = sqlx::query(
            r"
            INSERT INTO contents (module_id, kind, title, duration_minutes, location, position, created_at)
            VALUES (
                ?1, ?2, ?3, ?4, ?5,
                (SELECT COALESCE(MAX(position) + 1, 0) FROM contents WHERE module_id = ?1),
                ?6
            )
            ",
        )
        .bind(module_id)
        .bind(content.kind.as_str())
        .bind(content.title)
        .bind(i64::from(content.duration_minutes))
        .bind(content.location.to_string())
        .bind(content.created_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;

        let id = content_id_from_i64(res.last_insert_rowid())?;
        tx.commit().await.map_err(conn)?;
        Ok(id)
    }

    async fn list_contents(&self, module_id: ModuleId) -> Result<Vec<Content>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, module_id, kind, title, duration_minutes, location, created_at
            FROM contents
            WHERE module_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(id_i64("module_id", module_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_content_row).collect()
    }
}
