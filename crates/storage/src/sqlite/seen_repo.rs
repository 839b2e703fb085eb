use std::collections::HashSet;

use chrono::{DateTime, Utc};
use formation_core::model::{ContentId, LearnerId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{content_id_from_i64, id_i64};
use crate::repository::{SeenRepository, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl SeenRepository for SqliteRepository {
    async fn is_seen(
        &self,
        content_id: ContentId,
        learner_id: LearnerId,
    ) -> Result<bool, StorageError> {
        let row = sqlx::query(
            r"
            SELECT 1 FROM seen_contents
            WHERE content_id = ?1 AND learner_id = ?2
            ",
        )
        .bind(id_i64("content_id", content_id.value())?)
        .bind(id_i64("learner_id", learner_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        Ok(row.is_some())
    }

    async fn mark_seen(
        &self,
        content_id: ContentId,
        learner_id: LearnerId,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        // first mark wins; re-marking never touches the stored timestamp
        sqlx::query(
            r"
            INSERT INTO seen_contents (content_id, learner_id, seen_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(content_id, learner_id) DO NOTHING
            ",
        )
        .bind(id_i64("content_id", content_id.value())?)
        .bind(id_i64("learner_id", learner_id.value())?)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn seen_contents(
        &self,
        learner_id: LearnerId,
        content_ids: &[ContentId],
    ) -> Result<HashSet<ContentId>, StorageError> {
        if content_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let mut sql = String::from(
            r"
            SELECT content_id FROM seen_contents
            WHERE learner_id = ?1 AND content_id IN (
            ",
        );
        for i in 0..content_ids.len() {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push('?');
            sql.push_str(&(i + 2).to_string());
        }
        sql.push_str(")\n");

        let mut q = sqlx::query(&sql).bind(id_i64("learner_id", learner_id.value())?);
        for id in content_ids {
            q = q.bind(id_i64("content_id", id.value())?);
        }

        let rows = q.fetch_all(&self.pool).await.map_err(conn)?;

        let mut seen = HashSet::with_capacity(rows.len());
        for row in rows {
            seen.insert(content_id_from_i64(
                row.try_get::<i64, _>("content_id").map_err(conn)?,
            )?);
        }
        Ok(seen)
    }
}
