use formation_core::model::{LearnerId, QuizId};

use super::SqliteRepository;
use super::mapping::{id_i64, map_attempt_row};
use crate::repository::{AttemptRepository, GradedAttemptRecord, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn append_attempt(&self, attempt: GradedAttemptRecord) -> Result<i64, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO quiz_attempts (
                quiz_id, learner_id, score, total_questions, percentage, passed, submitted_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(id_i64("quiz_id", attempt.quiz_id.value())?)
        .bind(id_i64("learner_id", attempt.learner_id.value())?)
        .bind(i64::from(attempt.score))
        .bind(i64::from(attempt.total_questions))
        .bind(i64::from(attempt.percentage))
        .bind(i64::from(attempt.passed))
        .bind(attempt.submitted_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(res.last_insert_rowid())
    }

    async fn latest_attempt(
        &self,
        quiz_id: QuizId,
        learner_id: LearnerId,
    ) -> Result<Option<GradedAttemptRecord>, StorageError> {
        // id breaks ties between attempts sharing a timestamp
        let row = sqlx::query(
            r"
            SELECT id, quiz_id, learner_id, score, total_questions, percentage, passed, submitted_at
            FROM quiz_attempts
            WHERE quiz_id = ?1 AND learner_id = ?2
            ORDER BY submitted_at DESC, id DESC
            LIMIT 1
            ",
        )
        .bind(id_i64("quiz_id", quiz_id.value())?)
        .bind(id_i64("learner_id", learner_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        row.map(|r| map_attempt_row(&r)).transpose()
    }

    async fn attempts_for(
        &self,
        quiz_id: QuizId,
        learner_id: LearnerId,
    ) -> Result<Vec<GradedAttemptRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, quiz_id, learner_id, score, total_questions, percentage, passed, submitted_at
            FROM quiz_attempts
            WHERE quiz_id = ?1 AND learner_id = ?2
            ORDER BY submitted_at ASC, id ASC
            ",
        )
        .bind(id_i64("quiz_id", quiz_id.value())?)
        .bind(id_i64("learner_id", learner_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_attempt_row).collect()
    }
}
