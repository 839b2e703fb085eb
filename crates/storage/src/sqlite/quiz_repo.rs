use std::collections::HashSet;

use chrono::{DateTime, Utc};
use formation_core::model::{
    ChoiceId, ModuleId, Question, QuestionId, Quiz, QuizId, ValidatedQuiz,
};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::SqliteRepository;
use super::mapping::{
    choice_id_from_i64, id_i64, map_choice_row, map_question_row, module_id_from_i64,
    pass_threshold_from_i64, question_id_from_i64, quiz_id_from_i64, ser,
};
use crate::repository::{QuizRepository, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

impl SqliteRepository {
    /// Loads the nested questions and choices for a quiz header row.
    async fn assemble_quiz(&self, row: &SqliteRow) -> Result<Quiz, StorageError> {
        let quiz_id = quiz_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;

        let question_rows = sqlx::query(
            r"
            SELECT id, quiz_id, text
            FROM questions
            WHERE quiz_id = ?1
            ORDER BY position ASC
            ",
        )
        .bind(id_i64("quiz_id", quiz_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut questions: Vec<Question> = question_rows
            .iter()
            .map(map_question_row)
            .collect::<Result<_, _>>()?;

        for question in &mut questions {
            let choice_rows = sqlx::query(
                r"
                SELECT id, question_id, text, is_correct
                FROM choices
                WHERE question_id = ?1
                ORDER BY position ASC
                ",
            )
            .bind(id_i64("question_id", question.id.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(conn)?;

            question.choices = choice_rows
                .iter()
                .map(map_choice_row)
                .collect::<Result<_, _>>()?;
        }

        Ok(Quiz {
            id: quiz_id,
            module_id: module_id_from_i64(row.try_get::<i64, _>("module_id").map_err(ser)?)?,
            title: row.try_get("title").map_err(ser)?,
            description: row.try_get("description").map_err(ser)?,
            pass_threshold: pass_threshold_from_i64(
                row.try_get::<i64, _>("pass_threshold").map_err(ser)?,
            )?,
            questions,
            created_at: row.try_get("created_at").map_err(ser)?,
        })
    }
}

#[async_trait::async_trait]
impl QuizRepository for SqliteRepository {
    async fn insert_quiz(
        &self,
        quiz: ValidatedQuiz,
        created_at: DateTime<Utc>,
    ) -> Result<QuizId, StorageError> {
        let module_id = id_i64("module_id", quiz.module_id.value())?;

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
            INSERT INTO quizzes (module_id, title, description, pass_threshold, position, created_at)
            VALUES (
                ?1, ?2, ?3, ?4,
                (SELECT COALESCE(MAX(position) + 1, 0) FROM quizzes WHERE module_id = ?1),
                ?5
            )
            ",
        )
        .bind(module_id)
        .bind(quiz.title)
        .bind(quiz.description)
        .bind(i64::from(quiz.pass_threshold.value()))
        .bind(created_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?;
        let quiz_row_id = res.last_insert_rowid();

        for (q_position, question) in quiz.questions.into_iter().enumerate() {
            let res = sqlx::query(
                r"
                INSERT INTO questions (quiz_id, text, position)
                VALUES (?1, ?2, ?3)
                ",
            )
            .bind(quiz_row_id)
            .bind(question.text)
            .bind(i64::try_from(q_position).map_err(conn)?)
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
            let question_row_id = res.last_insert_rowid();

            for (c_position, choice) in question.choices.into_iter().enumerate() {
                sqlx::query(
                    r"
                    INSERT INTO choices (question_id, text, is_correct, position)
                    VALUES (?1, ?2, ?3, ?4)
                    ",
                )
                .bind(question_row_id)
                .bind(choice.text)
                .bind(i64::from(choice.is_correct))
                .bind(i64::try_from(c_position).map_err(conn)?)
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
            }
        }

        tx.commit().await.map_err(conn)?;
        quiz_id_from_i64(quiz_row_id)
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, module_id, title, description, pass_threshold, created_at
            FROM quizzes
            WHERE id = ?1
            ",
        )
        .bind(id_i64("quiz_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => Ok(Some(self.assemble_quiz(&row).await?)),
            None => Ok(None),
        }
    }

    async fn quiz_for_module(&self, module_id: ModuleId) -> Result<Option<Quiz>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, module_id, title, description, pass_threshold, created_at
            FROM quizzes
            WHERE module_id = ?1
            ORDER BY position ASC
            LIMIT 1
            ",
        )
        .bind(id_i64("module_id", module_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(conn)?;

        match row {
            Some(row) => Ok(Some(self.assemble_quiz(&row).await?)),
            None => Ok(None),
        }
    }

    async fn reorder_questions(
        &self,
        quiz_id: QuizId,
        order: &[QuestionId],
    ) -> Result<(), StorageError> {
        let quiz = id_i64("quiz_id", quiz_id.value())?;

        let mut tx = self.pool.begin().await.map_err(conn)?;

        let rows = sqlx::query("SELECT id FROM questions WHERE quiz_id = ?1")
            .bind(quiz)
            .fetch_all(&mut *tx)
            .await
            .map_err(conn)?;
        let mut existing: HashSet<QuestionId> = HashSet::with_capacity(rows.len());
        for row in &rows {
            existing.insert(question_id_from_i64(
                row.try_get::<i64, _>("id").map_err(conn)?,
            )?);
        }

        let mut seen = HashSet::with_capacity(order.len());
        for id in order {
            if !existing.contains(id) {
                return Err(StorageError::NotFound);
            }
            if !seen.insert(*id) {
                return Err(StorageError::Conflict);
            }
        }
        if order.len() != existing.len() {
            return Err(StorageError::Conflict);
        }

        for (position, id) in order.iter().enumerate() {
            sqlx::query("UPDATE questions SET position = ?1 WHERE id = ?2 AND quiz_id = ?3")
                .bind(i64::try_from(position).map_err(conn)?)
                .bind(id_i64("question_id", id.value())?)
                .bind(quiz)
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }

    async fn reorder_choices(
        &self,
        question_id: QuestionId,
        order: &[ChoiceId],
    ) -> Result<(), StorageError> {
        let question = id_i64("question_id", question_id.value())?;

        let mut tx = self.pool.begin().await.map_err(conn)?;

        let rows = sqlx::query("SELECT id FROM choices WHERE question_id = ?1")
            .bind(question)
            .fetch_all(&mut *tx)
            .await
            .map_err(conn)?;
        let mut existing: HashSet<ChoiceId> = HashSet::with_capacity(rows.len());
        for row in &rows {
            existing.insert(choice_id_from_i64(
                row.try_get::<i64, _>("id").map_err(conn)?,
            )?);
        }

        let mut seen = HashSet::with_capacity(order.len());
        for id in order {
            if !existing.contains(id) {
                return Err(StorageError::NotFound);
            }
            if !seen.insert(*id) {
                return Err(StorageError::Conflict);
            }
        }
        if order.len() != existing.len() {
            return Err(StorageError::Conflict);
        }

        for (position, id) in order.iter().enumerate() {
            sqlx::query("UPDATE choices SET position = ?1 WHERE id = ?2 AND question_id = ?3")
                .bind(i64::try_from(position).map_err(conn)?)
                .bind(id_i64("choice_id", id.value())?)
                .bind(question)
                .execute(&mut *tx)
                .await
                .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
