use std::sync::Arc;

use formation_core::grader::{GradedQuiz, grade};
use formation_core::model::{LearnerId, ModuleId, Quiz, QuizAttempt, QuizId};
use storage::repository::{AttemptRepository, GradedAttemptRecord, QuizRepository, Storage};

use crate::Clock;
use crate::error::QuizServiceError;

/// Orchestrates quiz delivery and attempt submission.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    quizzes: Arc<dyn QuizRepository>,
    attempts: Arc<dyn AttemptRepository>,
}

impl QuizService {
    #[must_use]
    pub fn new(clock: Clock, storage: &Storage) -> Self {
        Self {
            clock,
            quizzes: storage.quizzes.clone(),
            attempts: storage.attempts.clone(),
        }
    }

    /// The quiz a learner can actually take for the module. A module without
    /// a quiz, or whose quiz has zero questions, offers none: an ungradeable
    /// quiz is withheld rather than presented.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` for read failures.
    pub async fn available_quiz(
        &self,
        module_id: ModuleId,
    ) -> Result<Option<Quiz>, QuizServiceError> {
        let quiz = self.quizzes.quiz_for_module(module_id).await?;
        Ok(quiz.filter(|q| !q.questions.is_empty()))
    }

    /// Grades a submitted attempt, appends it to the learner's history, and
    /// returns the verdict. The attempt itself is never persisted, only the
    /// graded record.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::UnknownQuiz` if the quiz does not exist,
    /// `QuizServiceError::Grade` if it cannot be graded, and
    /// `QuizServiceError::Storage` if the record cannot be appended.
    pub async fn submit_attempt(
        &self,
        attempt: &QuizAttempt,
    ) -> Result<GradedQuiz, QuizServiceError> {
        let quiz = self
            .quizzes
            .get_quiz(attempt.quiz_id)
            .await?
            .ok_or(QuizServiceError::UnknownQuiz(attempt.quiz_id.value()))?;

        let graded = grade(&quiz, attempt)?;
        let record =
            GradedAttemptRecord::from_graded(&graded, attempt.learner_id, self.clock.now());
        self.attempts.append_attempt(record).await?;

        tracing::info!(
            quiz = %quiz.id,
            learner = %attempt.learner_id,
            percentage = graded.percentage,
            passed = graded.passed,
            "graded quiz attempt"
        );
        Ok(graded)
    }

    /// The learner's attempt history for a quiz, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` for read failures.
    pub async fn attempt_history(
        &self,
        quiz_id: QuizId,
        learner_id: LearnerId,
    ) -> Result<Vec<GradedAttemptRecord>, QuizServiceError> {
        let history = self.attempts.attempts_for(quiz_id, learner_id).await?;
        Ok(history)
    }

    /// The learner's most recent graded attempt for a quiz, if any.
    ///
    /// # Errors
    ///
    /// Returns `QuizServiceError::Storage` for read failures.
    pub async fn latest_attempt(
        &self,
        quiz_id: QuizId,
        learner_id: LearnerId,
    ) -> Result<Option<GradedAttemptRecord>, QuizServiceError> {
        let latest = self.attempts.latest_attempt(quiz_id, learner_id).await?;
        Ok(latest)
    }
}
