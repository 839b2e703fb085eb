//! Shared error types for the services crate.

use thiserror::Error;

use formation_core::grader::GradeError;
use formation_core::model::{ContentError, FormationError, ModuleError, QuizError};
use formation_core::reorder::ReorderError;
use storage::repository::StorageError;

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressServiceError {
    #[error("formation {0} does not exist")]
    UnknownFormation(u64),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error("quiz {0} does not exist")]
    UnknownQuiz(u64),
    #[error(transparent)]
    Grade(#[from] GradeError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CatalogService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogServiceError {
    #[error(transparent)]
    Formation(#[from] FormationError),
    #[error(transparent)]
    Module(#[from] ModuleError),
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Reorder(#[from] ReorderError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
