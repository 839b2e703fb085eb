#![forbid(unsafe_code)]

pub mod import;
pub mod repository;
pub mod sqlite;

pub use import::{ImportError, import_formation, parse_formation};
pub use repository::{
    AttemptRepository, FormationRepository, GradedAttemptRecord, InMemoryRepository,
    ModuleRepository, QuizRepository, SeenRepository, Storage, StorageError,
};
pub use sqlite::{SqliteInitError, SqliteRepository};
