#![forbid(unsafe_code)]

pub mod catalog_service;
pub mod error;
pub mod progress_service;
pub mod quiz_service;
pub mod snapshot;

pub use formation_core::Clock;

pub use catalog_service::CatalogService;
pub use error::{CatalogServiceError, ProgressServiceError, QuizServiceError};
pub use progress_service::ProgressService;
pub use quiz_service::QuizService;
pub use snapshot::{FormationSnapshot, ModuleSnapshot, QuizFacts};
