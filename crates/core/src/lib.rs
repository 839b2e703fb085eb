#![forbid(unsafe_code)]

pub mod grader;
pub mod model;
pub mod progression;
pub mod reorder;
pub mod time;

pub use time::Clock;

pub use grader::{GradeError, GradedQuiz, QuestionOutcome, grade};
pub use progression::{
    FormationProgress, ModuleFacts, ModuleProgress, QuizRequirement, is_module_unlocked,
};
pub use reorder::{ReorderError, validate_reorder};
