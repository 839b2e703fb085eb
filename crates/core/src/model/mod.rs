mod attempt;
mod content;
mod formation;
mod ids;
mod module;
mod quiz;

pub use attempt::QuizAttempt;
pub use content::{Content, ContentError, ContentKind, ContentLocation};
pub use formation::{Formation, FormationError};
pub use ids::{
    ChoiceId, ContentId, FormationId, LearnerId, ModuleId, ParseIdError, QuestionId, QuizId,
};
pub use module::{Module, ModuleError};
pub use quiz::{
    Choice, ChoiceDraft, PassThreshold, Question, QuestionDraft, Quiz, QuizDraft, QuizError,
    ValidatedChoice, ValidatedQuestion, ValidatedQuiz,
};
