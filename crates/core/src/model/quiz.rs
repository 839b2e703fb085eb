use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{ChoiceId, ModuleId, QuestionId, QuizId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizError {
    #[error("quiz title cannot be empty")]
    EmptyTitle,

    #[error("pass threshold must be between 0 and 100, got {value}")]
    InvalidThreshold { value: u32 },

    #[error("quiz must have at least one question")]
    NoQuestions,

    #[error("question text cannot be empty")]
    EmptyQuestionText,

    #[error("choice text cannot be empty")]
    EmptyChoiceText,

    #[error("question must have at least two choices, got {found}")]
    TooFewChoices { found: usize },

    #[error("question must have exactly one correct choice, got {found}")]
    WrongCorrectCount { found: usize },
}

//
// ─── PASS THRESHOLD ────────────────────────────────────────────────────────────
//

/// Minimum percentage (0-100) a graded attempt must reach to pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PassThreshold(u8);

impl PassThreshold {
    /// # Errors
    ///
    /// Returns `QuizError::InvalidThreshold` for values above 100.
    pub fn new(value: u32) -> Result<Self, QuizError> {
        if value > 100 {
            return Err(QuizError::InvalidThreshold { value });
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(value as u8))
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }
}

impl std::fmt::Display for PassThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0)
    }
}

//
// ─── QUIZ TYPES ────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub id: ChoiceId,
    pub question_id: QuestionId,
    pub text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub id: QuestionId,
    pub quiz_id: QuizId,
    pub text: String,
    pub choices: Vec<Choice>,
}

impl Question {
    /// The designated correct choice: the first one flagged correct.
    ///
    /// Well-authored questions have exactly one; persisted legacy data may
    /// have zero or several, which the grader tolerates.
    #[must_use]
    pub fn correct_choice(&self) -> Option<&Choice> {
        self.choices.iter().find(|c| c.is_correct)
    }

    #[must_use]
    pub fn choice(&self, id: ChoiceId) -> Option<&Choice> {
        self.choices.iter().find(|c| c.id == id)
    }
}

/// An assessment attached to a module. Question and choice order is the
/// authored display order.
#[derive(Debug, Clone, PartialEq)]
pub struct Quiz {
    pub id: QuizId,
    pub module_id: ModuleId,
    pub title: String,
    pub description: Option<String>,
    pub pass_threshold: PassThreshold,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
}

impl Quiz {
    #[must_use]
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }
}

//
// ─── AUTHORING DRAFTS ──────────────────────────────────────────────────────────
//

/// Unvalidated authoring input for a choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceDraft {
    pub text: String,
    pub is_correct: bool,
}

impl ChoiceDraft {
    #[must_use]
    pub fn new(text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            text: text.into(),
            is_correct,
        }
    }
}

/// Unvalidated authoring input for a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub text: String,
    pub choices: Vec<ChoiceDraft>,
}

impl QuestionDraft {
    #[must_use]
    pub fn new(text: impl Into<String>, choices: Vec<ChoiceDraft>) -> Self {
        Self {
            text: text.into(),
            choices,
        }
    }

    /// Validates the authoring invariant: non-empty text, at least two
    /// choices, exactly one flagged correct.
    ///
    /// # Errors
    ///
    /// Returns the first violated `QuizError`.
    pub fn validate(self) -> Result<ValidatedQuestion, QuizError> {
        let text = self.text.trim().to_owned();
        if text.is_empty() {
            return Err(QuizError::EmptyQuestionText);
        }
        if self.choices.len() < 2 {
            return Err(QuizError::TooFewChoices {
                found: self.choices.len(),
            });
        }
        let correct = self.choices.iter().filter(|c| c.is_correct).count();
        if correct != 1 {
            return Err(QuizError::WrongCorrectCount { found: correct });
        }

        let mut choices = Vec::with_capacity(self.choices.len());
        for choice in self.choices {
            let text = choice.text.trim().to_owned();
            if text.is_empty() {
                return Err(QuizError::EmptyChoiceText);
            }
            choices.push(ValidatedChoice {
                text,
                is_correct: choice.is_correct,
            });
        }

        Ok(ValidatedQuestion { text, choices })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedChoice {
    pub text: String,
    pub is_correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuestion {
    pub text: String,
    pub choices: Vec<ValidatedChoice>,
}

/// Unvalidated authoring input for a whole quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizDraft {
    pub module_id: ModuleId,
    pub title: String,
    pub description: Option<String>,
    pub pass_threshold: u32,
    pub questions: Vec<QuestionDraft>,
}

impl QuizDraft {
    /// Validates the draft into a shape storage can assign ids to.
    ///
    /// # Errors
    ///
    /// Returns the first violated `QuizError`: empty title, out-of-range
    /// threshold, zero questions, or a malformed question.
    pub fn validate(self) -> Result<ValidatedQuiz, QuizError> {
        let title = self.title.trim().to_owned();
        if title.is_empty() {
            return Err(QuizError::EmptyTitle);
        }
        let pass_threshold = PassThreshold::new(self.pass_threshold)?;
        if self.questions.is_empty() {
            return Err(QuizError::NoQuestions);
        }

        let questions = self
            .questions
            .into_iter()
            .map(QuestionDraft::validate)
            .collect::<Result<Vec<_>, _>>()?;

        let description = self
            .description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        Ok(ValidatedQuiz {
            module_id: self.module_id,
            title,
            description,
            pass_threshold,
            questions,
        })
    }
}

/// A quiz that passed authoring validation and is waiting for storage to
/// assign ids to it and its questions/choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuiz {
    pub module_id: ModuleId,
    pub title: String,
    pub description: Option<String>,
    pub pass_threshold: PassThreshold,
    pub questions: Vec<ValidatedQuestion>,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
