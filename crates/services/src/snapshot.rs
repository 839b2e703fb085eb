//! Immutable per-decision snapshots.
//!
//! Every progress or gating decision runs over one `FormationSnapshot`
//! loaded up front, never over live repository reads interleaved with the
//! computation. Concurrent writes can land before or after a snapshot, but
//! never inside one.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use formation_core::model::{Content, ContentId, FormationId, LearnerId, Module, ModuleId, QuizId};
use formation_core::progression::{FormationProgress, ModuleFacts, QuizRequirement};
use storage::repository::{
    AttemptRepository, ModuleRepository, QuizRepository, SeenRepository, StorageError,
};

/// The quiz dimension of a module, reduced to what gating needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizFacts {
    pub quiz_id: QuizId,
    pub question_count: u32,
    /// Verdict of the learner's most recent graded attempt; false when no
    /// attempt exists yet.
    pub latest_passed: bool,
}

/// One module with everything the learner's progress over it depends on.
#[derive(Debug, Clone)]
pub struct ModuleSnapshot {
    pub module: Module,
    /// In module content order.
    pub contents: Vec<Content>,
    pub seen: HashSet<ContentId>,
    /// The module's active quiz, or `None` when it has none.
    pub quiz: Option<QuizFacts>,
}

impl ModuleSnapshot {
    /// Reduces the snapshot to the pure facts the progression math runs on.
    /// A quiz with zero questions imposes no requirement.
    #[must_use]
    pub fn facts(&self) -> ModuleFacts {
        let quiz = match &self.quiz {
            Some(q) if q.question_count > 0 => QuizRequirement::Required {
                passed: q.latest_passed,
            },
            _ => QuizRequirement::None,
        };
        ModuleFacts {
            module_id: self.module.id(),
            content_total: u32::try_from(self.contents.len()).unwrap_or(u32::MAX),
            content_seen: u32::try_from(self.seen.len()).unwrap_or(u32::MAX),
            quiz,
        }
    }
}

/// A consistent read of one formation for one learner.
#[derive(Debug, Clone)]
pub struct FormationSnapshot {
    pub formation_id: FormationId,
    pub learner_id: LearnerId,
    pub loaded_at: DateTime<Utc>,
    /// In formation module order.
    pub modules: Vec<ModuleSnapshot>,
}

impl FormationSnapshot {
    /// Loads the snapshot: the ordered module list, each module's contents,
    /// the learner's seen facts (one batch read per module), and the latest
    /// attempt verdict for each module's quiz.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if any read fails; callers decide whether that
    /// fails closed (gating) or propagates (reporting).
    pub async fn load(
        formation_id: FormationId,
        learner_id: LearnerId,
        loaded_at: DateTime<Utc>,
        modules: &dyn ModuleRepository,
        quizzes: &dyn QuizRepository,
        seen: &dyn SeenRepository,
        attempts: &dyn AttemptRepository,
    ) -> Result<Self, StorageError> {
        let module_list = modules.list_modules(formation_id).await?;

        let mut snapshots = Vec::with_capacity(module_list.len());
        for module in module_list {
            let contents = modules.list_contents(module.id()).await?;
            let content_ids: Vec<ContentId> = contents.iter().map(Content::id).collect();
            let seen_ids = seen.seen_contents(learner_id, &content_ids).await?;

            let quiz = match quizzes.quiz_for_module(module.id()).await? {
                Some(quiz) => {
                    let latest = attempts.latest_attempt(quiz.id, learner_id).await?;
                    Some(QuizFacts {
                        quiz_id: quiz.id,
                        question_count: u32::try_from(quiz.questions.len()).unwrap_or(u32::MAX),
                        latest_passed: latest.is_some_and(|a| a.passed),
                    })
                }
                None => None,
            };

            snapshots.push(ModuleSnapshot {
                module,
                contents,
                seen: seen_ids,
                quiz,
            });
        }

        Ok(Self {
            formation_id,
            learner_id,
            loaded_at,
            modules: snapshots,
        })
    }

    /// The module ids in formation order.
    #[must_use]
    pub fn module_order(&self) -> Vec<ModuleId> {
        self.modules.iter().map(|m| m.module.id()).collect()
    }

    /// Per-module facts in formation order.
    #[must_use]
    pub fn facts(&self) -> Vec<ModuleFacts> {
        self.modules.iter().map(ModuleSnapshot::facts).collect()
    }

    /// Derives the learner's formation progress from this snapshot.
    #[must_use]
    pub fn progress(&self) -> FormationProgress {
        FormationProgress::from_facts(self.formation_id, self.learner_id, &self.facts())
    }
}
