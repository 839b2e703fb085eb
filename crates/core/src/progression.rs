//! Module gating and progress aggregation.
//!
//! Everything here is pure: the caller fetches one consistent snapshot of
//! facts (seen counts, latest attempt outcomes), derives progress from it,
//! and gates over that immutable value. Missing data always fails closed.

use crate::grader::percent_half_up;
use crate::model::{FormationId, LearnerId, ModuleId};

//
// ─── MODULE FACTS ──────────────────────────────────────────────────────────────
//

/// The quiz dimension of module completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizRequirement {
    /// No quiz, or a quiz with zero questions: vacuously satisfied.
    None,
    /// The module has a gradeable quiz; `passed` reflects the learner's most
    /// recent graded attempt (false when no attempt exists yet).
    Required { passed: bool },
}

/// Per-module input facts, assembled from one snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleFacts {
    pub module_id: ModuleId,
    pub content_total: u32,
    pub content_seen: u32,
    pub quiz: QuizRequirement,
}

impl ModuleFacts {
    #[must_use]
    pub fn content_satisfied(&self) -> bool {
        self.content_seen >= self.content_total
    }

    #[must_use]
    pub fn quiz_satisfied(&self) -> bool {
        match self.quiz {
            QuizRequirement::None => true,
            QuizRequirement::Required { passed } => passed,
        }
    }

    /// Completed iff every content item is seen (vacuous at zero content)
    /// and the quiz requirement is satisfied.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.content_satisfied() && self.quiz_satisfied()
    }

    /// Content-seen ratio as a percentage; an empty module reports 100 by
    /// convention so its content dimension never blocks completion.
    #[must_use]
    pub fn content_percent(&self) -> u8 {
        if self.content_total == 0 {
            100
        } else {
            percent_half_up(self.content_seen.min(self.content_total), self.content_total)
        }
    }
}

//
// ─── DERIVED PROGRESS ──────────────────────────────────────────────────────────
//

/// Derived per-module progress. Never mutated; recomputed from facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleProgress {
    pub module_id: ModuleId,
    pub content_total: u32,
    pub content_seen: u32,
    pub content_percent: u8,
    pub quiz: QuizRequirement,
    pub completed: bool,
}

impl ModuleProgress {
    #[must_use]
    pub fn from_facts(facts: &ModuleFacts) -> Self {
        Self {
            module_id: facts.module_id,
            content_total: facts.content_total,
            content_seen: facts.content_seen,
            content_percent: facts.content_percent(),
            quiz: facts.quiz,
            completed: facts.is_completed(),
        }
    }
}

/// Derived per-formation progress over one snapshot of facts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormationProgress {
    pub formation_id: FormationId,
    pub learner_id: LearnerId,
    /// In formation module order.
    pub modules: Vec<ModuleProgress>,
    pub completed_modules: u32,
    pub total_modules: u32,
    pub percentage: u8,
    pub completed: bool,
}

impl FormationProgress {
    /// Aggregates module facts (given in formation order) into formation
    /// progress.
    ///
    /// The `completed` flag derives strictly from counts: all modules must be
    /// completed. The reported percentage is capped at 99 while anything is
    /// incomplete, so rounding can never show a spurious 100. A formation
    /// with zero modules is vacuously complete.
    #[must_use]
    pub fn from_facts(
        formation_id: FormationId,
        learner_id: LearnerId,
        facts: &[ModuleFacts],
    ) -> Self {
        let modules: Vec<ModuleProgress> = facts.iter().map(ModuleProgress::from_facts).collect();

        let total_modules = u32::try_from(modules.len()).unwrap_or(u32::MAX);
        let completed_modules =
            u32::try_from(modules.iter().filter(|m| m.completed).count()).unwrap_or(u32::MAX);

        let completed = completed_modules >= total_modules;
        let percentage = if total_modules == 0 {
            100
        } else if completed {
            100
        } else {
            percent_half_up(completed_modules, total_modules).min(99)
        };

        Self {
            formation_id,
            learner_id,
            modules,
            completed_modules,
            total_modules,
            percentage,
            completed,
        }
    }

    /// Whether the given module is completed in this snapshot. A module
    /// missing from the progress entries counts as not completed.
    #[must_use]
    pub fn is_module_completed(&self, module_id: ModuleId) -> bool {
        self.modules
            .iter()
            .find(|m| m.module_id == module_id)
            .is_some_and(|m| m.completed)
    }

    /// Certificate eligibility is exactly formation completion.
    #[must_use]
    pub fn certificate_eligible(&self) -> bool {
        self.completed
    }
}

//
// ─── MODULE GATE ───────────────────────────────────────────────────────────────
//

/// Decides whether a module is accessible to the learner.
///
/// The first module is always unlocked. Any later module is unlocked iff
/// every preceding module in `ordered_modules` is completed in `progress`.
/// Fails closed: a module absent from the list, or `progress` of `None`
/// (fetch failed, timed out, was cancelled), locks the module.
#[must_use]
pub fn is_module_unlocked(
    module_id: ModuleId,
    ordered_modules: &[ModuleId],
    progress: Option<&FormationProgress>,
) -> bool {
    let Some(position) = ordered_modules.iter().position(|m| *m == module_id) else {
        return false;
    };
    if position == 0 {
        return true;
    }
    let Some(progress) = progress else {
        return false;
    };
    ordered_modules[..position]
        .iter()
        .all(|m| progress.is_module_completed(*m))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
