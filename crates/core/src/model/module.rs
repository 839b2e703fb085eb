use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::{FormationId, ModuleId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModuleError {
    #[error("module title cannot be empty")]
    EmptyTitle,
}

//
// ─── MODULE ────────────────────────────────────────────────────────────────────
//

/// One unit of a formation: an ordered set of content items plus at most one
/// quiz. The position of a module inside its formation is owned by the
/// formation's module list, never by the module itself.
///
/// A module with zero content items and no quiz is vacuously complete for
/// every learner.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    id: ModuleId,
    formation_id: FormationId,
    title: String,
    description: Option<String>,
    created_at: DateTime<Utc>,
}

impl Module {
    /// Creates a new Module. Title and description are trimmed; a blank
    /// description collapses to `None`.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::EmptyTitle` if the title is empty or
    /// whitespace-only.
    pub fn new(
        id: ModuleId,
        formation_id: FormationId,
        title: impl Into<String>,
        description: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ModuleError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ModuleError::EmptyTitle);
        }

        let description = description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());

        Ok(Self {
            id,
            formation_id,
            title: title.trim().to_owned(),
            description,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> ModuleId {
        self.id
    }

    #[must_use]
    pub fn formation_id(&self) -> FormationId {
        self.formation_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn module_new_rejects_empty_title() {
        let err = Module::new(
            ModuleId::new(1),
            FormationId::new(1),
            "\t ",
            None,
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, ModuleError::EmptyTitle);
    }

    #[test]
    fn module_trims_fields() {
        let module = Module::new(
            ModuleId::new(3),
            FormationId::new(1),
            "  Fire Safety  ",
            Some("  ".into()),
            fixed_now(),
        )
        .unwrap();

        assert_eq!(module.title(), "Fire Safety");
        assert_eq!(module.description(), None);
        assert_eq!(module.formation_id(), FormationId::new(1));
    }
}
