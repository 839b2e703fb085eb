use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::ids::FormationId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FormationError {
    #[error("formation title cannot be empty")]
    EmptyTitle,
}

//
// ─── FORMATION ─────────────────────────────────────────────────────────────────
//

/// A course: a titled sequence of modules a learner works through in order.
///
/// The module order itself is an explicit sequence owned by the formation
/// (the repository's module list is the authoritative ordering); `Formation`
/// carries only the course metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Formation {
    id: FormationId,
    title: String,
    description: Option<String>,
    kind: Option<String>,
    duration_minutes: u32,
    created_at: DateTime<Utc>,
}

impl Formation {
    /// Creates a new Formation.
    ///
    /// Title and description are trimmed; blank descriptions and kind labels
    /// collapse to `None`. `duration_minutes` of 0 means "not estimated".
    ///
    /// # Errors
    ///
    /// Returns `FormationError::EmptyTitle` if the title is empty or
    /// whitespace-only.
    pub fn new(
        id: FormationId,
        title: impl Into<String>,
        description: Option<String>,
        kind: Option<String>,
        duration_minutes: u32,
        created_at: DateTime<Utc>,
    ) -> Result<Self, FormationError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(FormationError::EmptyTitle);
        }

        let description = description
            .map(|d| d.trim().to_owned())
            .filter(|d| !d.is_empty());
        let kind = kind.map(|k| k.trim().to_owned()).filter(|k| !k.is_empty());

        Ok(Self {
            id,
            title: title.trim().to_owned(),
            description,
            kind,
            duration_minutes,
            created_at,
        })
    }

    // Accessors
    #[must_use]
    pub fn id(&self) -> FormationId {
        self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Free-form course category label ("interne", "certifiante", ...).
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.kind.as_deref()
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
