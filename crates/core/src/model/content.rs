use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

use crate::model::ids::{ContentId, ModuleId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ContentError {
    #[error("content title cannot be empty")]
    EmptyTitle,

    #[error("content location cannot be empty")]
    EmptyLocation,

    #[error("unknown content kind: {raw}")]
    UnknownKind { raw: String },
}

//
// ─── KIND & LOCATION ───────────────────────────────────────────────────────────
//

/// The media family of a support. The asset itself lives with the excluded
/// storage collaborator; the engine only needs the kind for display and
/// duration accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Pdf,
    Video,
    Text,
}

impl ContentKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Pdf => "pdf",
            ContentKind::Video => "video",
            ContentKind::Text => "text",
        }
    }

    /// Parses a kind label, normalizing the spellings legacy exports carry
    /// ("PDF", "Video", "document", ...).
    ///
    /// # Errors
    ///
    /// Returns `ContentError::UnknownKind` for anything unrecognized.
    pub fn from_label(raw: &str) -> Result<Self, ContentError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pdf" | "document" => Ok(ContentKind::Pdf),
            "video" => Ok(ContentKind::Video),
            "text" | "texte" => Ok(ContentKind::Text),
            _ => Err(ContentError::UnknownKind {
                raw: raw.to_owned(),
            }),
        }
    }
}

/// Where the asset lives: an absolute URL into the media host, or a file
/// path for locally staged material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentLocation {
    FilePath(PathBuf),
    Url(Url),
}

impl ContentLocation {
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ContentError> {
        let p = path.into();
        if p.as_os_str().is_empty() {
            return Err(ContentError::EmptyLocation);
        }
        Ok(ContentLocation::FilePath(p))
    }

    pub fn from_url(url: impl AsRef<str>) -> Result<Self, ContentError> {
        let s = url.as_ref().trim();
        if s.is_empty() {
            return Err(ContentError::EmptyLocation);
        }
        let u = Url::parse(s).map_err(|_| ContentError::EmptyLocation)?;
        Ok(ContentLocation::Url(u))
    }

    /// Parses a raw location string: anything that parses as an absolute URL
    /// becomes `Url`, everything else is treated as a file path.
    pub fn parse(raw: &str) -> Result<Self, ContentError> {
        let s = raw.trim();
        if s.is_empty() {
            return Err(ContentError::EmptyLocation);
        }
        match Url::parse(s) {
            Ok(u) => Ok(ContentLocation::Url(u)),
            Err(_) => Ok(ContentLocation::FilePath(PathBuf::from(s))),
        }
    }

    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            ContentLocation::FilePath(p) => Some(p.as_path()),
            ContentLocation::Url(_) => None,
        }
    }

    #[must_use]
    pub fn as_url(&self) -> Option<&Url> {
        match self {
            ContentLocation::Url(u) => Some(u),
            ContentLocation::FilePath(_) => None,
        }
    }
}

impl std::fmt::Display for ContentLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentLocation::FilePath(p) => write!(f, "{}", p.display()),
            ContentLocation::Url(u) => write!(f, "{u}"),
        }
    }
}

//
// ─── CONTENT ───────────────────────────────────────────────────────────────────
//

/// A single learning asset (a "support") inside a module.
///
/// Content never stores seen-state; that is a (content, learner) fact owned
/// by the seen repository.
#[derive(Debug, Clone, PartialEq)]
pub struct Content {
    id: ContentId,
    module_id: ModuleId,
    kind: ContentKind,
    title: String,
    duration_minutes: u32,
    location: ContentLocation,
    created_at: DateTime<Utc>,
}

impl Content {
    /// Creates a new Content item. The title is trimmed.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::EmptyTitle` if the title is empty or
    /// whitespace-only.
    pub fn new(
        id: ContentId,
        module_id: ModuleId,
        kind: ContentKind,
        title: impl Into<String>,
        duration_minutes: u32,
        location: ContentLocation,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ContentError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(ContentError::EmptyTitle);
        }

        Ok(Self {
            id,
            module_id,
            kind,
            title: title.trim().to_owned(),
            duration_minutes,
            location,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> ContentId {
        self.id
    }

    #[must_use]
    pub fn module_id(&self) -> ModuleId {
        self.module_id
    }

    #[must_use]
    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    #[must_use]
    pub fn location(&self) -> &ContentLocation {
        &self.location
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
    fn kind_label_normalizes_legacy_spellings() {
        assert_eq!(ContentKind::from_label("PDF").unwrap(), ContentKind::Pdf);
        assert_eq!(
            ContentKind::from_label("document").unwrap(),
            ContentKind::Pdf
        );
        assert_eq!(
            ContentKind::from_label(" Video ").unwrap(),
            ContentKind::Video
        );
        assert_eq!(ContentKind::from_label("texte").unwrap(), ContentKind::Text);
        assert!(matches!(
            ContentKind::from_label("slideshow"),
            Err(ContentError::UnknownKind { .. })
        ));
    }

    #[test]
    fn location_parse_prefers_url() {
        let url = ContentLocation::parse("https://media.example/intro.mp4").unwrap();
        assert!(url.as_url().is_some());

        let path = ContentLocation::parse("staging/intro.pdf").unwrap();
        assert_eq!(path.as_path().unwrap(), Path::new("staging/intro.pdf"));

        assert_eq!(
            ContentLocation::parse("  ").unwrap_err(),
            ContentError::EmptyLocation
        );
    }

    #[test]
    fn content_new_rejects_empty_title() {
        let err = Content::new(
            ContentId::new(1),
            ModuleId::new(1),
            ContentKind::Text,
            "",
            5,
            ContentLocation::from_file("notes.md").unwrap(),
            fixed_now(),
        )
        .unwrap_err();
        assert_eq!(err, ContentError::EmptyTitle);
    }

    #[test]
    fn content_new_happy_path() {
        let content = Content::new(
            ContentId::new(7),
            ModuleId::new(2),
            ContentKind::Video,
            "  Ladder handling  ",
            12,
            ContentLocation::from_url("https://media.example/ladders.mp4").unwrap(),
            fixed_now(),
        )
        .unwrap();

        assert_eq!(content.title(), "Ladder handling");
        assert_eq!(content.kind(), ContentKind::Video);
        assert_eq!(content.duration_minutes(), 12);
    }
}
