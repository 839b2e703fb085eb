//! JSON formation import.
//!
//! Ingests a formation export and normalizes it into the canonical model in
//! one step at the boundary. Legacy backends spell fields several ways
//! (`lien`/`url` for locations, camelCase variants, French labels); serde
//! aliases absorb all of them here so nothing downstream ever sees the
//! variants.

use chrono::{DateTime, Utc};
use formation_core::model::{
    ChoiceDraft, ContentError, ContentKind, ContentLocation, FormationId, QuestionDraft, QuizDraft,
    QuizError,
};
use serde::Deserialize;
use thiserror::Error;

use crate::repository::{
    NewContentRecord, NewFormationRecord, NewModuleRecord, Storage, StorageError,
};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImportError {
    #[error("invalid import document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("formation title cannot be empty")]
    EmptyFormationTitle,

    #[error("module title cannot be empty")]
    EmptyModuleTitle,

    #[error(transparent)]
    Content(#[from] ContentError),

    #[error(transparent)]
    Quiz(#[from] QuizError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

//
// ─── WIRE SHAPES ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Deserialize)]
pub struct FormationImport {
    #[serde(alias = "titre")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "type")]
    pub kind: Option<String>,
    #[serde(default, alias = "duree", alias = "durationMinutes")]
    pub duration_minutes: u32,
    #[serde(default)]
    pub modules: Vec<ModuleImport>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleImport {
    #[serde(alias = "titre")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "supports")]
    pub contents: Vec<ContentImport>,
    #[serde(default)]
    pub quiz: Option<QuizImport>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentImport {
    #[serde(alias = "titre")]
    pub title: String,
    #[serde(rename = "type", alias = "kind")]
    pub kind: String,
    #[serde(alias = "lien", alias = "url")]
    pub location: String,
    #[serde(default, alias = "duree", alias = "durationMinutes")]
    pub duration_minutes: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuizImport {
    #[serde(alias = "titre")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(alias = "passThreshold", alias = "seuil")]
    pub pass_threshold: u32,
    #[serde(default)]
    pub questions: Vec<QuestionImport>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionImport {
    #[serde(alias = "texte")]
    pub text: String,
    #[serde(default, alias = "reponses")]
    pub choices: Vec<ChoiceImport>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceImport {
    #[serde(alias = "texte")]
    pub text: String,
    #[serde(alias = "isCorrect", alias = "correct")]
    pub is_correct: bool,
}

/// Parses an export document without persisting anything.
///
/// # Errors
///
/// Returns `ImportError::Parse` if the JSON is malformed.
pub fn parse_formation(json: &str) -> Result<FormationImport, ImportError> {
    Ok(serde_json::from_str(json)?)
}

/// Imports a formation export into storage: the formation, its modules in
/// document order, their contents, and each module's quiz (validated through
/// the authoring drafts). Returns the new formation id.
///
/// # Errors
///
/// Returns `ImportError` for malformed JSON, validation failures, or storage
/// failures. Nothing is rolled back on a partial failure; importing into a
/// fresh database is the supported use.
pub async fn import_formation(
    storage: &Storage,
    json: &str,
    now: DateTime<Utc>,
) -> Result<FormationId, ImportError> {
    let doc = parse_formation(json)?;

    if doc.title.trim().is_empty() {
        return Err(ImportError::EmptyFormationTitle);
    }

    let formation_id = storage
        .formations
        .insert_new_formation(NewFormationRecord {
            title: doc.title.trim().to_owned(),
            description: doc.description,
            kind: doc.kind,
            duration_minutes: doc.duration_minutes,
            created_at: now,
        })
        .await?;

    tracing::info!(formation = %formation_id, modules = doc.modules.len(), "importing formation");

    for module in doc.modules {
        if module.title.trim().is_empty() {
            return Err(ImportError::EmptyModuleTitle);
        }
        let module_id = storage
            .modules
            .insert_new_module(NewModuleRecord {
                formation_id,
                title: module.title.trim().to_owned(),
                description: module.description,
                created_at: now,
            })
            .await?;

        for content in module.contents {
            storage
                .modules
                .insert_new_content(NewContentRecord {
                    module_id,
                    kind: ContentKind::from_label(&content.kind)?,
                    title: content.title,
                    duration_minutes: content.duration_minutes,
                    location: ContentLocation::parse(&content.location)?,
                    created_at: now,
                })
                .await?;
        }

        if let Some(quiz) = module.quiz {
            let draft = QuizDraft {
                module_id,
                title: quiz.title,
                description: quiz.description,
                pass_threshold: quiz.pass_threshold,
                questions: quiz
                    .questions
                    .into_iter()
                    .map(|q| {
                        QuestionDraft::new(
                            q.text,
                            q.choices
                                .into_iter()
                                .map(|c| ChoiceDraft::new(c.text, c.is_correct))
                                .collect(),
                        )
                    })
                    .collect(),
            };
            storage.quizzes.insert_quiz(draft.validate()?, now).await?;
        }
    }

    Ok(formation_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use formation_core::time::fixed_now;

    const LEGACY_EXPORT: &str = r#"{
        "titre": "Securite Incendie",
        "type": "interne",
        "duree": 90,
        "modules": [
            {
                "titre": "Les bases",
                "supports": [
                    { "titre": "Intro", "type": "PDF", "lien": "https://media.example/intro.pdf", "duree": 10 },
                    { "titre": "Demo", "type": "video", "url": "https://media.example/demo.mp4" }
                ],
                "quiz": {
                    "titre": "Controle",
                    "seuil": 70,
                    "questions": [
                        {
                            "texte": "Que faire en premier ?",
                            "reponses": [
                                { "texte": "Alerter", "correct": true },
                                { "texte": "Courir", "correct": false }
                            ]
                        }
                    ]
                }
            }
        ]
    }"#;

    #[test]
    fn parse_accepts_legacy_field_spellings() {
        let doc = parse_formation(LEGACY_EXPORT).unwrap();
        assert_eq!(doc.title, "Securite Incendie");
        assert_eq!(doc.duration_minutes, 90);
        assert_eq!(doc.modules.len(), 1);

        let module = &doc.modules[0];
        assert_eq!(module.contents.len(), 2);
        assert_eq!(module.contents[0].location, "https://media.example/intro.pdf");
        assert_eq!(module.contents[1].location, "https://media.example/demo.mp4");

        let quiz = module.quiz.as_ref().unwrap();
        assert_eq!(quiz.pass_threshold, 70);
        assert!(quiz.questions[0].choices[0].is_correct);
    }

    #[tokio::test]
    async fn import_normalizes_into_canonical_model() {
        let storage = Storage::in_memory();
        let formation_id = import_formation(&storage, LEGACY_EXPORT, fixed_now())
            .await
            .unwrap();

        let modules = storage.modules.list_modules(formation_id).await.unwrap();
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].title(), "Les bases");

        let contents = storage.modules.list_contents(modules[0].id()).await.unwrap();
        assert_eq!(contents.len(), 2);
        assert_eq!(contents[0].kind(), ContentKind::Pdf);
        assert_eq!(contents[1].kind(), ContentKind::Video);
        assert!(contents[1].location().as_url().is_some());

        let quiz = storage
            .quizzes
            .quiz_for_module(modules[0].id())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(quiz.pass_threshold.value(), 70);
        assert_eq!(quiz.questions.len(), 1);
    }

    #[tokio::test]
    async fn import_rejects_unknown_content_kind() {
        let storage = Storage::in_memory();
        let json = r#"{
            "title": "F",
            "modules": [
                { "title": "M", "supports": [
                    { "title": "S", "type": "slideshow", "lien": "x.pdf" }
                ] }
            ]
        }"#;
        let err = import_formation(&storage, json, fixed_now()).await.unwrap_err();
        assert!(matches!(
            err,
            ImportError::Content(ContentError::UnknownKind { .. })
        ));
    }

    #[tokio::test]
    async fn import_rejects_malformed_quiz() {
        let storage = Storage::in_memory();
        let json = r#"{
            "title": "F",
            "modules": [
                { "title": "M", "quiz": {
                    "title": "Q", "passThreshold": 50,
                    "questions": [
                        { "text": "?", "choices": [
                            { "text": "a", "isCorrect": true },
                            { "text": "b", "isCorrect": true }
                        ] }
                    ]
                } }
            ]
        }"#;
        let err = import_formation(&storage, json, fixed_now()).await.unwrap_err();
        assert!(matches!(
            err,
            ImportError::Quiz(QuizError::WrongCorrectCount { found: 2 })
        ));
    }
}
