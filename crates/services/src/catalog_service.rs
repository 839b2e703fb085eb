use std::sync::Arc;

use formation_core::model::{
    ChoiceId, ContentId, ContentKind, ContentLocation, Formation, FormationError, FormationId,
    Module, ModuleError, ModuleId, QuestionId, QuizDraft, QuizId,
};
use formation_core::reorder::validate_reorder;
use storage::repository::{
    FormationRepository, ModuleRepository, NewContentRecord, NewFormationRecord, NewModuleRecord,
    QuizRepository, Storage,
};

use crate::Clock;
use crate::error::CatalogServiceError;

/// Orchestrates authoring: formations, modules, contents, quizzes, and the
/// ordering of all of them.
#[derive(Clone)]
pub struct CatalogService {
    clock: Clock,
    formations: Arc<dyn FormationRepository>,
    modules: Arc<dyn ModuleRepository>,
    quizzes: Arc<dyn QuizRepository>,
}

impl CatalogService {
    #[must_use]
    pub fn new(clock: Clock, storage: &Storage) -> Self {
        Self {
            clock,
            formations: storage.formations.clone(),
            modules: storage.modules.clone(),
            quizzes: storage.quizzes.clone(),
        }
    }

    /// Creates a formation and returns its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Formation` for an empty title and
    /// `CatalogServiceError::Storage` if persistence fails.
    pub async fn create_formation(
        &self,
        title: &str,
        description: Option<String>,
        kind: Option<String>,
        duration_minutes: u32,
    ) -> Result<FormationId, CatalogServiceError> {
        if title.trim().is_empty() {
            return Err(FormationError::EmptyTitle.into());
        }
        let id = self
            .formations
            .insert_new_formation(NewFormationRecord {
                title: title.trim().to_owned(),
                description,
                kind,
                duration_minutes,
                created_at: self.clock.now(),
            })
            .await?;
        Ok(id)
    }

    /// Creates a module appended at the end of the formation's order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Module` for an empty title and
    /// `CatalogServiceError::Storage` if the formation is unknown or
    /// persistence fails.
    pub async fn create_module(
        &self,
        formation_id: FormationId,
        title: &str,
        description: Option<String>,
    ) -> Result<ModuleId, CatalogServiceError> {
        if title.trim().is_empty() {
            return Err(ModuleError::EmptyTitle.into());
        }
        let id = self
            .modules
            .insert_new_module(NewModuleRecord {
                formation_id,
                title: title.trim().to_owned(),
                description,
                created_at: self.clock.now(),
            })
            .await?;
        Ok(id)
    }

    /// Adds a content item at the end of the module's order. The location is
    /// parsed as a URL first, falling back to a file path.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Content` for invalid kind labels or
    /// locations and `CatalogServiceError::Storage` if persistence fails.
    pub async fn add_content(
        &self,
        module_id: ModuleId,
        kind: ContentKind,
        title: &str,
        duration_minutes: u32,
        location: &str,
    ) -> Result<ContentId, CatalogServiceError> {
        let id = self
            .modules
            .insert_new_content(NewContentRecord {
                module_id,
                kind,
                title: title.to_owned(),
                duration_minutes,
                location: ContentLocation::parse(location)?,
                created_at: self.clock.now(),
            })
            .await?;
        Ok(id)
    }

    /// Validates and persists a quiz draft, assigning ids throughout.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Quiz` for draft validation failures and
    /// `CatalogServiceError::Storage` if the module is unknown or persistence
    /// fails.
    pub async fn author_quiz(&self, draft: QuizDraft) -> Result<QuizId, CatalogServiceError> {
        let validated = draft.validate()?;
        let id = self.quizzes.insert_quiz(validated, self.clock.now()).await?;
        Ok(id)
    }

    /// Fetch a formation by id; `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Storage` for read failures.
    pub async fn get_formation(
        &self,
        id: FormationId,
    ) -> Result<Option<Formation>, CatalogServiceError> {
        let formation = self.formations.get_formation(id).await?;
        Ok(formation)
    }

    /// List formations ordered by id, up to the given limit.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Storage` for read failures.
    pub async fn list_formations(&self, limit: u32) -> Result<Vec<Formation>, CatalogServiceError> {
        let formations = self.formations.list_formations(limit).await?;
        Ok(formations)
    }

    /// The ordered module list for a formation.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Storage` for read failures.
    pub async fn list_modules(
        &self,
        formation_id: FormationId,
    ) -> Result<Vec<Module>, CatalogServiceError> {
        let modules = self.modules.list_modules(formation_id).await?;
        Ok(modules)
    }

    /// Reorders a formation's modules from raw id strings, as submitted by
    /// an editing surface. Validation runs before any storage access:
    /// an empty list, a duplicate, or an unparseable id rejects the request
    /// outright. Storage then enforces that the list covers exactly the
    /// formation's modules.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Reorder` for structurally invalid input,
    /// `CatalogServiceError::Storage` with `NotFound` for ids unknown to the
    /// formation and `Conflict` for an incomplete list.
    pub async fn reorder_modules(
        &self,
        formation_id: FormationId,
        raw_ids: &[String],
    ) -> Result<(), CatalogServiceError> {
        let order: Vec<ModuleId> = validate_reorder(raw_ids)?;
        self.modules.reorder_modules(formation_id, &order).await?;
        Ok(())
    }

    /// Reorders a quiz's questions from raw id strings. Same validation
    /// pipeline as module reordering.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Reorder` for structurally invalid input
    /// and `CatalogServiceError::Storage` for unknown or incomplete lists.
    pub async fn reorder_questions(
        &self,
        quiz_id: QuizId,
        raw_ids: &[String],
    ) -> Result<(), CatalogServiceError> {
        let order: Vec<QuestionId> = validate_reorder(raw_ids)?;
        self.quizzes.reorder_questions(quiz_id, &order).await?;
        Ok(())
    }

    /// Reorders a question's choices from raw id strings.
    ///
    /// # Errors
    ///
    /// Returns `CatalogServiceError::Reorder` for structurally invalid input
    /// and `CatalogServiceError::Storage` for unknown or incomplete lists.
    pub async fn reorder_choices(
        &self,
        question_id: QuestionId,
        raw_ids: &[String],
    ) -> Result<(), CatalogServiceError> {
        let order: Vec<ChoiceId> = validate_reorder(raw_ids)?;
        self.quizzes.reorder_choices(question_id, &order).await?;
        Ok(())
    }
}
