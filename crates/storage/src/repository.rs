use async_trait::async_trait;
use chrono::{DateTime, Utc};
use formation_core::grader::GradedQuiz;
use formation_core::model::{
    Choice, ChoiceId, Content, ContentId, ContentKind, ContentLocation, Formation, FormationId,
    LearnerId, Module, ModuleId, Question, QuestionId, Quiz, QuizId, ValidatedQuiz,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── RECORD TYPES ──────────────────────────────────────────────────────────────
//

/// Insert shape for a formation whose id the repository assigns.
#[derive(Debug, Clone)]
pub struct NewFormationRecord {
    pub title: String,
    pub description: Option<String>,
    pub kind: Option<String>,
    pub duration_minutes: u32,
    pub created_at: DateTime<Utc>,
}

impl NewFormationRecord {
    #[must_use]
    pub fn from_formation(formation: &Formation) -> Self {
        Self {
            title: formation.title().to_owned(),
            description: formation.description().map(str::to_owned),
            kind: formation.kind().map(str::to_owned),
            duration_minutes: formation.duration_minutes(),
            created_at: formation.created_at(),
        }
    }
}

/// Insert shape for a module; the repository assigns the id and appends the
/// module at the end of its formation's order.
#[derive(Debug, Clone)]
pub struct NewModuleRecord {
    pub formation_id: FormationId,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewModuleRecord {
    #[must_use]
    pub fn from_module(module: &Module) -> Self {
        Self {
            formation_id: module.formation_id(),
            title: module.title().to_owned(),
            description: module.description().map(str::to_owned),
            created_at: module.created_at(),
        }
    }
}

/// Insert shape for a content item, appended at the end of its module's
/// content order.
#[derive(Debug, Clone)]
pub struct NewContentRecord {
    pub module_id: ModuleId,
    pub kind: ContentKind,
    pub title: String,
    pub duration_minutes: u32,
    pub location: ContentLocation,
    pub created_at: DateTime<Utc>,
}

impl NewContentRecord {
    #[must_use]
    pub fn from_content(content: &Content) -> Self {
        Self {
            module_id: content.module_id(),
            kind: content.kind(),
            title: content.title().to_owned(),
            duration_minutes: content.duration_minutes(),
            location: content.location().clone(),
            created_at: content.created_at(),
        }
    }
}

/// Persisted shape of a graded quiz attempt. Append-only: the history of a
/// learner's attempts stays auditable, completion follows the latest one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedAttemptRecord {
    /// Assigned by the repository on append.
    pub id: Option<i64>,
    pub quiz_id: QuizId,
    pub learner_id: LearnerId,
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u8,
    pub passed: bool,
    pub submitted_at: DateTime<Utc>,
}

impl GradedAttemptRecord {
    #[must_use]
    pub fn from_graded(
        graded: &GradedQuiz,
        learner_id: LearnerId,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            quiz_id: graded.quiz_id,
            learner_id,
            score: graded.score,
            total_questions: graded.total_questions,
            percentage: graded.percentage,
            passed: graded.passed,
            submitted_at,
        }
    }
}

//
// ─── REPOSITORY CONTRACTS ──────────────────────────────────────────────────────
//

/// Repository contract for formations.
#[async_trait]
pub trait FormationRepository: Send + Sync {
    /// Insert a new formation and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the formation cannot be stored.
    async fn insert_new_formation(
        &self,
        formation: NewFormationRecord,
    ) -> Result<FormationId, StorageError>;

    /// Fetch a formation by id; `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for storage failures.
    async fn get_formation(&self, id: FormationId) -> Result<Option<Formation>, StorageError>;

    /// List formations ordered by id, up to the given limit.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for storage failures.
    async fn list_formations(&self, limit: u32) -> Result<Vec<Formation>, StorageError>;

    /// Update an existing formation's metadata.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the formation does not exist.
    async fn update_formation(&self, formation: &Formation) -> Result<(), StorageError>;
}

/// Repository contract for modules and their content items. The ordered
/// module list per formation (and content list per module) is the
/// authoritative sequence the gate runs over.
#[async_trait]
pub trait ModuleRepository: Send + Sync {
    /// Insert a new module, appended at the end of its formation's order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the formation does not exist.
    async fn insert_new_module(&self, module: NewModuleRecord) -> Result<ModuleId, StorageError>;

    /// Fetch a module by id; `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for storage failures.
    async fn get_module(&self, id: ModuleId) -> Result<Option<Module>, StorageError>;

    /// The ordered module list for a formation.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for storage failures.
    async fn list_modules(&self, formation_id: FormationId) -> Result<Vec<Module>, StorageError>;

    /// Rewrite the formation's module order to exactly `order`, atomically.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if an id is unknown to the formation
    /// and `StorageError::Conflict` if the list does not cover every module.
    async fn reorder_modules(
        &self,
        formation_id: FormationId,
        order: &[ModuleId],
    ) -> Result<(), StorageError>;

    /// Insert a content item, appended at the end of its module's order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the module does not exist.
    async fn insert_new_content(
        &self,
        content: NewContentRecord,
    ) -> Result<ContentId, StorageError>;

    /// The ordered content list for a module.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for storage failures.
    async fn list_contents(&self, module_id: ModuleId) -> Result<Vec<Content>, StorageError>;
}

/// Repository contract for quizzes with their nested questions and choices.
#[async_trait]
pub trait QuizRepository: Send + Sync {
    /// Persist a validated quiz, assigning ids to it and its questions and
    /// choices. Returns the quiz id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the module does not exist.
    async fn insert_quiz(
        &self,
        quiz: ValidatedQuiz,
        created_at: DateTime<Utc>,
    ) -> Result<QuizId, StorageError>;

    /// Fetch a quiz with nested questions/choices; `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for storage failures.
    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError>;

    /// The module's active quiz: the first one in position order, or `None`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for storage failures.
    async fn quiz_for_module(&self, module_id: ModuleId) -> Result<Option<Quiz>, StorageError>;

    /// Rewrite a quiz's question order, atomically.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for unknown ids and
    /// `StorageError::Conflict` for an incomplete list.
    async fn reorder_questions(
        &self,
        quiz_id: QuizId,
        order: &[QuestionId],
    ) -> Result<(), StorageError>;

    /// Rewrite a question's choice order, atomically.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for unknown ids and
    /// `StorageError::Conflict` for an incomplete list.
    async fn reorder_choices(
        &self,
        question_id: QuestionId,
        order: &[ChoiceId],
    ) -> Result<(), StorageError>;
}

/// Repository contract for (content, learner) seen facts.
#[async_trait]
pub trait SeenRepository: Send + Sync {
    /// Whether the learner has consumed the content item. An unknown content
    /// id reads as `false`, never as an error, so one stray id can never
    /// block a whole progress computation.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only for storage failures.
    async fn is_seen(
        &self,
        content_id: ContentId,
        learner_id: LearnerId,
    ) -> Result<bool, StorageError>;

    /// Record that the learner consumed the content item. Idempotent:
    /// re-marking is a silent no-op and never overwrites the first-seen
    /// timestamp.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for storage failures.
    async fn mark_seen(
        &self,
        content_id: ContentId,
        learner_id: LearnerId,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Batch read: which of `content_ids` the learner has seen. One call per
    /// progress snapshot instead of one per content item.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for storage failures.
    async fn seen_contents(
        &self,
        learner_id: LearnerId,
        content_ids: &[ContentId],
    ) -> Result<HashSet<ContentId>, StorageError>;
}

/// Repository contract for graded quiz attempts.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Append a graded attempt and return its assigned row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    async fn append_attempt(&self, attempt: GradedAttemptRecord) -> Result<i64, StorageError>;

    /// The learner's most recent graded attempt for the quiz, if any.
    /// "Latest attempt wins" is the completion rule built on this.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for storage failures.
    async fn latest_attempt(
        &self,
        quiz_id: QuizId,
        learner_id: LearnerId,
    ) -> Result<Option<GradedAttemptRecord>, StorageError>;

    /// The learner's full attempt history for the quiz, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` for storage failures.
    async fn attempts_for(
        &self,
        quiz_id: QuizId,
        learner_id: LearnerId,
    ) -> Result<Vec<GradedAttemptRecord>, StorageError>;
}

//
// ─── IN-MEMORY IMPLEMENTATION ──────────────────────────────────────────────────
//

#[derive(Default)]
struct InMemoryState {
    next_id: u64,
    next_attempt_id: i64,
    formations: HashMap<FormationId, Formation>,
    modules: HashMap<ModuleId, Module>,
    module_order: HashMap<FormationId, Vec<ModuleId>>,
    contents: HashMap<ContentId, Content>,
    content_order: HashMap<ModuleId, Vec<ContentId>>,
    quizzes: HashMap<QuizId, Quiz>,
    quiz_order: HashMap<ModuleId, Vec<QuizId>>,
    seen: HashMap<(ContentId, LearnerId), DateTime<Utc>>,
    attempts: Vec<GradedAttemptRecord>,
}

impl InMemoryState {
    fn assign_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// A single lock covers all tables so multi-table operations (reorders, quiz
/// inserts) are atomic, matching the transactional SQLite behavior.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, InMemoryState>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

fn rewrite_order(current: &mut Vec<u64>, submitted: &[u64]) -> Result<(), StorageError> {
    let existing: HashSet<u64> = current.iter().copied().collect();
    let mut seen: HashSet<u64> = HashSet::with_capacity(submitted.len());
    for id in submitted {
        if !existing.contains(id) {
            return Err(StorageError::NotFound);
        }
        // a duplicate means some other id is missing: not a cover
        if !seen.insert(*id) {
            return Err(StorageError::Conflict);
        }
    }
    if submitted.len() != current.len() {
        return Err(StorageError::Conflict);
    }
    *current = submitted.to_vec();
    Ok(())
}

#[async_trait]
impl FormationRepository for InMemoryRepository {
    async fn insert_new_formation(
        &self,
        formation: NewFormationRecord,
    ) -> Result<FormationId, StorageError> {
        let mut state = self.lock()?;
        let id = FormationId::new(state.assign_id());
        let stored = Formation::new(
            id,
            formation.title,
            formation.description,
            formation.kind,
            formation.duration_minutes,
            formation.created_at,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
        state.formations.insert(id, stored);
        state.module_order.insert(id, Vec::new());
        Ok(id)
    }

    async fn get_formation(&self, id: FormationId) -> Result<Option<Formation>, StorageError> {
        Ok(self.lock()?.formations.get(&id).cloned())
    }

    async fn list_formations(&self, limit: u32) -> Result<Vec<Formation>, StorageError> {
        let state = self.lock()?;
        let mut formations: Vec<Formation> = state.formations.values().cloned().collect();
        formations.sort_by_key(Formation::id);
        formations.truncate(limit as usize);
        Ok(formations)
    }

    async fn update_formation(&self, formation: &Formation) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        if !state.formations.contains_key(&formation.id()) {
            return Err(StorageError::NotFound);
        }
        state.formations.insert(formation.id(), formation.clone());
        Ok(())
    }
}

#[async_trait]
impl ModuleRepository for InMemoryRepository {
    async fn insert_new_module(&self, module: NewModuleRecord) -> Result<ModuleId, StorageError> {
        let mut state = self.lock()?;
        if !state.formations.contains_key(&module.formation_id) {
            return Err(StorageError::NotFound);
        }
        let id = ModuleId::new(state.assign_id());
        let stored = Module::new(
            id,
            module.formation_id,
            module.title,
            module.description,
            module.created_at,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
        state.modules.insert(id, stored);
        state
            .module_order
            .entry(module.formation_id)
            .or_default()
            .push(id);
        state.content_order.insert(id, Vec::new());
        Ok(id)
    }

    async fn get_module(&self, id: ModuleId) -> Result<Option<Module>, StorageError> {
        Ok(self.lock()?.modules.get(&id).cloned())
    }

    async fn list_modules(&self, formation_id: FormationId) -> Result<Vec<Module>, StorageError> {
        let state = self.lock()?;
        let order = state.module_order.get(&formation_id);
        Ok(order
            .into_iter()
            .flatten()
            .filter_map(|id| state.modules.get(id).cloned())
            .collect())
    }

    async fn reorder_modules(
        &self,
        formation_id: FormationId,
        order: &[ModuleId],
    ) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        let current = state
            .module_order
            .get_mut(&formation_id)
            .ok_or(StorageError::NotFound)?;
        let mut raw: Vec<u64> = current.iter().map(ModuleId::value).collect();
        let submitted: Vec<u64> = order.iter().map(ModuleId::value).collect();
        rewrite_order(&mut raw, &submitted)?;
        *current = raw.into_iter().map(ModuleId::new).collect();
        Ok(())
    }

    async fn insert_new_content(
        &self,
        content: NewContentRecord,
    ) -> Result<ContentId, StorageError> {
        let mut state = self.lock()?;
        if !state.modules.contains_key(&content.module_id) {
            return Err(StorageError::NotFound);
        }
        let id = ContentId::new(state.assign_id());
        let stored = Content::new(
            id,
            content.module_id,
            content.kind,
            content.title,
            content.duration_minutes,
            content.location,
            content.created_at,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
        state.contents.insert(id, stored);
        state
            .content_order
            .entry(content.module_id)
            .or_default()
            .push(id);
        Ok(id)
    }

    async fn list_contents(&self, module_id: ModuleId) -> Result<Vec<Content>, StorageError> {
        let state = self.lock()?;
        let order = state.content_order.get(&module_id);
        Ok(order
            .into_iter()
            .flatten()
            .filter_map(|id| state.contents.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl QuizRepository for InMemoryRepository {
    async fn insert_quiz(
        &self,
        quiz: ValidatedQuiz,
        created_at: DateTime<Utc>,
    ) -> Result<QuizId, StorageError> {
        let mut state = self.lock()?;
        if !state.modules.contains_key(&quiz.module_id) {
            return Err(StorageError::NotFound);
        }
        let quiz_id = QuizId::new(state.assign_id());

        let mut questions = Vec::with_capacity(quiz.questions.len());
        for question in quiz.questions {
            let question_id = QuestionId::new(state.assign_id());
            let mut choices = Vec::with_capacity(question.choices.len());
            for choice in question.choices {
                choices.push(Choice {
                    id: ChoiceId::new(state.assign_id()),
                    question_id,
                    text: choice.text,
                    is_correct: choice.is_correct,
                });
            }
            questions.push(Question {
                id: question_id,
                quiz_id,
                text: question.text,
                choices,
            });
        }

        let stored = Quiz {
            id: quiz_id,
            module_id: quiz.module_id,
            title: quiz.title,
            description: quiz.description,
            pass_threshold: quiz.pass_threshold,
            questions,
            created_at,
        };
        state.quizzes.insert(quiz_id, stored);
        state
            .quiz_order
            .entry(quiz.module_id)
            .or_default()
            .push(quiz_id);
        Ok(quiz_id)
    }

    async fn get_quiz(&self, id: QuizId) -> Result<Option<Quiz>, StorageError> {
        Ok(self.lock()?.quizzes.get(&id).cloned())
    }

    async fn quiz_for_module(&self, module_id: ModuleId) -> Result<Option<Quiz>, StorageError> {
        let state = self.lock()?;
        Ok(state
            .quiz_order
            .get(&module_id)
            .and_then(|order| order.first())
            .and_then(|id| state.quizzes.get(id).cloned()))
    }

    async fn reorder_questions(
        &self,
        quiz_id: QuizId,
        order: &[QuestionId],
    ) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        let quiz = state
            .quizzes
            .get_mut(&quiz_id)
            .ok_or(StorageError::NotFound)?;
        let mut raw: Vec<u64> = quiz.questions.iter().map(|q| q.id.value()).collect();
        let submitted: Vec<u64> = order.iter().map(QuestionId::value).collect();
        rewrite_order(&mut raw, &submitted)?;
        quiz.questions.sort_by_key(|q| {
            raw.iter()
                .position(|id| *id == q.id.value())
                .unwrap_or(usize::MAX)
        });
        Ok(())
    }

    async fn reorder_choices(
        &self,
        question_id: QuestionId,
        order: &[ChoiceId],
    ) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        let question = state
            .quizzes
            .values_mut()
            .flat_map(|quiz| quiz.questions.iter_mut())
            .find(|q| q.id == question_id)
            .ok_or(StorageError::NotFound)?;
        let mut raw: Vec<u64> = question.choices.iter().map(|c| c.id.value()).collect();
        let submitted: Vec<u64> = order.iter().map(ChoiceId::value).collect();
        rewrite_order(&mut raw, &submitted)?;
        question.choices.sort_by_key(|c| {
            raw.iter()
                .position(|id| *id == c.id.value())
                .unwrap_or(usize::MAX)
        });
        Ok(())
    }
}

#[async_trait]
impl SeenRepository for InMemoryRepository {
    async fn is_seen(
        &self,
        content_id: ContentId,
        learner_id: LearnerId,
    ) -> Result<bool, StorageError> {
        Ok(self.lock()?.seen.contains_key(&(content_id, learner_id)))
    }

    async fn mark_seen(
        &self,
        content_id: ContentId,
        learner_id: LearnerId,
        at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        // first mark wins, re-marking is a no-op
        self.lock()?
            .seen
            .entry((content_id, learner_id))
            .or_insert(at);
        Ok(())
    }

    async fn seen_contents(
        &self,
        learner_id: LearnerId,
        content_ids: &[ContentId],
    ) -> Result<HashSet<ContentId>, StorageError> {
        let state = self.lock()?;
        Ok(content_ids
            .iter()
            .copied()
            .filter(|id| state.seen.contains_key(&(*id, learner_id)))
            .collect())
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn append_attempt(&self, attempt: GradedAttemptRecord) -> Result<i64, StorageError> {
        let mut state = self.lock()?;
        state.next_attempt_id += 1;
        let id = state.next_attempt_id;
        state.attempts.push(GradedAttemptRecord {
            id: Some(id),
            ..attempt
        });
        Ok(id)
    }

    async fn latest_attempt(
        &self,
        quiz_id: QuizId,
        learner_id: LearnerId,
    ) -> Result<Option<GradedAttemptRecord>, StorageError> {
        let state = self.lock()?;
        Ok(state
            .attempts
            .iter()
            .filter(|a| a.quiz_id == quiz_id && a.learner_id == learner_id)
            .max_by_key(|a| (a.submitted_at, a.id))
            .cloned())
    }

    async fn attempts_for(
        &self,
        quiz_id: QuizId,
        learner_id: LearnerId,
    ) -> Result<Vec<GradedAttemptRecord>, StorageError> {
        let state = self.lock()?;
        let mut attempts: Vec<GradedAttemptRecord> = state
            .attempts
            .iter()
            .filter(|a| a.quiz_id == quiz_id && a.learner_id == learner_id)
            .cloned()
            .collect();
        attempts.sort_by_key(|a| (a.submitted_at, a.id));
        Ok(attempts)
    }
}

//
// ─── STORAGE AGGREGATE ─────────────────────────────────────────────────────────
//

/// Aggregates the repositories behind trait objects for easy backend
/// swapping.
#[derive(Clone)]
pub struct Storage {
    pub formations: Arc<dyn FormationRepository>,
    pub modules: Arc<dyn ModuleRepository>,
    pub quizzes: Arc<dyn QuizRepository>,
    pub seen: Arc<dyn SeenRepository>,
    pub attempts: Arc<dyn AttemptRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        Self {
            formations: Arc::new(repo.clone()),
            modules: Arc::new(repo.clone()),
            quizzes: Arc::new(repo.clone()),
            seen: Arc::new(repo.clone()),
            attempts: Arc::new(repo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use formation_core::model::{ChoiceDraft, QuestionDraft, QuizDraft};
    use formation_core::time::fixed_now;

    async fn seed_formation(repo: &InMemoryRepository) -> (FormationId, ModuleId, ModuleId) {
        let formation_id = repo
            .insert_new_formation(NewFormationRecord {
                title: "Safety".into(),
                description: None,
                kind: None,
                duration_minutes: 60,
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        let m1 = repo
            .insert_new_module(NewModuleRecord {
                formation_id,
                title: "Basics".into(),
                description: None,
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        let m2 = repo
            .insert_new_module(NewModuleRecord {
                formation_id,
                title: "Advanced".into(),
                description: None,
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        (formation_id, m1, m2)
    }

    #[tokio::test]
    async fn modules_keep_insertion_order_until_reordered() {
        let repo = InMemoryRepository::new();
        let (formation_id, m1, m2) = seed_formation(&repo).await;

        let listed = repo.list_modules(formation_id).await.unwrap();
        assert_eq!(listed.iter().map(Module::id).collect::<Vec<_>>(), [m1, m2]);

        repo.reorder_modules(formation_id, &[m2, m1]).await.unwrap();
        let listed = repo.list_modules(formation_id).await.unwrap();
        assert_eq!(listed.iter().map(Module::id).collect::<Vec<_>>(), [m2, m1]);
    }

    #[tokio::test]
    async fn reorder_rejects_unknown_and_incomplete_lists() {
        let repo = InMemoryRepository::new();
        let (formation_id, m1, m2) = seed_formation(&repo).await;

        let unknown = repo
            .reorder_modules(formation_id, &[m1, ModuleId::new(999)])
            .await;
        assert!(matches!(unknown, Err(StorageError::NotFound)));

        let incomplete = repo.reorder_modules(formation_id, &[m2]).await;
        assert!(matches!(incomplete, Err(StorageError::Conflict)));

        // same length as the formation, but m1 twice and m2 missing
        let duplicated = repo.reorder_modules(formation_id, &[m1, m1]).await;
        assert!(matches!(duplicated, Err(StorageError::Conflict)));

        // failed reorders leave the order untouched
        let listed = repo.list_modules(formation_id).await.unwrap();
        assert_eq!(listed.iter().map(Module::id).collect::<Vec<_>>(), [m1, m2]);
    }

    #[tokio::test]
    async fn mark_seen_is_idempotent_and_keeps_first_timestamp() {
        let repo = InMemoryRepository::new();
        let (_, m1, _) = seed_formation(&repo).await;
        let content_id = repo
            .insert_new_content(NewContentRecord {
                module_id: m1,
                kind: ContentKind::Text,
                title: "Notes".into(),
                duration_minutes: 5,
                location: ContentLocation::from_file("notes.md").unwrap(),
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        let learner = LearnerId::new(7);

        repo.mark_seen(content_id, learner, fixed_now())
            .await
            .unwrap();
        repo.mark_seen(content_id, learner, fixed_now() + Duration::hours(1))
            .await
            .unwrap();

        assert!(repo.is_seen(content_id, learner).await.unwrap());
        assert_eq!(
            repo.state.lock().unwrap().seen[&(content_id, learner)],
            fixed_now()
        );
    }

    #[tokio::test]
    async fn unknown_content_reads_as_not_seen() {
        let repo = InMemoryRepository::new();
        let seen = repo
            .is_seen(ContentId::new(12345), LearnerId::new(1))
            .await
            .unwrap();
        assert!(!seen);
    }

    #[tokio::test]
    async fn quiz_for_module_returns_first_by_position() {
        let repo = InMemoryRepository::new();
        let (_, m1, _) = seed_formation(&repo).await;

        let draft = |title: &str| QuizDraft {
            module_id: m1,
            title: title.into(),
            description: None,
            pass_threshold: 70,
            questions: vec![QuestionDraft::new(
                "Q",
                vec![ChoiceDraft::new("a", true), ChoiceDraft::new("b", false)],
            )],
        };
        let first = repo
            .insert_quiz(draft("First").validate().unwrap(), fixed_now())
            .await
            .unwrap();
        repo.insert_quiz(draft("Second").validate().unwrap(), fixed_now())
            .await
            .unwrap();

        let active = repo.quiz_for_module(m1).await.unwrap().unwrap();
        assert_eq!(active.id, first);
        assert_eq!(active.title, "First");
    }

    #[tokio::test]
    async fn latest_attempt_wins_over_earlier_ones() {
        let repo = InMemoryRepository::new();
        let quiz_id = QuizId::new(1);
        let learner = LearnerId::new(2);

        let record = |passed: bool, minutes: i64| GradedAttemptRecord {
            id: None,
            quiz_id,
            learner_id: learner,
            score: u32::from(passed),
            total_questions: 1,
            percentage: if passed { 100 } else { 0 },
            passed,
            submitted_at: fixed_now() + Duration::minutes(minutes),
        };

        repo.append_attempt(record(true, 0)).await.unwrap();
        repo.append_attempt(record(false, 10)).await.unwrap();

        let latest = repo.latest_attempt(quiz_id, learner).await.unwrap().unwrap();
        assert!(!latest.passed);

        let history = repo.attempts_for(quiz_id, learner).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history[0].passed);
    }
}
