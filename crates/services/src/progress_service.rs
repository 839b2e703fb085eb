use std::sync::Arc;

use formation_core::model::{ContentId, FormationId, LearnerId, ModuleId};
use formation_core::progression::{FormationProgress, is_module_unlocked};
use storage::repository::{
    AttemptRepository, FormationRepository, ModuleRepository, QuizRepository, SeenRepository,
    Storage,
};

use crate::Clock;
use crate::error::ProgressServiceError;
use crate::snapshot::FormationSnapshot;

/// Orchestrates seen-tracking, progress reporting, and module gating.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    formations: Arc<dyn FormationRepository>,
    modules: Arc<dyn ModuleRepository>,
    quizzes: Arc<dyn QuizRepository>,
    seen: Arc<dyn SeenRepository>,
    attempts: Arc<dyn AttemptRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, storage: &Storage) -> Self {
        Self {
            clock,
            formations: storage.formations.clone(),
            modules: storage.modules.clone(),
            quizzes: storage.quizzes.clone(),
            seen: storage.seen.clone(),
            attempts: storage.attempts.clone(),
        }
    }

    /// Records that the learner consumed a content item. Idempotent:
    /// re-marking is a no-op and the first-seen timestamp is kept.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::Storage` if persistence fails.
    pub async fn mark_content_seen(
        &self,
        content_id: ContentId,
        learner_id: LearnerId,
    ) -> Result<(), ProgressServiceError> {
        self.seen
            .mark_seen(content_id, learner_id, self.clock.now())
            .await?;
        Ok(())
    }

    /// Loads one consistent snapshot of the formation for the learner.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::UnknownFormation` if the formation does
    /// not exist, `ProgressServiceError::Storage` for read failures.
    pub async fn snapshot(
        &self,
        formation_id: FormationId,
        learner_id: LearnerId,
    ) -> Result<FormationSnapshot, ProgressServiceError> {
        if self.formations.get_formation(formation_id).await?.is_none() {
            return Err(ProgressServiceError::UnknownFormation(formation_id.value()));
        }
        let snapshot = FormationSnapshot::load(
            formation_id,
            learner_id,
            self.clock.now(),
            self.modules.as_ref(),
            self.quizzes.as_ref(),
            self.seen.as_ref(),
            self.attempts.as_ref(),
        )
        .await?;
        Ok(snapshot)
    }

    /// The learner's derived progress over the formation, computed from a
    /// fresh snapshot. Nothing persisted; calling this twice without
    /// intervening writes yields the same value.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::UnknownFormation` if the formation does
    /// not exist, `ProgressServiceError::Storage` for read failures.
    pub async fn formation_progress(
        &self,
        formation_id: FormationId,
        learner_id: LearnerId,
    ) -> Result<FormationProgress, ProgressServiceError> {
        Ok(self.snapshot(formation_id, learner_id).await?.progress())
    }

    /// Whether the learner may enter the module. Never errors: any failure
    /// to load the snapshot locks the module and is logged, so an outage
    /// can't open a gate.
    pub async fn is_module_unlocked(
        &self,
        formation_id: FormationId,
        module_id: ModuleId,
        learner_id: LearnerId,
    ) -> bool {
        match self.snapshot(formation_id, learner_id).await {
            Ok(snapshot) => {
                let progress = snapshot.progress();
                is_module_unlocked(module_id, &snapshot.module_order(), Some(&progress))
            }
            Err(err) => {
                tracing::warn!(
                    formation = %formation_id,
                    module = %module_id,
                    error = %err,
                    "gate check failed, locking module"
                );
                false
            }
        }
    }

    /// Certificate eligibility: exactly formation completion.
    ///
    /// # Errors
    ///
    /// Returns `ProgressServiceError::UnknownFormation` if the formation does
    /// not exist, `ProgressServiceError::Storage` for read failures.
    pub async fn certificate_eligible(
        &self,
        formation_id: FormationId,
        learner_id: LearnerId,
    ) -> Result<bool, ProgressServiceError> {
        let progress = self.formation_progress(formation_id, learner_id).await?;
        Ok(progress.certificate_eligible())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use formation_core::model::{ContentKind, ContentLocation};
    use formation_core::time::fixed_now;
    use storage::repository::{NewContentRecord, NewFormationRecord, NewModuleRecord};

    async fn seed(storage: &Storage) -> (FormationId, ModuleId, ModuleId, ContentId) {
        let formation_id = storage
            .formations
            .insert_new_formation(NewFormationRecord {
                title: "Safety".into(),
                description: None,
                kind: None,
                duration_minutes: 60,
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        let m1 = storage
            .modules
            .insert_new_module(NewModuleRecord {
                formation_id,
                title: "Basics".into(),
                description: None,
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        let m2 = storage
            .modules
            .insert_new_module(NewModuleRecord {
                formation_id,
                title: "Advanced".into(),
                description: None,
                created_at: fixed_now(),
            })
            .await
            .unwrap();
        let content = storage
            .modules
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
        (formation_id, m1, m2, content)
    }

    #[tokio::test]
    async fn progress_reflects_seen_contents() {
        let storage = Storage::in_memory();
        let (formation_id, m1, _, content) = seed(&storage).await;
        let learner = LearnerId::new(1);
        let service = ProgressService::new(Clock::Fixed(fixed_now()), &storage);

        let before = service
            .formation_progress(formation_id, learner)
            .await
            .unwrap();
        assert_eq!(before.completed_modules, 1); // m2 has no content, no quiz
        assert!(!before.is_module_completed(m1));

        service.mark_content_seen(content, learner).await.unwrap();
        let after = service
            .formation_progress(formation_id, learner)
            .await
            .unwrap();
        assert!(after.is_module_completed(m1));
        assert!(after.completed);
    }

    #[tokio::test]
    async fn second_module_stays_locked_until_first_completes() {
        let storage = Storage::in_memory();
        let (formation_id, m1, m2, content) = seed(&storage).await;
        let learner = LearnerId::new(1);
        let service = ProgressService::new(Clock::Fixed(fixed_now()), &storage);

        assert!(service.is_module_unlocked(formation_id, m1, learner).await);
        assert!(!service.is_module_unlocked(formation_id, m2, learner).await);

        service.mark_content_seen(content, learner).await.unwrap();
        assert!(service.is_module_unlocked(formation_id, m2, learner).await);
    }

    #[tokio::test]
    async fn unknown_formation_is_reported_and_locks_gates() {
        let storage = Storage::in_memory();
        let learner = LearnerId::new(1);
        let service = ProgressService::new(Clock::Fixed(fixed_now()), &storage);
        let missing = FormationId::new(999);

        let err = service
            .formation_progress(missing, learner)
            .await
            .unwrap_err();
        assert!(matches!(err, ProgressServiceError::UnknownFormation(999)));

        // gate never errors, it fails closed
        assert!(
            !service
                .is_module_unlocked(missing, ModuleId::new(1), learner)
                .await
        );
    }

    #[tokio::test]
    async fn certificate_follows_completion() {
        let storage = Storage::in_memory();
        let (formation_id, _, _, content) = seed(&storage).await;
        let learner = LearnerId::new(1);
        let service = ProgressService::new(Clock::Fixed(fixed_now()), &storage);

        assert!(
            !service
                .certificate_eligible(formation_id, learner)
                .await
                .unwrap()
        );
        service.mark_content_seen(content, learner).await.unwrap();
        assert!(
            service
                .certificate_eligible(formation_id, learner)
                .await
                .unwrap()
        );
    }
}
