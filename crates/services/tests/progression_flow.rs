//! End-to-end learner journey over the in-memory backend: author a
//! formation, consume content, fail then pass the quiz, watch the next
//! module unlock and the certificate become available.

use formation_core::model::{
    ChoiceDraft, Content, ContentKind, FormationId, LearnerId, ModuleId, QuestionDraft, QuizAttempt,
    QuizDraft, QuizId,
};
use formation_core::time::fixed_now;
use services::{CatalogService, Clock, ProgressService, QuizService};
use storage::repository::Storage;

struct Fixture {
    storage: Storage,
    catalog: CatalogService,
    progress: ProgressService,
    quizzes: QuizService,
    formation_id: FormationId,
    basics: ModuleId,
    advanced: ModuleId,
    quiz_id: QuizId,
}

async fn build_fixture() -> Fixture {
    let storage = Storage::in_memory();
    let clock = Clock::Fixed(fixed_now());
    let catalog = CatalogService::new(clock, &storage);
    let progress = ProgressService::new(clock, &storage);
    let quizzes = QuizService::new(clock, &storage);

    let formation_id = catalog
        .create_formation("Workplace Safety", None, Some("interne".into()), 120)
        .await
        .expect("formation");
    let basics = catalog
        .create_module(formation_id, "Basics", None)
        .await
        .expect("basics");
    let advanced = catalog
        .create_module(formation_id, "Advanced", None)
        .await
        .expect("advanced");

    catalog
        .add_content(basics, ContentKind::Pdf, "Handbook", 20, "https://media.example/handbook.pdf")
        .await
        .expect("handbook");
    catalog
        .add_content(basics, ContentKind::Video, "Routes", 8, "https://media.example/routes.mp4")
        .await
        .expect("routes");
    catalog
        .add_content(advanced, ContentKind::Text, "Reporting", 10, "notes/reporting.md")
        .await
        .expect("reporting");

    let quiz_id = catalog
        .author_quiz(QuizDraft {
            module_id: basics,
            title: "Basics check".into(),
            description: None,
            pass_threshold: 70,
            questions: vec![
                QuestionDraft::new(
                    "Q1",
                    vec![ChoiceDraft::new("right", true), ChoiceDraft::new("wrong", false)],
                ),
                QuestionDraft::new(
                    "Q2",
                    vec![ChoiceDraft::new("wrong", false), ChoiceDraft::new("right", true)],
                ),
            ],
        })
        .await
        .expect("quiz");

    Fixture {
        storage,
        catalog,
        progress,
        quizzes,
        formation_id,
        basics,
        advanced,
        quiz_id,
    }
}

async fn contents_of(fx: &Fixture, module_id: ModuleId) -> Vec<Content> {
    fx.storage
        .modules
        .list_contents(module_id)
        .await
        .expect("contents")
}

#[tokio::test]
async fn learner_journey_from_locked_to_certificate() {
    let fx = build_fixture().await;
    let learner = LearnerId::new(1);

    // fresh learner: first module open, second locked, 0% progress
    assert!(
        fx.progress
            .is_module_unlocked(fx.formation_id, fx.basics, learner)
            .await
    );
    assert!(
        !fx.progress
            .is_module_unlocked(fx.formation_id, fx.advanced, learner)
            .await
    );
    let p = fx
        .progress
        .formation_progress(fx.formation_id, learner)
        .await
        .expect("progress");
    assert_eq!(p.percentage, 0);
    assert!(!p.completed);

    // consume all basics content, marking one twice
    for content in contents_of(&fx, fx.basics).await {
        fx.progress
            .mark_content_seen(content.id(), learner)
            .await
            .expect("seen");
    }
    let first = contents_of(&fx, fx.basics).await.remove(0);
    fx.progress
        .mark_content_seen(first.id(), learner)
        .await
        .expect("re-mark");

    // quiz not passed yet: basics incomplete, advanced still locked
    let p = fx
        .progress
        .formation_progress(fx.formation_id, learner)
        .await
        .expect("progress");
    assert!(!p.is_module_completed(fx.basics));
    assert!(
        !fx.progress
            .is_module_unlocked(fx.formation_id, fx.advanced, learner)
            .await
    );

    // fail the quiz: 1/2 is below the 70% threshold
    let quiz = fx
        .quizzes
        .available_quiz(fx.basics)
        .await
        .expect("available")
        .expect("quiz present");
    let mut failing = QuizAttempt::new(fx.quiz_id, learner);
    failing.answer(quiz.questions[0].id, quiz.questions[0].choices[0].id);
    failing.answer(quiz.questions[1].id, quiz.questions[1].choices[0].id);
    let graded = fx.quizzes.submit_attempt(&failing).await.expect("graded");
    assert_eq!(graded.percentage, 50);
    assert!(!graded.passed);
    assert!(
        !fx.progress
            .is_module_unlocked(fx.formation_id, fx.advanced, learner)
            .await
    );

    // pass on the second try: latest attempt wins, advanced unlocks
    let mut passing = QuizAttempt::new(fx.quiz_id, learner);
    passing.answer(quiz.questions[0].id, quiz.questions[0].choices[0].id);
    passing.answer(quiz.questions[1].id, quiz.questions[1].choices[1].id);
    let graded = fx.quizzes.submit_attempt(&passing).await.expect("graded");
    assert!(graded.passed);

    assert!(
        fx.progress
            .is_module_unlocked(fx.formation_id, fx.advanced, learner)
            .await
    );
    let p = fx
        .progress
        .formation_progress(fx.formation_id, learner)
        .await
        .expect("progress");
    assert!(p.is_module_completed(fx.basics));
    assert_eq!(p.completed_modules, 1);
    assert_eq!(p.percentage, 50);
    assert!(
        !fx.progress
            .certificate_eligible(fx.formation_id, learner)
            .await
            .expect("eligible")
    );

    // finish the advanced module's content: formation complete
    for content in contents_of(&fx, fx.advanced).await {
        fx.progress
            .mark_content_seen(content.id(), learner)
            .await
            .expect("seen");
    }
    let p = fx
        .progress
        .formation_progress(fx.formation_id, learner)
        .await
        .expect("progress");
    assert!(p.completed);
    assert_eq!(p.percentage, 100);
    assert!(
        fx.progress
            .certificate_eligible(fx.formation_id, learner)
            .await
            .expect("eligible")
    );

    // both attempts stayed in the history, oldest first
    let history = fx
        .quizzes
        .attempt_history(fx.quiz_id, learner)
        .await
        .expect("history");
    assert_eq!(history.len(), 2);
    assert!(!history[0].passed);
    assert!(history[1].passed);
}

#[tokio::test]
async fn a_later_pass_can_be_revoked_by_a_failing_retake() {
    let fx = build_fixture().await;
    let learner = LearnerId::new(2);

    for content in contents_of(&fx, fx.basics).await {
        fx.progress
            .mark_content_seen(content.id(), learner)
            .await
            .expect("seen");
    }

    let quiz = fx
        .quizzes
        .available_quiz(fx.basics)
        .await
        .expect("available")
        .expect("quiz present");

    let mut passing = QuizAttempt::new(fx.quiz_id, learner);
    passing.answer(quiz.questions[0].id, quiz.questions[0].choices[0].id);
    passing.answer(quiz.questions[1].id, quiz.questions[1].choices[1].id);
    fx.quizzes.submit_attempt(&passing).await.expect("pass");
    assert!(
        fx.progress
            .is_module_unlocked(fx.formation_id, fx.advanced, learner)
            .await
    );

    // a failing retake is now the latest attempt and re-locks the gate
    let failing = QuizAttempt::new(fx.quiz_id, learner);
    let graded = fx.quizzes.submit_attempt(&failing).await.expect("fail");
    assert!(!graded.passed);
    assert!(
        !fx.progress
            .is_module_unlocked(fx.formation_id, fx.advanced, learner)
            .await
    );
}

#[tokio::test]
async fn reordering_modules_moves_the_gate() {
    let fx = build_fixture().await;
    let learner = LearnerId::new(3);

    // advanced first: it becomes the always-open head, basics locks behind it
    fx.catalog
        .reorder_modules(
            fx.formation_id,
            &[fx.advanced.to_string(), fx.basics.to_string()],
        )
        .await
        .expect("reorder");

    assert!(
        fx.progress
            .is_module_unlocked(fx.formation_id, fx.advanced, learner)
            .await
    );
    assert!(
        !fx.progress
            .is_module_unlocked(fx.formation_id, fx.basics, learner)
            .await
    );
}
