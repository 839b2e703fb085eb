//! Pure quiz grading.
//!
//! Grading is deterministic and side-effect free: same quiz plus same
//! attempt always yields the same verdict. Persisting the graded result is
//! the caller's job.

use thiserror::Error;

use crate::model::{ChoiceId, QuestionId, Quiz, QuizAttempt, QuizId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GradeError {
    /// A quiz with zero questions has no defined grade. Callers must withhold
    /// such quizzes from learners instead of grading them.
    #[error("cannot grade a quiz with no questions")]
    EmptyQuiz,
}

//
// ─── RESULT TYPES ──────────────────────────────────────────────────────────────
//

/// Per-question review detail. Feeds the review surface; the pass/fail
/// decision only uses the point totals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionOutcome {
    pub question_id: QuestionId,
    pub question_text: String,
    /// The learner's selection, when exactly one choice was picked and it
    /// belongs to the question.
    pub selected: Option<(ChoiceId, String)>,
    /// Text of the designated correct choice (first flagged correct), if the
    /// question has one at all.
    pub correct_text: Option<String>,
    pub correct: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedQuiz {
    pub quiz_id: QuizId,
    pub score: u32,
    pub total_questions: u32,
    pub percentage: u8,
    pub passed: bool,
    pub per_question: Vec<QuestionOutcome>,
}

//
// ─── GRADING ───────────────────────────────────────────────────────────────────
//

/// Half-up integer rounding of `100 * numerator / denominator`.
///
/// `denominator` must be non-zero; both operands fit comfortably in u64.
#[must_use]
pub(crate) fn percent_half_up(numerator: u32, denominator: u32) -> u8 {
    let n = u64::from(numerator);
    let d = u64::from(denominator);
    #[allow(clippy::cast_possible_truncation)]
    let pct = ((200 * n + d) / (2 * d)) as u8;
    pct
}

/// Grades an attempt against a quiz definition.
///
/// Scoring rules, per question:
/// - unanswered scores 0, never "correct";
/// - a selection that is not one of the question's choices scores 0;
/// - an ambiguous multi-selection (after dedup) scores 0;
/// - otherwise the point is awarded iff the selected choice is flagged
///   correct. A question with several flagged-correct choices awards the
///   point for any of them; one with none can never score.
///
/// Partial submissions are graded normally: missing answers count as
/// incorrect, they never abort grading.
///
/// # Errors
///
/// Returns `GradeError::EmptyQuiz` if the quiz has no questions.
pub fn grade(quiz: &Quiz, attempt: &QuizAttempt) -> Result<GradedQuiz, GradeError> {
    let total_questions =
        u32::try_from(quiz.questions.len()).map_err(|_| GradeError::EmptyQuiz)?;
    if total_questions == 0 {
        return Err(GradeError::EmptyQuiz);
    }

    let mut score = 0u32;
    let mut per_question = Vec::with_capacity(quiz.questions.len());

    for question in &quiz.questions {
        let mut selections: Vec<ChoiceId> = Vec::new();
        for id in attempt.selections(question.id) {
            if !selections.contains(id) {
                selections.push(*id);
            }
        }

        let selected = match selections.as_slice() {
            [single] => question
                .choice(*single)
                .map(|c| (c.id, c.text.clone())),
            _ => None,
        };

        let correct = selected
            .as_ref()
            .and_then(|(id, _)| question.choice(*id))
            .is_some_and(|c| c.is_correct);
        if correct {
            score += 1;
        }

        per_question.push(QuestionOutcome {
            question_id: question.id,
            question_text: question.text.clone(),
            selected,
            correct_text: question.correct_choice().map(|c| c.text.clone()),
            correct,
        });
    }

    let percentage = percent_half_up(score, total_questions);
    let passed = percentage >= quiz.pass_threshold.value();

    Ok(GradedQuiz {
        quiz_id: quiz.id,
        score,
        total_questions,
        percentage,
        passed,
        per_question,
    })
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Choice, LearnerId, PassThreshold, Question};
    use crate::time::fixed_now;

    fn question(id: u64, quiz_id: QuizId, correct: u64, wrong: &[u64]) -> Question {
        let qid = QuestionId::new(id);
        let mut choices = vec![Choice {
            id: ChoiceId::new(correct),
            question_id: qid,
            text: format!("choice {correct}"),
            is_correct: true,
        }];
        for w in wrong {
            choices.push(Choice {
                id: ChoiceId::new(*w),
                question_id: qid,
                text: format!("choice {w}"),
                is_correct: false,
            });
        }
        Question {
            id: qid,
            quiz_id,
            text: format!("question {id}"),
            choices,
        }
    }

    /// A quiz with `n` questions; question i (1-based) has correct choice
    /// `i * 10` and wrong choices `i * 10 + 1`, `i * 10 + 2`.
    fn quiz(n: u64, threshold: u32) -> Quiz {
        let id = QuizId::new(1);
        let questions = (1..=n)
            .map(|i| question(i, id, i * 10, &[i * 10 + 1, i * 10 + 2]))
            .collect();
        Quiz {
            id,
            module_id: crate::model::ModuleId::new(1),
            title: "Final".into(),
            description: None,
            pass_threshold: PassThreshold::new(threshold).unwrap(),
            questions,
            created_at: fixed_now(),
        }
    }

    fn attempt_with(quiz: &Quiz, correct_count: u64, wrong_count: u64) -> QuizAttempt {
        let mut attempt = QuizAttempt::new(quiz.id, LearnerId::new(7));
        for i in 1..=correct_count {
            attempt.answer(QuestionId::new(i), ChoiceId::new(i * 10));
        }
        for i in (correct_count + 1)..=(correct_count + wrong_count) {
            attempt.answer(QuestionId::new(i), ChoiceId::new(i * 10 + 1));
        }
        attempt
    }

    #[test]
    fn empty_quiz_is_rejected() {
        let mut q = quiz(1, 50);
        q.questions.clear();
        let attempt = QuizAttempt::new(q.id, LearnerId::new(1));
        assert_eq!(grade(&q, &attempt).unwrap_err(), GradeError::EmptyQuiz);
    }

    #[test]
    fn threshold_boundary_passes_at_exactly_threshold() {
        let q = quiz(10, 70);

        let seven = grade(&q, &attempt_with(&q, 7, 3)).unwrap();
        assert_eq!(seven.score, 7);
        assert_eq!(seven.percentage, 70);
        assert!(seven.passed);

        let six = grade(&q, &attempt_with(&q, 6, 4)).unwrap();
        assert_eq!(six.percentage, 60);
        assert!(!six.passed);
    }

    #[test]
    fn partial_submission_counts_missing_as_incorrect() {
        let q = quiz(5, 50);
        let graded = grade(&q, &attempt_with(&q, 2, 0)).unwrap();

        assert_eq!(graded.score, 2);
        assert_eq!(graded.total_questions, 5);
        assert_eq!(graded.percentage, 40);
        assert!(!graded.passed);
        assert!(graded.per_question[2].selected.is_none());
        assert!(!graded.per_question[2].correct);
    }

    #[test]
    fn percentage_rounds_half_up() {
        // 1/3 = 33.33 -> 33, 2/3 = 66.67 -> 67, 1/8 = 12.5 -> 13
        assert_eq!(percent_half_up(1, 3), 33);
        assert_eq!(percent_half_up(2, 3), 67);
        assert_eq!(percent_half_up(1, 8), 13);
        assert_eq!(percent_half_up(0, 4), 0);
        assert_eq!(percent_half_up(4, 4), 100);
    }

    #[test]
    fn selection_outside_question_scores_zero() {
        let q = quiz(1, 0);
        let mut attempt = QuizAttempt::new(q.id, LearnerId::new(1));
        attempt.answer(QuestionId::new(1), ChoiceId::new(999));

        let graded = grade(&q, &attempt).unwrap();
        assert_eq!(graded.score, 0);
        assert!(graded.per_question[0].selected.is_none());
    }

    #[test]
    fn ambiguous_multi_selection_scores_zero() {
        let q = quiz(1, 0);
        let mut attempt = QuizAttempt::new(q.id, LearnerId::new(1));
        attempt
            .answers
            .insert(QuestionId::new(1), vec![ChoiceId::new(10), ChoiceId::new(11)]);

        let graded = grade(&q, &attempt).unwrap();
        assert_eq!(graded.score, 0);

        // duplicated single id dedups back to one selection and scores
        attempt
            .answers
            .insert(QuestionId::new(1), vec![ChoiceId::new(10), ChoiceId::new(10)]);
        let graded = grade(&q, &attempt).unwrap();
        assert_eq!(graded.score, 1);
    }

    #[test]
    fn zero_correct_question_never_scores() {
        let mut q = quiz(1, 0);
        for choice in &mut q.questions[0].choices {
            choice.is_correct = false;
        }
        let mut attempt = QuizAttempt::new(q.id, LearnerId::new(1));
        attempt.answer(QuestionId::new(1), ChoiceId::new(10));

        let graded = grade(&q, &attempt).unwrap();
        assert_eq!(graded.score, 0);
        assert!(graded.per_question[0].correct_text.is_none());
    }

    #[test]
    fn multi_correct_question_awards_any_flagged_choice() {
        let mut q = quiz(1, 0);
        q.questions[0].choices[1].is_correct = true; // choice 11 now also correct
        let mut attempt = QuizAttempt::new(q.id, LearnerId::new(1));
        attempt.answer(QuestionId::new(1), ChoiceId::new(11));

        let graded = grade(&q, &attempt).unwrap();
        assert_eq!(graded.score, 1);
    }

    #[test]
    fn grading_is_deterministic() {
        let q = quiz(4, 75);
        let attempt = attempt_with(&q, 3, 1);

        let first = grade(&q, &attempt).unwrap();
        let second = grade(&q, &attempt).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn per_question_detail_reports_texts() {
        let q = quiz(2, 50);
        let graded = grade(&q, &attempt_with(&q, 1, 1)).unwrap();

        let first = &graded.per_question[0];
        assert_eq!(first.selected.as_ref().unwrap().1, "choice 10");
        assert_eq!(first.correct_text.as_deref(), Some("choice 10"));
        assert!(first.correct);

        let second = &graded.per_question[1];
        assert_eq!(second.selected.as_ref().unwrap().1, "choice 21");
        assert_eq!(second.correct_text.as_deref(), Some("choice 20"));
        assert!(!second.correct);
    }
}
