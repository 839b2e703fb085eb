use std::collections::HashMap;

use crate::model::ids::{ChoiceId, LearnerId, QuestionId, QuizId};

/// A learner's submitted answers, as handed to the grader.
///
/// Ephemeral: created at submission time, graded, discarded. Only the graded
/// result is persisted. The answer map allows several choice ids per question
/// because that is the wire shape; single-select surfaces submit one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAttempt {
    pub quiz_id: QuizId,
    pub learner_id: LearnerId,
    pub answers: HashMap<QuestionId, Vec<ChoiceId>>,
}

impl QuizAttempt {
    #[must_use]
    pub fn new(quiz_id: QuizId, learner_id: LearnerId) -> Self {
        Self {
            quiz_id,
            learner_id,
            answers: HashMap::new(),
        }
    }

    /// Records a single-select answer, replacing any earlier selection for
    /// the question.
    pub fn answer(&mut self, question_id: QuestionId, choice_id: ChoiceId) {
        self.answers.insert(question_id, vec![choice_id]);
    }

    /// The selected choice ids for a question; empty when unanswered.
    #[must_use]
    pub fn selections(&self, question_id: QuestionId) -> &[ChoiceId] {
        self.answers
            .get(&question_id)
            .map_or(&[], Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_replaces_earlier_selection() {
        let mut attempt = QuizAttempt::new(QuizId::new(1), LearnerId::new(9));
        attempt.answer(QuestionId::new(1), ChoiceId::new(10));
        attempt.answer(QuestionId::new(1), ChoiceId::new(11));

        assert_eq!(attempt.selections(QuestionId::new(1)), &[ChoiceId::new(11)]);
        assert!(attempt.selections(QuestionId::new(2)).is_empty());
    }
}
