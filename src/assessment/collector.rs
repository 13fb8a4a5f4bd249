use super::error::PipelineError;
use super::model::{AnswerSet, Axis, Question, QuestionId, Test};

/// In-progress answers for one take-test session.
///
/// Nothing here is persisted; the answer set only reaches the store when it
/// is handed to the scorer. The cursor supports moving forward and back
/// through the questions, and any answer may be changed until submission.
#[derive(Debug, Clone)]
pub struct ResponseSession {
    test: Test,
    answers: AnswerSet,
    cursor: usize,
}

impl ResponseSession {
    pub fn new(test: Test) -> Self {
        Self {
            test,
            answers: AnswerSet::new(),
            cursor: 0,
        }
    }

    pub fn test(&self) -> &Test {
        &self.test
    }

    /// Overwrites any earlier answer for the same question. Rejected answers
    /// leave the session untouched.
    pub fn record_answer(&mut self, question_id: QuestionId, axis: Axis) -> Result<(), PipelineError> {
        let question = self.test.question(question_id).ok_or_else(|| {
            PipelineError::InvalidAnswerSet(format!("question {} is not part of test '{}'", question_id, self.test.slug))
        })?;
        if !question.offers(axis) {
            return Err(PipelineError::InvalidAnswerSet(format!(
                "question {} has no option of type {}",
                question_id, axis
            )));
        }
        self.answers.insert(question_id, axis);
        Ok(())
    }

    /// `(answered, total)`
    pub fn current_progress(&self) -> (usize, usize) {
        (self.answers.len(), self.test.questions.len())
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.test.questions.get(self.cursor)
    }

    pub fn current_answer(&self) -> Option<Axis> {
        self.current_question().and_then(|q| self.answers.get(q.id))
    }

    /// Move to the next question. Returns false, without moving, on the last
    /// question or while the current one is unanswered.
    pub fn advance(&mut self) -> bool {
        if self.current_answer().is_none() || self.cursor + 1 >= self.test.questions.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Returns false when already on the first question
    pub fn back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub fn is_complete(&self) -> bool {
        self.test.questions.iter().all(|q| self.answers.get(q.id).is_some())
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn into_answer_set(self) -> AnswerSet {
        self.answers
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::fixtures;

    #[test]
    fn records_and_overwrites_answers() {
        let mut session = ResponseSession::new(fixtures::disc_basic());
        session.record_answer(QuestionId(1), Axis::D).unwrap();
        session.record_answer(QuestionId(1), Axis::S).unwrap();
        assert_eq!(session.current_progress(), (1, 4));
        assert_eq!(session.answers().get(QuestionId(1)), Some(Axis::S));
    }

    #[test]
    fn rejects_unknown_question_without_touching_state() {
        let mut session = ResponseSession::new(fixtures::disc_basic());
        session.record_answer(QuestionId(2), Axis::I).unwrap();
        let err = session.record_answer(QuestionId(99), Axis::D).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidAnswerSet(_)));
        assert_eq!(session.current_progress(), (1, 4));
    }

    #[test]
    fn rejects_axis_the_question_does_not_offer() {
        let mut test = fixtures::disc_basic();
        test.questions[0].options.retain(|o| o.axis != Axis::C);
        let mut session = ResponseSession::new(test);
        assert!(session.record_answer(QuestionId(1), Axis::C).is_err());
        assert!(session.answers().is_empty());
    }

    #[test]
    fn navigation_waits_for_an_answer() {
        let mut session = ResponseSession::new(fixtures::disc_basic());
        assert!(!session.back());
        assert!(!session.advance());

        session.record_answer(QuestionId(1), Axis::D).unwrap();
        assert!(session.advance());
        assert_eq!(session.current_question().map(|q| q.id), Some(QuestionId(2)));

        assert!(session.back());
        assert_eq!(session.current_answer(), Some(Axis::D));
    }

    #[test]
    fn completes_after_every_question_is_answered() {
        let mut session = ResponseSession::new(fixtures::disc_basic());
        for id in 1..=4 {
            assert!(!session.is_complete());
            session.record_answer(QuestionId(id), Axis::C).unwrap();
            session.advance();
        }
        assert!(session.is_complete());
        assert_eq!(session.position(), 3);
        assert!(!session.advance());
        assert_eq!(session.into_answer_set().len(), 4);
    }
}
