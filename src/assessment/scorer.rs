use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::error::PipelineError;
use super::model::{AnswerSet, AssessmentResult, Score, Test};
use crate::store::{call, AssessmentStore, CallPolicy, Store, StoreError};

/// Turns a finished answer set into a persisted result.
#[derive(Clone)]
pub struct Scorer {
    store: Arc<dyn Store>,
    policy: CallPolicy,
}

impl Scorer {
    pub fn new(store: Arc<dyn Store>, policy: CallPolicy) -> Self {
        Self { store, policy }
    }

    /// Score and persist the assignee's answers.
    ///
    /// All validation happens before the single write. The write stores the
    /// result and completes the assignment together. A completed assignment,
    /// whether submitted or marked by a manager, is `AlreadySubmitted`, and so
    /// is a concurrent submission that wins the race.
    pub async fn submit(
        &self,
        assignment_id: Uuid,
        assignee_id: Uuid,
        answers: AnswerSet,
    ) -> Result<AssessmentResult, PipelineError> {
        let store = &self.store;

        let assignment = call::read(&self.policy, "get_assignment", || store.get_assignment(assignment_id))
            .await?
            .filter(|a| a.leader_id == assignee_id)
            .ok_or_else(|| PipelineError::not_found("assignment", assignment_id))?;

        if answers.is_empty() {
            return Err(PipelineError::InvalidAnswerSet("no questions were answered".to_string()));
        }

        let test = call::read(&self.policy, "get_test", || store.get_test(assignment.test_id))
            .await?
            .ok_or_else(|| PipelineError::not_found("test", assignment.test_id))?;
        check_answers(&test, &answers)?;

        let existing = call::read(&self.policy, "get_result_for_assignment", || {
            store.get_result_for_assignment(assignment_id)
        })
        .await?;
        if existing.is_some() || assignment.is_completed() {
            warn!(%assignment_id, "rejected submission for a completed assignment");
            return Err(PipelineError::AlreadySubmitted(assignment_id));
        }

        let result = AssessmentResult {
            id: Uuid::new_v4(),
            assignment_id,
            user_id: assignee_id,
            score: Score::tally(&answers),
            answers,
            created_at: Utc::now(),
        };

        match call::write(&self.policy, "insert_submission", store.insert_submission(&result)).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => {
                warn!(%assignment_id, "submission lost a race with another submission");
                return Err(PipelineError::AlreadySubmitted(assignment_id));
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            %assignment_id,
            result_id = %result.id,
            answered = result.answers.len(),
            dominant = %result.dominant(),
            "assessment submitted"
        );
        Ok(result)
    }

    pub async fn result_for(&self, assignment_id: Uuid) -> Result<AssessmentResult, PipelineError> {
        let store = &self.store;
        call::read(&self.policy, "get_result_for_assignment", || {
            store.get_result_for_assignment(assignment_id)
        })
        .await?
        .ok_or_else(|| PipelineError::not_found("result", assignment_id))
    }
}

/// Every answer must name a question of `test` and an axis that question offers
pub fn check_answers(test: &Test, answers: &AnswerSet) -> Result<(), PipelineError> {
    let mut unknown = Vec::new();
    for (question_id, axis) in answers.iter() {
        match test.question(question_id) {
            None => unknown.push(question_id.to_string()),
            Some(q) if !q.offers(axis) => {
                return Err(PipelineError::InvalidAnswerSet(format!(
                    "question {} has no option of type {}",
                    question_id, axis
                )))
            }
            Some(_) => {}
        }
    }
    if !unknown.is_empty() {
        return Err(PipelineError::InvalidAnswerSet(format!(
            "questions not in test '{}': {}",
            test.slug,
            unknown.join(", ")
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::assignments::AssignmentManager;
    use crate::assessment::fixtures::{self, Fixture};
    use crate::assessment::model::{Assignment, AssignmentStatus, Axis, QuestionId};
    use crate::store::{AssessmentStore, MemoryStore};

    struct Harness {
        store: Arc<MemoryStore>,
        manager: AssignmentManager,
        scorer: Scorer,
        fixture: Fixture,
    }

    async fn harness() -> Harness {
        let store = Arc::new(MemoryStore::new());
        let fixture = fixtures::seed(&*store).await.unwrap();
        let policy = CallPolicy { backoff: std::time::Duration::from_millis(1), ..CallPolicy::default() };
        Harness {
            manager: AssignmentManager::new(store.clone(), policy),
            scorer: Scorer::new(store.clone(), policy),
            store,
            fixture,
        }
    }

    fn all(axis: Axis) -> AnswerSet {
        (1..=4).map(|q| (QuestionId(q), axis)).collect()
    }

    async fn assign(h: &Harness) -> Assignment {
        let f = &h.fixture;
        h.manager.assign(f.leader.id, f.test.id, f.organization.id).await.unwrap()
    }

    #[tokio::test]
    async fn disc_basic_all_dominance() {
        let h = harness().await;
        let a = assign(&h).await;
        assert_eq!(a.status(), AssignmentStatus::Pending);

        let result = h.scorer.submit(a.id, h.fixture.leader.id, all(Axis::D)).await.unwrap();
        assert_eq!(result.score, Score { d: 4, i: 0, s: 0, c: 0 });
        assert_eq!(result.dominant(), Axis::D);

        let a = h.manager.get_by_id(a.id).await.unwrap();
        assert_eq!(a.status(), AssignmentStatus::Completed);
        assert_eq!(a.completed_at, Some(result.created_at));
    }

    #[tokio::test]
    async fn score_sums_to_answered_questions() {
        let h = harness().await;
        let a = assign(&h).await;
        let answers: AnswerSet = [(QuestionId(1), Axis::I), (QuestionId(3), Axis::I), (QuestionId(4), Axis::C)]
            .into_iter()
            .collect();

        let result = h.scorer.submit(a.id, h.fixture.leader.id, answers).await.unwrap();
        assert_eq!(result.score.total(), 3);
        assert_eq!(result.dominant(), Axis::I);
    }

    #[tokio::test]
    async fn unknown_question_fails_without_persisting() {
        let h = harness().await;
        let a = assign(&h).await;
        let mut answers = all(Axis::S);
        answers.insert(QuestionId(42), Axis::S);

        let err = h.scorer.submit(a.id, h.fixture.leader.id, answers).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidAnswerSet(_)));
        assert!(h.store.get_result_for_assignment(a.id).await.unwrap().is_none());
        assert!(!h.manager.get_by_id(a.id).await.unwrap().is_completed());
    }

    #[tokio::test]
    async fn empty_answer_set_is_invalid() {
        let h = harness().await;
        let a = assign(&h).await;
        let err = h.scorer.submit(a.id, h.fixture.leader.id, AnswerSet::new()).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidAnswerSet(_)));
    }

    #[tokio::test]
    async fn second_submission_is_rejected_and_first_kept() {
        let h = harness().await;
        let a = assign(&h).await;
        let leader = h.fixture.leader.id;

        let first = h.scorer.submit(a.id, leader, all(Axis::D)).await.unwrap();
        let err = h.scorer.submit(a.id, leader, all(Axis::C)).await.unwrap_err();
        assert!(matches!(err, PipelineError::AlreadySubmitted(id) if id == a.id));

        let stored = h.scorer.result_for(a.id).await.unwrap();
        assert_eq!(stored, first);
    }

    #[tokio::test]
    async fn concurrent_submissions_produce_one_result() {
        let h = harness().await;
        let a = assign(&h).await;
        let leader = h.fixture.leader.id;

        let (x, y) = tokio::join!(
            h.scorer.submit(a.id, leader, all(Axis::D)),
            h.scorer.submit(a.id, leader, all(Axis::I)),
        );
        let outcomes = [x, y];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes
            .iter()
            .any(|r| matches!(r, Err(PipelineError::AlreadySubmitted(_)))));
    }

    #[tokio::test]
    async fn manually_completed_assignment_rejects_submission() {
        let h = harness().await;
        let a = assign(&h).await;
        h.manager.mark_completed(a.id).await.unwrap();

        let err = h.scorer.submit(a.id, h.fixture.leader.id, all(Axis::D)).await.unwrap_err();
        assert!(matches!(err, PipelineError::AlreadySubmitted(id) if id == a.id));
        assert!(h.store.get_result_for_assignment(a.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn store_refuses_result_for_completed_assignment() {
        let h = harness().await;
        let a = assign(&h).await;
        h.store.mark_assignment_completed(a.id, Utc::now()).await.unwrap();

        let result = AssessmentResult {
            id: Uuid::new_v4(),
            assignment_id: a.id,
            user_id: h.fixture.leader.id,
            answers: all(Axis::I),
            score: Score::tally(&all(Axis::I)),
            created_at: Utc::now(),
        };
        let err = h.store.insert_submission(&result).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(h.store.get_result_for_assignment(a.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn someone_elses_assignment_is_not_found() {
        let h = harness().await;
        let a = assign(&h).await;
        let err = h.scorer.submit(a.id, Uuid::new_v4(), all(Axis::D)).await.unwrap_err();
        assert!(matches!(err, PipelineError::NotFound { entity: "assignment", .. }));
    }

    #[tokio::test]
    async fn failed_write_is_not_retried_and_leaves_nothing_behind() {
        let h = harness().await;
        let a = assign(&h).await;
        let leader = h.fixture.leader.id;

        // assignment, test and existing-result reads pass; the submission write fails
        h.store.pass_next(3);
        h.store.fail_next(StoreError::Unavailable("connection reset".into()));
        let err = h.scorer.submit(a.id, leader, all(Axis::D)).await.unwrap_err();
        assert!(matches!(err, PipelineError::Persistence(StoreError::Unavailable(_))));

        assert!(h.store.get_result_for_assignment(a.id).await.unwrap().is_none());
        assert!(!h.manager.get_by_id(a.id).await.unwrap().is_completed());

        // After re-checking state the caller may submit again
        assert!(h.scorer.submit(a.id, leader, all(Axis::D)).await.is_ok());
    }

    #[tokio::test]
    async fn transient_read_failures_are_retried() {
        let h = harness().await;
        let a = assign(&h).await;
        h.store.fail_next(StoreError::Timeout { operation: "get_assignment", after_ms: 5 });
        let result = h.scorer.submit(a.id, h.fixture.leader.id, all(Axis::C)).await.unwrap();
        assert_eq!(result.dominant(), Axis::C);
    }

    #[tokio::test]
    async fn persisted_answers_rescore_to_stored_score() {
        let h = harness().await;
        let a = assign(&h).await;
        let answers: AnswerSet = [(QuestionId(1), Axis::S), (QuestionId(2), Axis::C), (QuestionId(3), Axis::S)]
            .into_iter()
            .collect();
        h.scorer.submit(a.id, h.fixture.leader.id, answers).await.unwrap();

        let stored = h.scorer.result_for(a.id).await.unwrap();
        assert_eq!(stored.rescore(), stored.score);
        assert_eq!(stored.dominant(), Axis::S);
    }
}
