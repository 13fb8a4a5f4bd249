//! Built-in `disc-basic` test and a minimal organization to go with it.
//! Used by `mentor seed`, the integration tests and local dry runs.

use chrono::Utc;
use uuid::Uuid;

use super::model::{Axis, Question, QuestionId, QuestionOption, Test};
use crate::database::models::{Organization, Profile};
use crate::store::{AssessmentStore, DirectoryStore, Store, StoreError};
use crate::types::Role;

pub const DISC_BASIC_SLUG: &str = "disc-basic";

const PROMPTS: [(&str, [&str; 4]); 4] = [
    (
        "When a project stalls, you usually...",
        [
            "Take charge and set a new deadline",
            "Rally the team with fresh energy",
            "Check in with everyone and keep things calm",
            "Review the plan to find what went wrong",
        ],
    ),
    (
        "In meetings you are most likely to...",
        [
            "Push for a decision",
            "Share ideas and stories",
            "Listen and support others",
            "Ask detailed questions",
        ],
    ),
    (
        "Under pressure you tend to...",
        [
            "Act quickly and decisively",
            "Stay optimistic and talk it through",
            "Keep a steady pace",
            "Double-check the facts",
        ],
    ),
    (
        "Colleagues would describe you as...",
        [
            "Direct",
            "Enthusiastic",
            "Patient",
            "Precise",
        ],
    ),
];

/// Four questions, each offering exactly one option per axis
pub fn disc_basic() -> Test {
    let questions = PROMPTS
        .iter()
        .enumerate()
        .map(|(i, (text, options))| Question {
            id: QuestionId(i as u32 + 1),
            text: text.to_string(),
            options: Axis::ALL
                .iter()
                .zip(options.iter())
                .map(|(axis, text)| QuestionOption { text: text.to_string(), axis: *axis })
                .collect(),
        })
        .collect();

    Test {
        id: Uuid::new_v4(),
        slug: DISC_BASIC_SLUG.to_string(),
        title: "DISC Basic".to_string(),
        description: "Short behavioural profile across Dominance, Influence, Steadiness and Conscientiousness".to_string(),
        questions,
        created_at: Utc::now(),
    }
}

#[derive(Debug, Clone)]
pub struct Fixture {
    pub organization: Organization,
    pub manager: Profile,
    pub leader: Profile,
    pub test: Test,
}

/// Insert an organization with one manager, one leader and `disc-basic`
pub async fn seed(store: &dyn Store) -> Result<Fixture, StoreError> {
    let organization = Organization::new("Acme Mentoring");
    let manager = Profile::new(organization.id, Role::Manager, "Marina Costa", "marina@acme.test");
    let leader = Profile::new(organization.id, Role::Leader, "Lucas Pereira", "lucas@acme.test");
    let test = disc_basic();

    store.insert_organization(&organization).await?;
    store.insert_profile(&manager).await?;
    store.insert_profile(&leader).await?;
    store.insert_test(&test).await?;

    Ok(Fixture { organization, manager, leader, test })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disc_basic_offers_every_axis_on_every_question() {
        let test = disc_basic();
        assert!(test.validate().is_ok());
        assert_eq!(test.questions.len(), 4);
        for q in &test.questions {
            assert!(Axis::ALL.iter().all(|a| q.offers(*a)));
            assert_eq!(q.options.len(), 4);
        }
    }
}
