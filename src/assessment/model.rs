use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::error::PipelineError;

/// DISC profile axis. Declaration order is the fixed enumeration order used
/// for tie-breaking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Axis {
    D,
    I,
    S,
    C,
}

impl Axis {
    pub const ALL: [Axis; 4] = [Axis::D, Axis::I, Axis::S, Axis::C];

    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::D => "D",
            Axis::I => "I",
            Axis::S => "S",
            Axis::C => "C",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Axis::D => "Dominance",
            Axis::I => "Influence",
            Axis::S => "Steadiness",
            Axis::C => "Conscientiousness",
        }
    }

    fn index(&self) -> usize {
        match self {
            Axis::D => 0,
            Axis::I => 1,
            Axis::S => 2,
            Axis::C => 3,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "D" => Ok(Axis::D),
            "I" => Ok(Axis::I),
            "S" => Ok(Axis::S),
            "C" => Ok(Axis::C),
            other => Err(format!("'{}' is not one of D, I, S, C", other)),
        }
    }
}

/// Question identifier, unique within one test
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub u32);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QuestionId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(QuestionId)
            .map_err(|_| format!("'{}' is not a question id", s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub text: String,
    #[serde(rename = "type")]
    pub axis: Axis,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<QuestionOption>,
}

impl Question {
    pub fn offers(&self, axis: Axis) -> bool {
        self.options.iter().any(|o| o.axis == axis)
    }
}

/// Immutable test definition. Edits publish a new test rather than
/// mutating one that assignments may already reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Test {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
    pub created_at: DateTime<Utc>,
}

impl Test {
    pub fn question(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn has_question(&self, id: QuestionId) -> bool {
        self.question(id).is_some()
    }

    pub fn summary(&self) -> TestSummary {
        TestSummary {
            id: self.id,
            slug: self.slug.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            question_count: self.questions.len() as u32,
            created_at: self.created_at,
        }
    }

    /// Structural checks applied before a test is published
    pub fn validate(&self) -> Result<(), String> {
        if self.slug.trim().is_empty() {
            return Err("test slug must not be empty".to_string());
        }
        // Test lookups accept either an id or a slug
        if Uuid::parse_str(self.slug.trim()).is_ok() {
            return Err(format!("test slug '{}' must not be a uuid", self.slug));
        }
        if self.title.trim().is_empty() {
            return Err("test title must not be empty".to_string());
        }
        if self.questions.is_empty() {
            return Err("test must contain at least one question".to_string());
        }
        let mut seen = std::collections::HashSet::new();
        for q in &self.questions {
            if !seen.insert(q.id) {
                return Err(format!("duplicate question id {}", q.id));
            }
            if q.options.is_empty() {
                return Err(format!("question {} has no options", q.id));
            }
        }
        Ok(())
    }
}

/// Listing form of a test, without question bodies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSummary {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub question_count: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Assignment {
    pub id: Uuid,
    pub leader_id: Uuid,
    pub test_id: Uuid,
    pub organization_id: Uuid,
    pub assigned_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Assignment {
    pub fn new(leader_id: Uuid, test_id: Uuid, organization_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            leader_id,
            test_id,
            organization_id,
            assigned_at: Utc::now(),
            completed_at: None,
        }
    }

    /// The only place status is computed; it is never stored
    pub fn status(&self) -> AssignmentStatus {
        match self.completed_at {
            Some(_) => AssignmentStatus::Completed,
            None => AssignmentStatus::Pending,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status() == AssignmentStatus::Completed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

/// Assignment joined with its test title and assignee profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentView {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub status: AssignmentStatus,
    pub test_title: Option<String>,
    pub test_description: Option<String>,
    pub profile: Option<ProfileSummary>,
}

impl AssignmentView {
    pub fn new(
        assignment: Assignment,
        test_title: Option<String>,
        test_description: Option<String>,
        profile: Option<ProfileSummary>,
    ) -> Self {
        Self {
            status: assignment.status(),
            assignment,
            test_title,
            test_description,
            profile,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AssignmentStats {
    pub total: u64,
    pub pending: u64,
    pub completed: u64,
}

impl AssignmentStats {
    pub fn from_counts(total: u64, completed: u64) -> Self {
        Self {
            total,
            completed,
            pending: total.saturating_sub(completed),
        }
    }

    /// Rounded completion percentage, 0 when nothing has been assigned
    pub fn completion_rate(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed as f64 / self.total as f64) * 100.0).round() as u32
    }
}

/// One selected axis per answered question
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet(BTreeMap<QuestionId, Axis>);

impl AnswerSet {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Parse the loosely-typed `{ "<question id>": "<axis>" }` payload
    pub fn from_raw(raw: &HashMap<String, String>) -> Result<Self, PipelineError> {
        let mut answers = BTreeMap::new();
        for (key, value) in raw {
            let question = key
                .parse::<QuestionId>()
                .map_err(PipelineError::InvalidAnswerSet)?;
            let axis = value
                .parse::<Axis>()
                .map_err(|e| PipelineError::InvalidAnswerSet(format!("question {}: {}", question, e)))?;
            if answers.insert(question, axis).is_some() {
                return Err(PipelineError::InvalidAnswerSet(format!(
                    "question {} answered more than once",
                    question
                )));
            }
        }
        Ok(Self(answers))
    }

    /// Later answers for the same question replace earlier ones
    pub fn insert(&mut self, question: QuestionId, axis: Axis) -> Option<Axis> {
        self.0.insert(question, axis)
    }

    pub fn get(&self, question: QuestionId) -> Option<Axis> {
        self.0.get(&question).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, Axis)> + '_ {
        self.0.iter().map(|(q, a)| (*q, *a))
    }

    pub fn question_ids(&self) -> impl Iterator<Item = QuestionId> + '_ {
        self.0.keys().copied()
    }
}

impl FromIterator<(QuestionId, Axis)> for AnswerSet {
    fn from_iter<I: IntoIterator<Item = (QuestionId, Axis)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Per-axis answer tally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Score {
    #[serde(rename = "D")]
    pub d: u32,
    #[serde(rename = "I")]
    pub i: u32,
    #[serde(rename = "S")]
    pub s: u32,
    #[serde(rename = "C")]
    pub c: u32,
}

impl Score {
    pub fn tally(answers: &AnswerSet) -> Self {
        let mut counts = [0u32; 4];
        for (_, axis) in answers.iter() {
            counts[axis.index()] += 1;
        }
        Self {
            d: counts[0],
            i: counts[1],
            s: counts[2],
            c: counts[3],
        }
    }

    pub fn get(&self, axis: Axis) -> u32 {
        match axis {
            Axis::D => self.d,
            Axis::I => self.i,
            Axis::S => self.s,
            Axis::C => self.c,
        }
    }

    pub fn total(&self) -> u32 {
        self.d + self.i + self.s + self.c
    }

    /// Axis with the highest count; ties go to the earliest in D, I, S, C order
    pub fn dominant(&self) -> Axis {
        let mut best = Axis::D;
        for axis in Axis::ALL {
            if self.get(axis) > self.get(best) {
                best = axis;
            }
        }
        best
    }
}

/// Persisted outcome of a submitted assignment. Never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub user_id: Uuid,
    pub answers: AnswerSet,
    pub score: Score,
    pub created_at: DateTime<Utc>,
}

impl AssessmentResult {
    pub fn dominant(&self) -> Axis {
        self.score.dominant()
    }

    /// Re-run the tally over the stored answers
    pub fn rescore(&self) -> Score {
        Score::tally(&self.answers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(pairs: &[(u32, Axis)]) -> AnswerSet {
        pairs.iter().map(|(q, a)| (QuestionId(*q), *a)).collect()
    }

    #[test]
    fn tally_sums_to_answer_count() {
        let set = answers(&[(1, Axis::D), (2, Axis::I), (3, Axis::D), (4, Axis::C), (5, Axis::S)]);
        let score = Score::tally(&set);
        assert_eq!(score.total() as usize, set.len());
        assert_eq!(score.d, 2);
        assert_eq!(score.i, 1);
        assert_eq!(score.s, 1);
        assert_eq!(score.c, 1);
    }

    #[test]
    fn dominant_tie_goes_to_enumeration_order() {
        let score = Score { d: 2, i: 2, s: 1, c: 0 };
        assert_eq!(score.dominant(), Axis::D);

        let score = Score { d: 0, i: 1, s: 3, c: 3 };
        assert_eq!(score.dominant(), Axis::S);
    }

    #[test]
    fn dominant_of_empty_score_is_first_axis() {
        assert_eq!(Score::default().dominant(), Axis::D);
    }

    #[test]
    fn score_serializes_with_axis_letters() {
        let score = Score { d: 4, i: 0, s: 1, c: 2 };
        let v = serde_json::to_value(score).unwrap();
        assert_eq!(v, serde_json::json!({ "D": 4, "I": 0, "S": 1, "C": 2 }));
    }

    #[test]
    fn answer_set_json_uses_question_keys() {
        let set = answers(&[(2, Axis::S), (1, Axis::D)]);
        let v = serde_json::to_value(&set).unwrap();
        assert_eq!(v, serde_json::json!({ "1": "D", "2": "S" }));
        let back: AnswerSet = serde_json::from_value(v).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn from_raw_rejects_unknown_axis_and_bad_keys() {
        let mut raw = HashMap::new();
        raw.insert("1".to_string(), "X".to_string());
        assert!(matches!(AnswerSet::from_raw(&raw), Err(PipelineError::InvalidAnswerSet(_))));

        let mut raw = HashMap::new();
        raw.insert("first".to_string(), "D".to_string());
        assert!(matches!(AnswerSet::from_raw(&raw), Err(PipelineError::InvalidAnswerSet(_))));

        let mut raw = HashMap::new();
        raw.insert("3".to_string(), "C".to_string());
        let set = AnswerSet::from_raw(&raw).unwrap();
        assert_eq!(set.get(QuestionId(3)), Some(Axis::C));
    }

    #[test]
    fn from_raw_rejects_keys_naming_the_same_question() {
        let mut raw = HashMap::new();
        raw.insert("1".to_string(), "D".to_string());
        raw.insert("01".to_string(), "I".to_string());
        raw.insert(" 1".to_string(), "C".to_string());
        let err = AnswerSet::from_raw(&raw).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidAnswerSet(msg) if msg.contains("more than once")));
    }

    #[test]
    fn validate_rejects_uuid_shaped_slugs() {
        let test = Test {
            id: Uuid::new_v4(),
            slug: Uuid::new_v4().to_string(),
            title: "Shadow".to_string(),
            description: String::new(),
            questions: vec![Question {
                id: QuestionId(1),
                text: "Pick one".to_string(),
                options: vec![QuestionOption { text: "Lead".to_string(), axis: Axis::D }],
            }],
            created_at: Utc::now(),
        };
        assert!(test.validate().unwrap_err().contains("uuid"));

        let test = Test { slug: "disc-extended".to_string(), ..test };
        assert!(test.validate().is_ok());
    }

    #[test]
    fn status_is_derived_from_completion_timestamp() {
        let mut a = Assignment::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(a.status(), AssignmentStatus::Pending);
        a.completed_at = Some(Utc::now());
        assert_eq!(a.status(), AssignmentStatus::Completed);
    }

    #[test]
    fn completion_rate_rounds() {
        assert_eq!(AssignmentStats::from_counts(3, 2).completion_rate(), 67);
        assert_eq!(AssignmentStats::from_counts(0, 0).completion_rate(), 0);
        assert_eq!(AssignmentStats::from_counts(4, 1).pending, 3);
    }
}
