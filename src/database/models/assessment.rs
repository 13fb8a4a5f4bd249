// Row decoding for the assessment tables. Questions, answers and scores are
// JSONB columns.

use sqlx::{postgres::PgRow, types::Json, FromRow, Row};
use uuid::Uuid;

use crate::assessment::model::{
    AnswerSet, AssessmentResult, Assignment, AssignmentView, ProfileSummary, Question, Score,
    Test, TestSummary,
};

impl<'r> FromRow<'r, PgRow> for Test {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let Json(questions): Json<Vec<Question>> = row.try_get("questions")?;
        Ok(Self {
            id: row.try_get("id")?,
            slug: row.try_get("slug")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            questions,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for TestSummary {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let count: i32 = row.try_get("question_count")?;
        Ok(Self {
            id: row.try_get("id")?,
            slug: row.try_get("slug")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            question_count: count.max(0) as u32,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for AssessmentResult {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let Json(answers): Json<AnswerSet> = row.try_get("answers")?;
        let Json(score): Json<Score> = row.try_get("score")?;
        Ok(Self {
            id: row.try_get("id")?,
            assignment_id: row.try_get("assignment_id")?,
            user_id: row.try_get("user_id")?,
            answers,
            score,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl<'r> FromRow<'r, PgRow> for AssignmentView {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let assignment = Assignment::from_row(row)?;
        let profile_id: Option<Uuid> = row.try_get("profile_id")?;
        let profile = match profile_id {
            Some(_) => Some(ProfileSummary {
                full_name: row.try_get("full_name")?,
                email: row.try_get("email")?,
                avatar_url: row.try_get("avatar_url")?,
            }),
            None => None,
        };
        Ok(AssignmentView::new(
            assignment,
            row.try_get("test_title")?,
            row.try_get("test_description")?,
            profile,
        ))
    }
}
