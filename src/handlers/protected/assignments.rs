use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use super::utils::{parse_id, require_manager, PageQuery};
use crate::app::AppState;
use crate::assessment::{AnswerSet, AssessmentResult, Assignment, AssignmentStats, AssignmentView, Axis, PipelineError};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::{Caller, Page};

#[derive(Debug, Deserialize)]
pub struct CreateAssignment {
    pub leader_id: Uuid,
    pub test_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswers {
    /// `{ "<question id>": "D" | "I" | "S" | "C" }`
    pub answers: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub struct ResultView {
    #[serde(flatten)]
    pub result: AssessmentResult,
    pub dominant: Axis,
}

impl From<AssessmentResult> for ResultView {
    fn from(result: AssessmentResult) -> Self {
        Self { dominant: result.dominant(), result }
    }
}

/// Managers see their organization's assignments; leaders see their own
fn visible_to(caller: &Caller, assignment: &Assignment) -> bool {
    assignment.organization_id == caller.organization_id
        && (caller.is_manager() || assignment.leader_id == caller.user_id)
}

async fn load_visible(state: &AppState, caller: &Caller, raw_id: &str) -> Result<Assignment, ApiError> {
    let id = parse_id(raw_id)?;
    let assignment = state.pipeline.assignments.get_by_id(id).await?;
    if !visible_to(caller, &assignment) {
        return Err(PipelineError::not_found("assignment", id).into());
    }
    Ok(assignment)
}

/// POST /api/assignments - assign a test to a leader (managers only)
pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<CreateAssignment>,
) -> ApiResult<Assignment> {
    require_manager(&caller)?;
    let assignment = state
        .pipeline
        .assignments
        .assign(body.leader_id, body.test_id, caller.organization_id)
        .await?;
    Ok(ApiResponse::created(assignment))
}

/// GET /api/assignments - newest first, joined with test and assignee
pub async fn list(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<AssignmentView>> {
    let pagination = query.pagination(&state);
    let page = if caller.is_manager() {
        state.pipeline.assignments.list_for_organization(caller.organization_id, pagination).await?
    } else {
        state.pipeline.assignments.list_for_assignee(caller.user_id, pagination).await?
    };
    Ok(ApiResponse::success(page))
}

/// GET /api/assignments/stats
pub async fn stats(State(state): State<AppState>, Extension(caller): Extension<Caller>) -> ApiResult<AssignmentStats> {
    require_manager(&caller)?;
    let stats = state.pipeline.assignments.stats(caller.organization_id).await?;
    Ok(ApiResponse::success(stats))
}

/// GET /api/assignments/:id
pub async fn show(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<AssignmentView> {
    let assignment = load_visible(&state, &caller, &id).await?;
    let view = state.pipeline.assignments.view(assignment).await?;
    Ok(ApiResponse::success(view))
}

/// POST /api/assignments/:id/complete - idempotent
pub async fn complete(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<Assignment> {
    require_manager(&caller)?;
    let assignment = load_visible(&state, &caller, &id).await?;
    let completed = state.pipeline.assignments.mark_completed(assignment.id).await?;
    Ok(ApiResponse::success(completed))
}

/// POST /api/assignments/:id/submit - the assignee's finished answer set
pub async fn submit(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(body): Json<SubmitAnswers>,
) -> ApiResult<ResultView> {
    let assignment_id = parse_id(&id)?;
    let answers = AnswerSet::from_raw(&body.answers)?;
    let result = state.pipeline.scorer.submit(assignment_id, caller.user_id, answers).await?;
    Ok(ApiResponse::created(result.into()))
}

/// GET /api/assignments/:id/result
pub async fn result(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
) -> ApiResult<ResultView> {
    let assignment = load_visible(&state, &caller, &id).await?;
    let result = state.pipeline.scorer.result_for(assignment.id).await?;
    Ok(ApiResponse::success(result.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn leaders_only_see_their_own_assignments() {
        let org = Uuid::new_v4();
        let leader = Caller::new(Uuid::new_v4(), org, Role::Leader);
        let manager = Caller::new(Uuid::new_v4(), org, Role::Manager);
        let stranger = Caller::new(Uuid::new_v4(), Uuid::new_v4(), Role::Manager);

        let mine = Assignment::new(leader.user_id, Uuid::new_v4(), org);
        let other = Assignment::new(Uuid::new_v4(), Uuid::new_v4(), org);

        assert!(visible_to(&leader, &mine));
        assert!(!visible_to(&leader, &other));
        assert!(visible_to(&manager, &other));
        assert!(!visible_to(&stranger, &mine));
    }
}
