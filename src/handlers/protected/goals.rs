use axum::{
    extract::{Query, State},
    Extension, Json,
};

use super::utils::PageQuery;
use crate::app::AppState;
use crate::database::models::{Goal, GoalView};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::gamification::NewGoal;
use crate::types::{Caller, Page};

/// GET /api/goals - earliest deadline first
pub async fn list(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<GoalView>> {
    let page = state.goals.list(caller.organization_id, query.pagination(&state)).await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/goals - managers set goals for anyone in the organization,
/// leaders only for themselves
pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<NewGoal>,
) -> ApiResult<Goal> {
    if !caller.is_manager() && body.user_id != caller.user_id {
        return Err(ApiError::forbidden("Leaders can only create their own goals"));
    }
    let goal = state.goals.create(caller.organization_id, body).await?;
    Ok(ApiResponse::created(goal))
}
