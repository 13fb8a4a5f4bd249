use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::utils::{parse_id, require_manager, PageQuery};
use crate::app::AppState;
use crate::database::models::{Achievement, UnlockView, UserAchievement};
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::gamification::NewAchievement;
use crate::types::{Caller, Page};

const DEFAULT_RECENT: u32 = 5;

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AwardAchievement {
    pub user_id: Uuid,
}

/// GET /api/achievements - lowest points first
pub async fn list(State(state): State<AppState>, Query(query): Query<PageQuery>) -> ApiResult<Page<Achievement>> {
    let page = state.achievements.list(query.pagination(&state)).await?;
    Ok(ApiResponse::success(page))
}

/// POST /api/achievements
pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<NewAchievement>,
) -> ApiResult<Achievement> {
    require_manager(&caller)?;
    let achievement = state.achievements.create(body).await?;
    Ok(ApiResponse::created(achievement))
}

/// GET /api/achievements/recent - latest unlocks in the caller's organization
pub async fn recent(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<RecentQuery>,
) -> ApiResult<Vec<UnlockView>> {
    let limit = query.limit.unwrap_or(DEFAULT_RECENT).clamp(1, state.max_page_size.max(1));
    let unlocks = state.achievements.recent_unlocks(caller.organization_id, limit).await?;
    Ok(ApiResponse::success(unlocks))
}

/// POST /api/achievements/:id/award
pub async fn award(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(id): Path<String>,
    Json(body): Json<AwardAchievement>,
) -> ApiResult<UserAchievement> {
    require_manager(&caller)?;
    let unlock = state
        .achievements
        .award(caller.organization_id, body.user_id, parse_id(&id)?)
        .await?;
    Ok(ApiResponse::created(unlock))
}
