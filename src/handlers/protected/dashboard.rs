use axum::{extract::State, Extension};

use super::utils::require_manager;
use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::dashboard::{ManagerStats, ProgressItem, RankingEntry};
use crate::types::Caller;

/// GET /api/dashboard/stats
pub async fn stats(State(state): State<AppState>, Extension(caller): Extension<Caller>) -> ApiResult<ManagerStats> {
    require_manager(&caller)?;
    let stats = state.dashboard.manager_stats(caller.organization_id, caller.user_id).await?;
    Ok(ApiResponse::success(stats))
}

/// GET /api/dashboard/ranking - top five leaders by points
pub async fn ranking(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Vec<RankingEntry>> {
    let ranking = state.dashboard.ranking(caller.organization_id).await?;
    Ok(ApiResponse::success(ranking))
}

/// GET /api/dashboard/progress
pub async fn progress(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> ApiResult<Vec<ProgressItem>> {
    let progress = state.dashboard.progress(caller.organization_id, caller.user_id).await?;
    Ok(ApiResponse::success(progress))
}
