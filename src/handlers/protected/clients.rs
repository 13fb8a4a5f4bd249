use axum::{
    extract::{Query, State},
    Extension,
};

use super::utils::{require_manager, PageQuery};
use crate::app::AppState;
use crate::database::models::Profile;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::directory::ClientStats;
use crate::types::{Caller, Page};

/// GET /api/clients - the organization's leaders, by name
pub async fn list(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Page<Profile>> {
    require_manager(&caller)?;
    let page = state.directory.list_leaders(caller.organization_id, query.pagination(&state)).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/clients/stats
pub async fn stats(State(state): State<AppState>, Extension(caller): Extension<Caller>) -> ApiResult<ClientStats> {
    require_manager(&caller)?;
    let stats = state.directory.client_stats(caller.organization_id).await?;
    Ok(ApiResponse::success(stats))
}
