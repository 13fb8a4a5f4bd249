use axum::extract::{Path, Query, State};

use super::utils::{parse_id, PageQuery};
use crate::app::AppState;
use crate::assessment::{Test, TestSummary};
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::Page;

/// GET /api/tests - published tests, newest first
pub async fn list(State(state): State<AppState>, Query(query): Query<PageQuery>) -> ApiResult<Page<TestSummary>> {
    let page = state.pipeline.catalog.list_tests(query.pagination(&state)).await?;
    Ok(ApiResponse::success(page))
}

/// GET /api/tests/:id - full test including questions
pub async fn show(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Test> {
    let test = state.pipeline.catalog.get_test(parse_id(&id)?).await?;
    Ok(ApiResponse::success(test))
}
