use axum::extract::{Path, State};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::directory::TokenValidation;

/// GET /invitations/:token - check an invitation link before sign-up
///
/// Unknown and expired tokens both answer `{ "valid": false }`.
pub async fn validate(State(state): State<AppState>, Path(token): Path<String>) -> ApiResult<TokenValidation> {
    let validation = state.invitations.validate_token(&token).await?;
    Ok(ApiResponse::success(validation))
}
