use axum::{extract::State, Extension, Json};
use serde::Deserialize;

use super::utils::require_manager;
use crate::app::AppState;
use crate::database::models::Invitation;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::Caller;

#[derive(Debug, Deserialize)]
pub struct CreateInvitation {
    pub email: String,
}

/// GET /api/invitations - newest first
pub async fn list(State(state): State<AppState>, Extension(caller): Extension<Caller>) -> ApiResult<Vec<Invitation>> {
    require_manager(&caller)?;
    let invitations = state.invitations.list(caller.organization_id).await?;
    Ok(ApiResponse::success(invitations))
}

/// POST /api/invitations - invite a leader; the response carries the token
pub async fn create(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Json(body): Json<CreateInvitation>,
) -> ApiResult<Invitation> {
    require_manager(&caller)?;
    let invitation = state.invitations.create(&body.email, caller.organization_id).await?;
    Ok(ApiResponse::created(invitation))
}
