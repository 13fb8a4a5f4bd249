use axum::{extract::State, Extension};
use serde::Serialize;

use crate::app::AppState;
use crate::database::models::Profile;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::ServiceError;
use crate::types::Caller;

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    #[serde(flatten)]
    pub caller: Caller,
    pub profile: Option<Profile>,
}

/// GET /api/auth/whoami - the verified caller and their profile, if one exists
pub async fn whoami(State(state): State<AppState>, Extension(caller): Extension<Caller>) -> ApiResult<WhoAmI> {
    let profile = match state.directory.get_profile(caller.user_id).await {
        Ok(profile) => Some(profile),
        Err(ServiceError::NotFound { .. }) => None,
        Err(e) => return Err(e.into()),
    };
    Ok(ApiResponse::success(WhoAmI { caller, profile }))
}
