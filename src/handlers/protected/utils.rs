use serde::Deserialize;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;
use crate::types::{Caller, Pagination};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    pub fn pagination(&self, state: &AppState) -> Pagination {
        Pagination::new(self.page.unwrap_or(1), self.limit.unwrap_or(state.default_page_size))
            .capped(state.max_page_size)
    }
}

pub fn require_manager(caller: &Caller) -> Result<(), ApiError> {
    if caller.is_manager() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Manager role required"))
    }
}

pub fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("Invalid UUID: {}", raw)))
}
