use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - service banner and route overview
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Mentor API (Rust)",
            "version": version,
            "description": "Mentoring backend: DISC assessments, assignments, gamification",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "invitations": "/invitations/:token (public - token check)",
                "auth": "/api/auth/whoami (protected)",
                "tests": "/api/tests[/:id] (protected)",
                "assignments": "/api/assignments[/:id[/complete|/submit|/result]] (protected)",
                "clients": "/api/clients[/stats] (protected)",
                "achievements": "/api/achievements[/recent] (protected)",
                "goals": "/api/goals (protected)",
                "dashboard": "/api/dashboard/stats|ranking|progress (protected)",
            }
        }
    }))
}

/// GET /health - liveness plus a database ping when Postgres backs the store
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    let Some(database) = state.database.as_ref() else {
        return (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "memory" }
            })),
        );
    };

    match database.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => {
            tracing::warn!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": true,
                    "message": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": { "status": "degraded", "timestamp": now }
                })),
            )
        }
    }
}
