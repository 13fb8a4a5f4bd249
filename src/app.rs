//! Shared handler state and the HTTP router.

use axum::{
    http::{HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::assessment::Pipeline;
use crate::auth::JwtKeys;
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::services::{Achievements, Dashboard, Directory, Goals, Invitations};
use crate::store::{CallPolicy, Store};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Pipeline,
    pub directory: Directory,
    pub invitations: Invitations,
    pub achievements: Achievements,
    pub goals: Goals,
    pub dashboard: Dashboard,
    pub jwt: JwtKeys,
    /// Present when backed by Postgres; `/health` pings it
    pub database: Option<DatabaseManager>,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, jwt: JwtKeys, config: &AppConfig) -> Self {
        let policy = CallPolicy::from_config(&config.pipeline);

        Self {
            pipeline: Pipeline::new(store.clone(), policy),
            directory: Directory::new(store.clone(), policy),
            invitations: Invitations::new(store.clone(), policy, config.pipeline.invitation_ttl_hours),
            achievements: Achievements::new(store.clone(), policy),
            goals: Goals::new(store.clone(), policy),
            dashboard: Dashboard::new(store, policy),
            jwt,
            database: None,
            default_page_size: config.api.default_page_size,
            max_page_size: config.api.max_page_size,
        }
    }

    pub fn with_database(mut self, database: DatabaseManager) -> Self {
        self.database = Some(database);
        self
    }
}

pub fn app(state: AppState, config: &AppConfig) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/invitations/:token", get(public::invitation_validate))
        // Protected API
        .merge(protected_routes(state.clone()))
        .with_state(state);

    if config.security.enable_cors {
        router = router.layer(cors_layer(&config.security.cors_origins));
    }
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{achievements, assignments, auth, clients, dashboard, goals, invitations, tests};

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami))
        // Catalog
        .route("/api/tests", get(tests::list))
        .route("/api/tests/:id", get(tests::show))
        // Assignments
        .route("/api/assignments", get(assignments::list).post(assignments::create))
        .route("/api/assignments/stats", get(assignments::stats))
        .route("/api/assignments/:id", get(assignments::show))
        .route("/api/assignments/:id/complete", post(assignments::complete))
        .route("/api/assignments/:id/submit", post(assignments::submit))
        .route("/api/assignments/:id/result", get(assignments::result))
        // Directory
        .route("/api/clients", get(clients::list))
        .route("/api/clients/stats", get(clients::stats))
        .route("/api/invitations", get(invitations::list).post(invitations::create))
        // Gamification
        .route("/api/achievements", get(achievements::list).post(achievements::create))
        .route("/api/achievements/recent", get(achievements::recent))
        .route("/api/achievements/:id/award", post(achievements::award))
        .route("/api/goals", get(goals::list).post(goals::create))
        // Dashboard
        .route("/api/dashboard/stats", get(dashboard::stats))
        .route("/api/dashboard/ranking", get(dashboard::ranking))
        .route("/api/dashboard/progress", get(dashboard::progress))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([axum::http::header::AUTHORIZATION, axum::http::header::CONTENT_TYPE])
}
