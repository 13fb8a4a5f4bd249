#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use mentor_api_rust::{
    app::{app, AppState},
    assessment::fixtures::{self, Fixture},
    auth::JwtKeys,
    config::{AppConfig, Environment},
    store::MemoryStore,
    types::{Caller, Role},
};

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub fixture: Fixture,
    jwt: JwtKeys,
}

impl TestApp {
    /// Router over a seeded in-memory store
    pub async fn spawn() -> Result<Self> {
        let mut config = AppConfig::for_environment(Environment::Development);
        config.security.jwt_secret = "integration-secret".to_string();
        config.api.enable_request_logging = false;

        let store = Arc::new(MemoryStore::new());
        let fixture = fixtures::seed(&*store).await?;
        let jwt = JwtKeys::new(&config.security.jwt_secret, 1)?;
        let router = app(AppState::new(store.clone(), jwt.clone(), &config), &config);

        Ok(Self { router, store, fixture, jwt })
    }

    pub fn token_for(&self, user_id: Uuid, role: Role) -> String {
        let caller = Caller::new(user_id, self.fixture.organization.id, role);
        self.jwt.issue(&caller).expect("token")
    }

    pub fn manager_token(&self) -> String {
        self.token_for(self.fixture.manager.id, Role::Manager)
    }

    pub fn leader_token(&self) -> String {
        self.token_for(self.fixture.leader.id, Role::Leader)
    }

    pub async fn request(&self, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let payload = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
        Ok((status, payload))
    }

    pub async fn get(&self, path: &str, token: &str) -> Result<(StatusCode, Value)> {
        self.request(Method::GET, path, Some(token), None).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> Result<(StatusCode, Value)> {
        self.request(Method::POST, path, Some(token), Some(body)).await
    }

    /// Assign disc-basic to the seeded leader, returning the assignment id
    pub async fn assign_disc(&self) -> Result<String> {
        let (status, payload) = self
            .post(
                "/api/assignments",
                &self.manager_token(),
                serde_json::json!({ "leader_id": self.fixture.leader.id, "test_id": self.fixture.test.id }),
            )
            .await?;
        assert_eq!(status, StatusCode::CREATED, "assign failed: {}", payload);
        Ok(payload["data"]["id"].as_str().unwrap_or_default().to_string())
    }
}
