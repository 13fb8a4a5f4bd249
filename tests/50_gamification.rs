mod common;

use anyhow::Result;
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

#[tokio::test]
async fn awarding_an_achievement_updates_ranking_and_dashboard() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let manager = app.manager_token();

    let (status, body) = app
        .post("/api/achievements", &manager, json!({ "title": "First Steps", "icon": "star", "points": 30 }))
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    let achievement_id = body["data"]["id"].as_str().unwrap_or_default().to_string();

    let award = format!("/api/achievements/{}/award", achievement_id);
    let (status, _) = app.post(&award, &manager, json!({ "user_id": app.fixture.leader.id })).await?;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = app.post(&award, &manager, json!({ "user_id": app.fixture.leader.id })).await?;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = app.get("/api/achievements/recent", &manager).await?;
    assert_eq!(body["data"][0]["achievement"]["title"], "First Steps");

    let (_, body) = app.get("/api/dashboard/ranking", &manager).await?;
    assert_eq!(body["data"][0]["name"], "Lucas Pereira");
    assert_eq!(body["data"][0]["points"], "30 pts");
    assert_eq!(body["data"][0]["initials"], "LP");

    let (status, body) = app.get("/api/dashboard/stats", &manager).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["active_clients"], 1);
    assert_eq!(body["data"]["total_achievements"], 1);
    assert_eq!(body["data"]["completion_rate"], 0);
    Ok(())
}

#[tokio::test]
async fn goals_are_created_and_listed() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let leader = app.leader_token();

    let goal = json!({
        "user_id": app.fixture.leader.id,
        "title": "Run four one-on-ones",
        "target_value": 4,
        "deadline": Utc::now() + Duration::days(14),
        "reward_points": 20
    });
    let (status, body) = app.post("/api/goals", &leader, goal).await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["status"], "active");
    assert_eq!(body["data"]["current_value"], 0);

    let (_, body) = app.get("/api/goals", &app.manager_token()).await?;
    assert_eq!(body["data"]["total"], 1);

    let (status, _) = app
        .post(
            "/api/goals",
            &leader,
            json!({
                "user_id": app.fixture.manager.id,
                "title": "Not mine",
                "target_value": 1,
                "deadline": Utc::now()
            }),
        )
        .await?;
    assert_eq!(status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn progress_reflects_assignments() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    app.assign_disc().await?;

    let (status, body) = app.get("/api/dashboard/progress", &app.manager_token()).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["value"], 0);
    assert_eq!(body["data"][2]["name"], "Assessments applied");
    assert_eq!(body["data"][2]["value"], 100);
    Ok(())
}
