mod common;

use anyhow::Result;
use axum::http::StatusCode;
use mentor_api_rust::store::StoreError;
use serde_json::json;

fn all_dominance() -> serde_json::Value {
    json!({ "answers": { "1": "D", "2": "D", "3": "D", "4": "D" } })
}

#[tokio::test]
async fn submission_scores_and_completes_the_assignment() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let id = app.assign_disc().await?;

    let (status, body) = app
        .post(&format!("/api/assignments/{}/submit", id), &app.leader_token(), all_dominance())
        .await?;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["score"], json!({ "D": 4, "I": 0, "S": 0, "C": 0 }));
    assert_eq!(body["data"]["dominant"], "D");

    let (_, body) = app.get(&format!("/api/assignments/{}", id), &app.manager_token()).await?;
    assert_eq!(body["data"]["status"], "completed");

    let (status, body) = app.get(&format!("/api/assignments/{}/result", id), &app.manager_token()).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["answers"]["3"], "D");
    Ok(())
}

#[tokio::test]
async fn second_submission_conflicts() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let id = app.assign_disc().await?;
    let path = format!("/api/assignments/{}/submit", id);

    let (status, _) = app.post(&path, &app.leader_token(), all_dominance()).await?;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .post(&path, &app.leader_token(), json!({ "answers": { "1": "I" } }))
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (_, body) = app.get(&format!("/api/assignments/{}/result", id), &app.leader_token()).await?;
    assert_eq!(body["data"]["score"]["D"], 4);
    Ok(())
}

#[tokio::test]
async fn manually_completed_assignment_cannot_be_submitted() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let id = app.assign_disc().await?;

    let (status, _) = app
        .post(&format!("/api/assignments/{}/complete", id), &app.manager_token(), json!({}))
        .await?;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post(&format!("/api/assignments/{}/submit", id), &app.leader_token(), all_dominance())
        .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, _) = app.get(&format!("/api/assignments/{}/result", id), &app.leader_token()).await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn duplicate_question_keys_are_unprocessable() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let id = app.assign_disc().await?;

    let (status, body) = app
        .post(
            &format!("/api/assignments/{}/submit", id),
            &app.leader_token(),
            json!({ "answers": { "1": "D", "01": "I" } }),
        )
        .await?;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);
    Ok(())
}

#[tokio::test]
async fn invalid_answers_are_unprocessable() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let id = app.assign_disc().await?;
    let path = format!("/api/assignments/{}/submit", id);
    let token = app.leader_token();

    for answers in [json!({ "99": "D" }), json!({ "1": "X" }), json!({ "one": "D" }), json!({})] {
        let (status, body) = app.post(&path, &token, json!({ "answers": answers })).await?;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY, "{}", body);
    }

    let (_, body) = app.get(&format!("/api/assignments/{}", id), &token).await?;
    assert_eq!(body["data"]["status"], "pending");
    Ok(())
}

#[tokio::test]
async fn only_the_assignee_can_submit() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let id = app.assign_disc().await?;

    let (status, _) = app
        .post(&format!("/api/assignments/{}/submit", id), &app.manager_token(), all_dominance())
        .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn store_outage_maps_to_service_unavailable() -> Result<()> {
    let app = common::TestApp::spawn().await?;
    let id = app.assign_disc().await?;

    // Every read attempt of the submission fails
    for _ in 0..3 {
        app.store.fail_next(StoreError::Unavailable("connection refused".into()));
    }
    let (status, body) = app
        .post(&format!("/api/assignments/{}/submit", id), &app.leader_token(), all_dominance())
        .await?;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
    Ok(())
}
