use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use http_body_util::BodyExt;
use storefront_api::{router, AppState, ContentDirectory};
use storefront_core::config::QuizConfig;
use storefront_quiz::{QuestionCatalog, SessionStore};
use storefront_targeting::AudienceResolver;
use tempfile::TempDir;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn test_state(pages_dir: &Path) -> AppState {
    let catalog = Arc::new(QuestionCatalog::sizing_quiz().unwrap());
    AppState {
        sessions: Arc::new(SessionStore::new(catalog, Duration::from_secs(60), 100)),
        content: Arc::new(ContentDirectory::new(pages_dir)),
        resolver: AudienceResolver::default(),
        quiz: Arc::new(QuizConfig::default()),
        site_id: "test-site".to_string(),
        start_time: Instant::now(),
    }
}

async fn send(
    state: &AppState,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let builder = axum::http::Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(axum::body::Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(axum::body::Body::empty()).unwrap(),
    };
    let response = router(state.clone()).oneshot(req).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

async fn get(state: &AppState, uri: &str) -> (StatusCode, serde_json::Value) {
    send(state, "GET", uri, None).await
}

async fn post_json(
    state: &AppState,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(state, "POST", uri, Some(body)).await
}

async fn start_session(state: &AppState, flow: Option<&str>) -> String {
    let (status, json) =
        post_json(state, "/v1/quiz/sessions", serde_json::json!({ "flow": flow })).await;
    assert_eq!(status, StatusCode::CREATED);
    json["session"]["session_id"].as_str().unwrap().to_string()
}

async fn answer(state: &AppState, session: &str, question_id: &str, value: &str) -> serde_json::Value {
    let (status, json) = post_json(
        state,
        &format!("/v1/quiz/sessions/{session}/next"),
        serde_json::json!({ "question_id": question_id, "value": value }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    json
}

fn write_page(dir: &TempDir, slug: &str, page: serde_json::Value) {
    std::fs::write(
        dir.path().join(format!("{slug}.json")),
        serde_json::to_vec(&page).unwrap(),
    )
    .unwrap();
}

// ---------------------------------------------------------------------------
// Operational
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_site() {
    let dir = TempDir::new().unwrap();
    let state = test_state(dir.path());
    let (status, json) = get(&state, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["site_id"], "test-site");

    let (status, _) = get(&state, "/ready").await;
    assert_eq!(status, StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Quiz
// ---------------------------------------------------------------------------

#[tokio::test]
async fn question_lookup_and_step_number() {
    let dir = TempDir::new().unwrap();
    let state = test_state(dir.path());

    let (status, json) = get(&state, "/v1/quiz/questions/birthdate").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["question"]["id"], "birthdate");
    assert_eq!(json["step"], 2);
    assert_eq!(json["total_steps"], 5);

    let (status, json) = get(&state, "/v1/quiz/questions/shoe-size").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn overview_lists_flows() {
    let dir = TempDir::new().unwrap();
    let state = test_state(dir.path());
    let (status, json) = get(&state, "/v1/quiz/questions").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["question_order"][0], "baby");
    assert_eq!(json["flows"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn full_quiz_walk_reaches_results() {
    let dir = TempDir::new().unwrap();
    let state = test_state(dir.path());
    let session = start_session(&state, None).await;

    let json = answer(&state, &session, "baby", "born").await;
    assert_eq!(json["next_question_id"], "birthdate");
    assert_eq!(json["route"], "/sizing-quiz/birthdate");

    answer(&state, &session, "birthdate", "2026-03-01").await;
    answer(&state, &session, "name", "Rosie").await;
    let json = answer(&state, &session, "current-diaper", "2:pampers").await;
    assert_eq!(json["session"]["cursor"], 4);
    assert_eq!(json["session"]["answers"]["current-diaper"], "2:pampers");
    assert_eq!(json["step"], 5);
    assert_eq!(json["total_steps"], 5);

    let json = answer(&state, &session, "email", "rosie@example.com").await;
    assert_eq!(json["finished"], true);
    assert_eq!(json["route"], "/sizing-quiz/results");
    assert_eq!(json["session"]["status"], "completed");

    let (status, json) = post_json(
        &state,
        &format!("/v1/quiz/sessions/{session}/next"),
        serde_json::json!({ "question_id": "email", "value": "again" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["error"], "invalid_quiz_state");

    let (status, json) = get(&state, &format!("/v1/quiz/sessions/{session}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["route"], "/sizing-quiz/results");
}

#[tokio::test]
async fn expecting_branch_shortens_flow() {
    let dir = TempDir::new().unwrap();
    let state = test_state(dir.path());
    let session = start_session(&state, None).await;

    let json = answer(&state, &session, "baby", "expecting").await;
    assert_eq!(json["next_question_id"], "due-date");
    assert_eq!(json["total_steps"], 4);
    assert_eq!(json["session"]["flow"], "expecting");
}

#[tokio::test]
async fn set_answer_keeps_position() {
    let dir = TempDir::new().unwrap();
    let state = test_state(dir.path());
    let session = start_session(&state, Some("born")).await;

    let (status, json) = send(
        &state,
        "PUT",
        &format!("/v1/quiz/sessions/{session}/answers"),
        Some(serde_json::json!({ "question_id": "current-diaper-size", "value": "3" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["session"]["cursor"], 0);
    assert_eq!(json["session"]["answers"]["current-diaper-size"], "3");
    assert_eq!(json["route"], "/sizing-quiz/baby");
}

#[tokio::test]
async fn unknown_answer_keys_are_rejected() {
    let dir = TempDir::new().unwrap();
    let state = test_state(dir.path());
    let session = start_session(&state, None).await;

    for i in 0..20 {
        let (status, json) = send(
            &state,
            "PUT",
            &format!("/v1/quiz/sessions/{session}/answers"),
            Some(serde_json::json!({ "question_id": format!("junk-{i}"), "value": "x" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "unknown_answer_key");
    }

    let (status, json) = post_json(
        &state,
        &format!("/v1/quiz/sessions/{session}/next"),
        serde_json::json!({ "question_id": "junk", "value": "born" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "unknown_answer_key");

    let (_, json) = get(&state, &format!("/v1/quiz/sessions/{session}")).await;
    assert_eq!(json["session"]["answers"], serde_json::json!({}));
    assert_eq!(json["session"]["cursor"], 0);
}

#[tokio::test]
async fn create_session_without_body_uses_default_flow() {
    let dir = TempDir::new().unwrap();
    let state = test_state(dir.path());
    let (status, json) = send(&state, "POST", "/v1/quiz/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["session"]["flow"], "default");
    assert_eq!(json["session"]["current_question_id"], "baby");
}

#[tokio::test]
async fn session_errors() {
    let dir = TempDir::new().unwrap();
    let state = test_state(dir.path());

    let (status, json) =
        post_json(&state, "/v1/quiz/sessions", serde_json::json!({ "flow": "grandparents" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "unknown_flow");

    let missing = "6f1b7f4e-8a43-4c1e-9a55-3b0f2f4f9d11";
    let (status, json) = post_json(
        &state,
        &format!("/v1/quiz/sessions/{missing}/next"),
        serde_json::json!({ "question_id": "baby", "value": "born" }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "session_not_found");

    let session = start_session(&state, None).await;
    let (status, json) = post_json(
        &state,
        &format!("/v1/quiz/sessions/{session}/next"),
        serde_json::json!({ "question_id": "", "value": "born" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_request");
}

#[tokio::test]
async fn delete_session_discards_it() {
    let dir = TempDir::new().unwrap();
    let state = test_state(dir.path());
    let session = start_session(&state, None).await;

    let (status, _) = send(&state, "DELETE", &format!("/v1/quiz/sessions/{session}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = get(&state, &format!("/v1/quiz/sessions/{session}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&state, "DELETE", &format!("/v1/quiz/sessions/{session}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Pages and targeting
// ---------------------------------------------------------------------------

fn home_page() -> serde_json::Value {
    serde_json::json!({
        "slug": "home",
        "title": "Home",
        "components": [{ "type": "Hero" }, { "type": "ProductGrid" }],
        "audience_targeting": {
            "enabled": true,
            "variants": [
                {
                    "name": "holiday",
                    "targeting_rules": [
                        { "parameter_type": "utm_campaign", "value": "holiday", "match_type": "contains" }
                    ],
                    "components": [{ "type": "HolidayHero" }]
                },
                {
                    "name": "empty",
                    "targeting_rules": [
                        { "parameter_type": "query_param", "parameter_name": "promo", "value": "empty", "match_type": "exact" }
                    ],
                    "components": []
                }
            ]
        }
    })
}

#[tokio::test]
async fn page_resolves_variant_from_query() {
    let dir = TempDir::new().unwrap();
    write_page(&dir, "home", home_page());
    let state = test_state(dir.path());

    let (status, json) = get(&state, "/v1/pages/home?utm_campaign=Winter-Holiday").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["variant"], "holiday");
    assert_eq!(json["personalized"], true);
    assert_eq!(json["components"][0]["type"], "HolidayHero");

    let (status, json) = get(&state, "/v1/pages/home").await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["variant"].is_null());
    assert_eq!(json["components"].as_array().unwrap().len(), 2);

    let (_, json) = get(&state, "/v1/pages/home?promo=empty").await;
    assert_eq!(json["variant"], "empty");
    assert_eq!(json["personalized"], false);
    assert_eq!(json["components"][0]["type"], "Hero");
}

#[tokio::test]
async fn page_with_malformed_targeting_serves_defaults() {
    let dir = TempDir::new().unwrap();
    write_page(
        &dir,
        "offer",
        serde_json::json!({
            "slug": "offer",
            "components": [{ "type": "Offer" }],
            "audience_targeting": { "enabled": true, "variants": "oops" }
        }),
    );
    let state = test_state(dir.path());

    let (status, json) = get(&state, "/v1/pages/offer?utm_source=x").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["components"][0]["type"], "Offer");
    assert_eq!(json["personalized"], false);
}

#[tokio::test]
async fn page_lookup_errors() {
    let dir = TempDir::new().unwrap();
    let state = test_state(dir.path());

    let (status, _) = get(&state, "/v1/pages/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, json) = get(&state, "/v1/pages/bad.slug").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid_slug");
}

#[tokio::test]
async fn inline_resolution_falls_back_for_empty_variant() {
    let dir = TempDir::new().unwrap();
    let state = test_state(dir.path());

    let (status, json) = post_json(
        &state,
        "/v1/targeting/resolve",
        serde_json::json!({
            "targeting": {
                "enabled": true,
                "variants": [{
                    "name": "holiday",
                    "targeting_rules": [
                        { "parameter_type": "utm_source", "value": "mail", "match_type": "exact" }
                    ],
                    "components": []
                }]
            },
            "default_components": [{ "type": "A" }, { "type": "B" }],
            "query": { "utm_source": "mail" }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["variant"], "holiday");
    assert_eq!(json["components"][0]["type"], "A");
    assert_eq!(json["components"][1]["type"], "B");
}

#[tokio::test]
async fn inline_resolution_without_targeting_returns_defaults() {
    let dir = TempDir::new().unwrap();
    let state = test_state(dir.path());

    let (status, json) = post_json(
        &state,
        "/v1/targeting/resolve",
        serde_json::json!({
            "targeting": null,
            "default_components": [{ "type": "A" }],
            "query": { "utm_source": "anything" }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(json["variant"].is_null());
    assert_eq!(json["components"], serde_json::json!([{ "type": "A", "props": null }]));
}
