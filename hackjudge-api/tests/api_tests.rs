//! Integration tests for hackjudge-api endpoints
//!
//! Tests cover:
//! - Create / read-all / partial update per entity
//! - Cascade deletes for projects and judges, none for criteria
//! - Score upsert identity
//! - Identifier validation and error status mapping
//! - Snapshot read idempotence and broadcast after mutations
//! - Behavior with the store unavailable

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use hackjudge_api::{build_router, AppState};
use hackjudge_common::db::Store;
use hackjudge_common::events::{EventBus, JudgingEvent};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::util::ServiceExt; // for `oneshot` method

/// Test helper: app over a fresh in-memory store
async fn setup_app(strict_references: bool) -> (Router, AppState) {
    let store = Store::open_in_memory()
        .await
        .expect("Should open in-memory store");
    let state = AppState::new(store, EventBus::new(16), strict_references);
    (build_router(state.clone()), state)
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Test helper: send a request and parse the JSON response
async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Should parse JSON")
    };
    (status, body)
}

async fn snapshot(app: &Router) -> Value {
    let (status, body) = send(app, request("GET", "/api/data", None)).await;
    assert_eq!(status, StatusCode::OK);
    body
}

async fn create(app: &Router, collection: &str, body: Value) -> Value {
    let (status, created) = send(
        app,
        request("POST", &format!("/api/{}", collection), Some(body)),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create {}: {}", collection, created);
    created
}

async fn submit_score(app: &Router, body: Value) -> Value {
    let (status, stored) = send(app, request("POST", "/api/scores", Some(body))).await;
    assert_eq!(status, StatusCode::OK, "score upsert: {}", stored);
    stored
}

fn scores_for<'a>(snapshot: &'a Value, field: &str, id: &str) -> Vec<&'a Value> {
    snapshot["scores"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s[field] == id)
        .collect()
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = setup_app(false).await;
    let (status, body) = send(&app, request("GET", "/health", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "hackjudge-api");
    assert!(body["version"].is_string());
}

// =============================================================================
// Create / read / update
// =============================================================================

#[tokio::test]
async fn test_create_then_snapshot_includes_entity() {
    let (app, _) = setup_app(false).await;

    let project = create(&app, "projects", json!({"name": "Beacon", "track": "Health"})).await;
    let judge = create(&app, "judges", json!({"name": "Ada", "tracks": ["Health"]})).await;
    let criterion = create(&app, "criteria", json!({"name": "Impact", "weight": 2})).await;

    for entity in [&project, &judge, &criterion] {
        assert!(entity["id"].as_str().map_or(false, |id| !id.is_empty()));
    }

    let data = snapshot(&app).await;
    assert_eq!(data["projects"][0], project);
    assert_eq!(data["judges"][0], judge);
    assert_eq!(data["criteria"][0], criterion);
    assert_eq!(data["scores"], json!([]));
}

#[tokio::test]
async fn test_create_many_returns_array() {
    let (app, _) = setup_app(false).await;

    let created = create(
        &app,
        "judges",
        json!([{"name": "Ada", "tracks": ["AI"]}, {"name": "Grace", "tracks": ["Health"]}]),
    )
    .await;
    let created = created.as_array().expect("array response");
    assert_eq!(created.len(), 2);
    assert_ne!(created[0]["id"], created[1]["id"]);

    let (status, listed) = send(&app, request("GET", "/api/judges", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_create_rejects_invalid_payload() {
    let (app, _) = setup_app(false).await;

    let (status, body) = send(
        &app,
        request("POST", "/api/projects", Some(json!({"track": "Health"}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    let bad_json = Request::builder()
        .method("POST")
        .uri("/api/criteria")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, bad_json).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_update_changes_only_given_fields() {
    let (app, _) = setup_app(false).await;
    let project = create(
        &app,
        "projects",
        json!({"name": "Beacon", "track": "Health", "description": "Wearable alerts"}),
    )
    .await;
    let id = project["id"].as_str().unwrap();

    let (status, updated) = send(
        &app,
        request("PUT", "/api/projects", Some(json!({"id": id, "table": "B12"}))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["table"], "B12");

    let data = snapshot(&app).await;
    let stored = &data["projects"][0];
    assert_eq!(stored["id"], id);
    assert_eq!(stored["name"], "Beacon");
    assert_eq!(stored["track"], "Health");
    assert_eq!(stored["description"], "Wearable alerts");
    assert_eq!(stored["table"], "B12");
}

#[tokio::test]
async fn test_update_replaces_top_level_fields() {
    let (app, _) = setup_app(false).await;
    let project = create(
        &app,
        "projects",
        json!({"name": "Beacon", "track": "Health", "links": {"repo": "r"}, "repoUrl": "x"}),
    )
    .await;
    let id = project["id"].as_str().unwrap();

    let (status, updated) = send(
        &app,
        request(
            "PUT",
            "/api/projects",
            Some(json!({"id": id, "links": {"demo": "d"}, "repoUrl": null})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{}", updated);

    let data = snapshot(&app).await;
    for stored in [&updated, &data["projects"][0]] {
        let fields = stored.as_object().unwrap();
        assert_eq!(stored["links"], json!({"demo": "d"}));
        assert_eq!(fields.get("repoUrl"), Some(&Value::Null));
        assert_eq!(stored["name"], "Beacon");
    }
}

#[tokio::test]
async fn test_update_unknown_id_is_not_found() {
    let (app, _) = setup_app(false).await;
    let missing = uuid::Uuid::new_v4().to_string();

    for collection in ["projects", "judges", "criteria"] {
        let (status, body) = send(
            &app,
            request(
                "PUT",
                &format!("/api/{}", collection),
                Some(json!({"id": missing, "name": "x"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", collection);
        assert_eq!(body["kind"], "not_found");
    }
}

#[tokio::test]
async fn test_malformed_ids_are_validation_errors() {
    let (app, _) = setup_app(false).await;

    for collection in ["projects", "judges", "criteria"] {
        let (status, body) = send(
            &app,
            request(
                "PUT",
                &format!("/api/{}", collection),
                Some(json!({"id": "P1", "name": "x"})),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "update {}", collection);
        assert_eq!(body["kind"], "validation");

        let (status, body) = send(
            &app,
            request("DELETE", &format!("/api/{}/not-a-uuid", collection), None),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "delete {}", collection);
        assert_eq!(body["kind"], "validation");
    }

    let (status, _) = send(&app, request("GET", "/api/judges/J1/projects", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Cascade deletes
// =============================================================================

#[tokio::test]
async fn test_delete_project_cascades_scores() {
    let (app, _) = setup_app(false).await;
    let p1 = create(&app, "projects", json!({"name": "Beacon", "track": "Health"})).await;
    let p2 = create(&app, "projects", json!({"name": "Atlas", "track": "Health"})).await;
    let p1_id = p1["id"].as_str().unwrap();

    submit_score(&app, json!({"id": "s1", "projectId": p1_id, "judgeId": "J1", "value": 7})).await;
    submit_score(&app, json!({"id": "s2", "projectId": p1_id, "judgeId": "J2", "value": 6})).await;
    submit_score(&app, json!({"id": "s3", "projectId": p2["id"], "judgeId": "J1", "value": 9})).await;

    let (status, body) = send(
        &app,
        request("DELETE", &format!("/api/projects/{}", p1_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["cascadedScores"], 2);

    let data = snapshot(&app).await;
    assert!(scores_for(&data, "projectId", p1_id).is_empty());
    assert_eq!(data["scores"].as_array().unwrap().len(), 1);
    assert_eq!(data["projects"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_delete_project_cascades_differently_cased_references() {
    let (app, _) = setup_app(false).await;
    let project = create(&app, "projects", json!({"name": "Beacon", "track": "Health"})).await;
    let id = project["id"].as_str().unwrap();

    let submitted = json!({"id": "s1", "projectId": id.to_uppercase(), "judgeId": "J1"});
    assert_eq!(submit_score(&app, submitted.clone()).await, submitted);

    let (status, body) = send(&app, request("DELETE", &format!("/api/projects/{}", id), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cascadedScores"], 1);
    assert_eq!(snapshot(&app).await["scores"], json!([]));
}

#[tokio::test]
async fn test_delete_judge_cascades_scores() {
    let (app, _) = setup_app(false).await;
    let j1 = create(&app, "judges", json!({"name": "Ada", "tracks": ["Health"]})).await;
    let j1_id = j1["id"].as_str().unwrap();

    submit_score(&app, json!({"id": "s1", "projectId": "P1", "judgeId": j1_id, "value": 7})).await;
    submit_score(&app, json!({"id": "s2", "projectId": "P2", "judgeId": j1_id, "value": 6})).await;
    submit_score(&app, json!({"id": "s3", "projectId": "P1", "judgeId": "other", "value": 9})).await;

    let (status, _) = send(
        &app,
        request("DELETE", &format!("/api/judges/{}", j1_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let data = snapshot(&app).await;
    assert!(scores_for(&data, "judgeId", j1_id).is_empty());
    assert_eq!(data["scores"][0]["id"], "s3");
}

#[tokio::test]
async fn test_delete_criterion_does_not_cascade() {
    let (app, _) = setup_app(false).await;
    let c1 = create(&app, "criteria", json!({"name": "Impact"})).await;
    let c1_id = c1["id"].as_str().unwrap();

    submit_score(
        &app,
        json!({"id": "s1", "projectId": "P1", "judgeId": "J1", "scores": {c1_id: 4}}),
    )
    .await;

    let (status, body) = send(
        &app,
        request("DELETE", &format!("/api/criteria/{}", c1_id), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cascadedScores"], 0);

    let data = snapshot(&app).await;
    assert_eq!(data["criteria"], json!([]));
    assert_eq!(data["scores"][0]["scores"][c1_id], 4);
}

#[tokio::test]
async fn test_delete_unknown_entity_is_not_found() {
    let (app, _) = setup_app(false).await;
    let missing = uuid::Uuid::new_v4();

    let (status, _) = send(
        &app,
        request("DELETE", &format!("/api/projects/{}", missing), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, request("DELETE", "/api/scores/nope", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Scores
// =============================================================================

#[tokio::test]
async fn test_score_upsert_is_idempotent_by_id() {
    let (app, _) = setup_app(false).await;

    let first = json!({"id": "S1", "projectId": "P1", "judgeId": "J1", "value": 8});
    let second = json!({
        "id": "S1",
        "projectId": "P1",
        "judgeId": "J1",
        "value": 5,
        "scores": {"c1": 8, "c2": 7.5}
    });

    assert_eq!(submit_score(&app, first).await["value"], 8);
    assert_eq!(submit_score(&app, second.clone()).await, second);

    let data = snapshot(&app).await;
    let scores = data["scores"].as_array().unwrap();
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0], second);
}

#[tokio::test]
async fn test_score_requires_identifiers() {
    let (app, _) = setup_app(false).await;

    let (status, body) = send(
        &app,
        request("POST", "/api/scores", Some(json!({"projectId": "P1", "judgeId": "J1"}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    let (status, _) = send(
        &app,
        request("POST", "/api/scores", Some(json!({"id": "", "projectId": "P1", "judgeId": "J1"}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_score() {
    let (app, _) = setup_app(false).await;
    submit_score(&app, json!({"id": "S1", "projectId": "P1", "judgeId": "J1"})).await;

    let (status, body) = send(&app, request("DELETE", "/api/scores/S1", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(snapshot(&app).await["scores"], json!([]));
}

#[tokio::test]
async fn test_strict_references_reject_dangling_score() {
    let (app, _) = setup_app(true).await;
    let project = create(&app, "projects", json!({"name": "Beacon", "track": "Health"})).await;
    let judge = create(&app, "judges", json!({"name": "Ada", "tracks": ["Health"]})).await;

    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/scores",
            Some(json!({"id": "S1", "projectId": project["id"], "judgeId": uuid::Uuid::new_v4().to_string()})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    submit_score(
        &app,
        json!({"id": "S1", "projectId": project["id"], "judgeId": judge["id"]}),
    )
    .await;
}

// =============================================================================
// Snapshot + synchronization
// =============================================================================

#[tokio::test]
async fn test_snapshot_read_is_idempotent() {
    let (app, _) = setup_app(false).await;
    create(&app, "projects", json!({"name": "Beacon", "track": "Health"})).await;
    submit_score(&app, json!({"id": "S1", "projectId": "P1", "judgeId": "J1", "value": 3})).await;

    let read = || async {
        let response = app
            .clone()
            .oneshot(request("GET", "/api/data", None))
            .await
            .unwrap();
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
    };

    assert_eq!(read().await, read().await);
}

#[tokio::test]
async fn test_mutations_broadcast_full_snapshot() {
    let (app, state) = setup_app(false).await;
    let mut rx = state.events.subscribe();

    let project = create(&app, "projects", json!({"name": "Beacon", "track": "Health"})).await;
    let JudgingEvent::DataUpdate {
        revision, payload, ..
    } = rx.try_recv().expect("create should broadcast");
    assert_eq!(revision, 1);
    assert_eq!(payload.projects.len(), 1);
    assert_eq!(payload.projects[0].id, project["id"]);

    submit_score(&app, json!({"id": "S1", "projectId": project["id"], "judgeId": "J1"})).await;
    let event = rx.try_recv().expect("score upsert should broadcast");
    assert_eq!(event.revision(), 2);

    // Failed mutations do not broadcast
    send(&app, request("DELETE", "/api/projects/bad-id", None)).await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_mutations_broadcast_in_snapshot_order() {
    let store = Store::open_in_memory()
        .await
        .expect("Should open in-memory store");
    let state = AppState::new(store, EventBus::new(64), false);
    let app = build_router(state.clone());
    let mut rx = state.events.subscribe();

    let creates = (0..20).map(|i| {
        let app = app.clone();
        async move { create(&app, "projects", json!({"name": format!("P{}", i), "track": "AI"})).await }
    });
    futures::future::join_all(creates).await;

    let mut events = Vec::new();
    while events.len() < 20 {
        let event = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .expect("broadcast within timeout")
            .expect("channel open");
        events.push(event);
    }

    let mut last_count = 0;
    for (i, event) in events.iter().enumerate() {
        let JudgingEvent::DataUpdate {
            revision, payload, ..
        } = event;
        assert_eq!(*revision, i as u64 + 1);
        assert!(payload.projects.len() >= last_count, "revision {} went back", revision);
        last_count = payload.projects.len();
    }
    assert_eq!(last_count, 20);
}

#[tokio::test]
async fn test_event_stream_starts_with_current_snapshot() {
    let (app, _) = setup_app(false).await;
    create(&app, "criteria", json!({"name": "Impact"})).await;

    let response = app
        .clone()
        .oneshot(request("GET", "/api/events", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );

    let mut body = response.into_body();
    let frame = body
        .frame()
        .await
        .expect("stream should yield")
        .expect("frame should be ok");
    let text = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();
    assert!(text.contains("event: DATA_UPDATE"), "{}", text);
    assert!(text.contains("\"Impact\""), "{}", text);
}

// =============================================================================
// Aggregation views
// =============================================================================

#[tokio::test]
async fn test_results_rank_projects_by_weighted_average() {
    let (app, _) = setup_app(false).await;
    let impact = create(&app, "criteria", json!({"name": "Impact", "weight": 2})).await;
    let impact_id = impact["id"].as_str().unwrap();
    let a = create(&app, "projects", json!({"name": "Atlas", "track": "Health"})).await;
    let b = create(&app, "projects", json!({"name": "Beacon", "track": "Health"})).await;

    submit_score(&app, json!({"id": "1", "projectId": a["id"], "judgeId": "J1", "scores": {impact_id: 2}})).await;
    submit_score(&app, json!({"id": "2", "projectId": b["id"], "judgeId": "J1", "scores": {impact_id: 4}})).await;

    let (status, results) = send(&app, request("GET", "/api/results", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(results[0]["track"], "Health");
    assert_eq!(results[0]["projects"][0]["name"], "Beacon");
    assert_eq!(results[0]["projects"][0]["average"], 8.0);
    assert_eq!(results[0]["projects"][0]["rank"], 1);
    assert_eq!(results[0]["projects"][1]["judgeCount"], 1);
}

#[tokio::test]
async fn test_judge_projects_filters_by_track() {
    let (app, _) = setup_app(false).await;
    let judge = create(&app, "judges", json!({"name": "Ada", "tracks": ["Health"]})).await;
    create(&app, "projects", json!({"name": "Beacon", "track": "Health"})).await;
    create(&app, "projects", json!({"name": "Cinder", "track": "Climate"})).await;

    let (status, projects) = send(
        &app,
        request("GET", &format!("/api/judges/{}/projects", judge["id"].as_str().unwrap()), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let projects = projects.as_array().unwrap();
    assert_eq!(projects.len(), 1);
    assert_eq!(projects[0]["name"], "Beacon");

    let (status, _) = send(
        &app,
        request("GET", &format!("/api/judges/{}/projects", uuid::Uuid::new_v4()), None),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Store unavailable
// =============================================================================

#[tokio::test]
async fn test_every_endpoint_reports_connection_error_when_store_is_down() {
    let (app, state) = setup_app(false).await;
    state.store.close().await;
    let id = uuid::Uuid::new_v4().to_string();

    let requests = vec![
        request("GET", "/api/data", None),
        request("GET", "/api/results", None),
        request("GET", "/api/projects", None),
        request("GET", "/api/scores", None),
        request("POST", "/api/projects", Some(json!({"name": "Beacon", "track": "Health"}))),
        request("PUT", "/api/judges", Some(json!({"id": id, "name": "Ada"}))),
        request("DELETE", &format!("/api/criteria/{}", id), None),
        request("POST", "/api/scores", Some(json!({"id": "S1", "projectId": "P1", "judgeId": "J1"}))),
        request("DELETE", "/api/scores/S1", None),
        request("GET", "/api/events", None),
        request("GET", &format!("/api/judges/{}/projects", id), None),
    ];

    for req in requests {
        let uri = req.uri().to_string();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE, "{}", uri);
        assert_eq!(body["kind"], "connection", "{}", uri);
        assert!(body["error"].as_str().unwrap().contains("unavailable"), "{}", uri);
    }

    let (status, body) = send(&app, request("GET", "/health", None)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "unavailable");
}
