//! Integration tests: REST client against a mock backend (mocko-sync).

use mocko_core::SaveDesignRequest;
use mocko_sync::{ApiClient, ApiError, DesignStore, RetryPolicy, SyncConfig};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    let config = SyncConfig {
        api_base_url: server.uri(),
        retry: RetryPolicy {
            base_delay_ms: 10,
            ..RetryPolicy::default()
        },
        ..SyncConfig::default()
    };
    let client = ApiClient::new(&config).unwrap();
    client.set_token(Some("tok".into()));
    client
}

fn design_json(id: &str, name: &str) -> serde_json::Value {
    json!({
        "_id": id,
        "name": name,
        "canvasData": "{\"version\":\"5.3.0\",\"objects\":[]}",
        "width": 800,
        "height": 600,
        "isPremium": false,
        "createdAt": "2024-05-01T10:00:00Z"
    })
}

fn save_request(design_id: Option<&str>) -> SaveDesignRequest {
    SaveDesignRequest {
        design_id: design_id.map(str::to_string),
        name: "Poster".into(),
        canvas_data: "{\"version\":\"5.3.0\",\"objects\":[]}".into(),
        width: 800.0,
        height: 600.0,
        category: None,
    }
}

// ─── Designs ────────────────────────────────────────────────────────────

#[tokio::test]
async fn lists_designs_from_wrapped_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/designs"))
        .and(header("authorization", "Bearer tok"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [design_json("d1", "Poster"), design_json("d2", "Flyer")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let designs = client_for(&server).list_designs().await.unwrap();
    let names: Vec<&str> = designs.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Poster", "Flyer"]);
    assert_eq!(designs[0].id, "d1");
    assert_eq!(designs[1].scene().object_count(), 0);
}

#[tokio::test]
async fn gets_one_design_from_bare_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/designs/d7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(design_json("d7", "Card")))
        .mount(&server)
        .await;

    let design = client_for(&server).get_design("d7").await.unwrap();
    assert_eq!(design.id, "d7");
    assert_eq!(design.width, 800.0);
}

#[tokio::test]
async fn save_posts_request_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/designs"))
        .and(header("authorization", "Bearer tok"))
        .and(body_partial_json(json!({ "designId": "d1", "name": "Poster", "width": 800.0 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": design_json("d1", "Poster")
        })))
        .expect(1)
        .mount(&server)
        .await;

    let record = client_for(&server)
        .save_design(&save_request(Some("d1")))
        .await
        .unwrap();
    assert_eq!(record.id, "d1");
}

#[tokio::test]
async fn delete_accepts_empty_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v1/designs/d1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server).delete_design("d1").await.unwrap();
}

// ─── Errors & retry ─────────────────────────────────────────────────────

#[tokio::test]
async fn unauthorized_is_reported_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/designs"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let err = client_for(&server).list_designs().await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));
}

#[tokio::test]
async fn client_errors_carry_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/designs/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Design not found" })))
        .expect(1)
        .mount(&server)
        .await;

    match client_for(&server).get_design("missing").await {
        Err(ApiError::Status { status, message }) => {
            assert_eq!(status.as_u16(), 404);
            assert_eq!(message, "Design not found");
        }
        other => panic!("expected a status error, got {other:?}"),
    }
}

#[tokio::test]
async fn server_errors_are_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/designs"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/designs"))
        .respond_with(ResponseTemplate::new(201).set_body_json(design_json("new", "Poster")))
        .expect(1)
        .mount(&server)
        .await;

    let record = client_for(&server)
        .save_design(&save_request(None))
        .await
        .unwrap();
    assert_eq!(record.id, "new");
}

#[tokio::test]
async fn retries_stop_after_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/subscription"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(3)
        .mount(&server)
        .await;

    match client_for(&server).subscription().await {
        Err(ApiError::Status { status, message }) => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(message, "boom");
        }
        other => panic!("expected a status error, got {other:?}"),
    }
}

// ─── Subscription ───────────────────────────────────────────────────────

#[tokio::test]
async fn reads_subscription_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/subscription"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "isPremium": true, "plan": "pro", "status": "active" }
        })))
        .mount(&server)
        .await;

    let sub = client_for(&server).subscription().await.unwrap();
    assert!(sub.is_premium);
    assert_eq!(sub.plan.as_deref(), Some("pro"));
    assert_eq!(sub.current_period_end, None);
}
