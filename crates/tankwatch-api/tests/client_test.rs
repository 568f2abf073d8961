#![allow(clippy::unwrap_used)]
// Integration tests for `FuelApiClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tankwatch_api::{Endpoints, Error, FuelApiClient, OrderRequest};

// ── Helpers ─────────────────────────────────────────────────────────

/// One mock server plays both the level service and the order API
/// (mounted under `/api/`).
async fn setup() -> (MockServer, FuelApiClient) {
    let server = MockServer::start().await;
    let base = Url::parse(&server.uri()).unwrap();
    let endpoints = Endpoints::new(base.clone(), base.join("/api/").unwrap());
    let client = FuelApiClient::with_client(reqwest::Client::new(), endpoints);
    (server, client)
}

fn order() -> OrderRequest {
    OrderRequest {
        name: "Auto Generated Order".into(),
        oil_type: "Diesel".into(),
        station: 3,
        email: "ops@station3.example".into(),
    }
}

// ── Level service ───────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_level() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/get_level"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "level": 64 })))
        .mount(&server)
        .await;

    let level = client.fetch_level().await.unwrap();
    assert!((level.value() - 64.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_fetch_level_null_reads_as_zero() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/get_level"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "level": null })))
        .mount(&server)
        .await;

    let level = client.fetch_level().await.unwrap();
    assert!(level.value().abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_fetch_level_server_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/get_level"))
        .respond_with(ResponseTemplate::new(500).set_body_string("sensor offline"))
        .mount(&server)
        .await;

    let err = client.fetch_level().await.unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "sensor offline");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_level_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/get_level"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy</html>"))
        .mount(&server)
        .await;

    let err = client.fetch_level().await.unwrap_err();
    assert!(
        matches!(err, Error::Deserialization { ref body, .. } if body.contains("proxy")),
        "got {err:?}"
    );
}

// ── Orders ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_order_posts_wire_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/orders/"))
        .and(body_json(json!({
            "name": "Auto Generated Order",
            "oil_type": "Diesel",
            "station": 3,
            "email": "ops@station3.example"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 41 })))
        .expect(1)
        .mount(&server)
        .await;

    client.create_order(&order()).await.unwrap();
}

#[tokio::test]
async fn test_create_order_rejected() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/orders/"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "station": ["Invalid pk \"3\" - object does not exist."] })),
        )
        .mount(&server)
        .await;

    let err = client.create_order(&order()).await.unwrap_err();
    assert_eq!(err.status(), Some(400));
    assert!(!err.is_transient());
}

#[tokio::test]
async fn test_send_reorder_notification() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/send-Order/"))
        .and(body_json(json!({ "email": "ops@station3.example" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client
        .send_reorder_notification("ops@station3.example")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_list_orders() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/orders/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": 1,
                "name": "Auto Generated Order",
                "oil_type": "Diesel",
                "station": 3,
                "email": "ops@station3.example",
                "status": "Pending",
                "created_at": "2026-03-01T10:15:00Z"
            },
            { "id": 2, "name": "Weekly top-up", "station": 5, "status": "Approved" }
        ])))
        .mount(&server)
        .await;

    let orders = client.list_orders().await.unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0].status, "Pending");
    assert_eq!(orders[1].station, Some(5));
    assert!(orders[1].created_at.is_none());
}

#[tokio::test]
async fn test_get_order() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/orders/12/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 12,
            "name": "Auto Generated Order",
            "station": 3,
            "email": "ops@station3.example",
            "status": "Pending"
        })))
        .mount(&server)
        .await;

    let order = client.get_order(12).await.unwrap();
    assert_eq!(order.id, 12);
    assert_eq!(order.email, "ops@station3.example");
}

#[tokio::test]
async fn test_approve_order_flow() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/orders/7/"))
        .and(body_json(json!({ "status": "Approved" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 7 })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/send-Order-Approved/"))
        .and(body_json(json!({ "email": "ops@station3.example" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    client.approve_order(7).await.unwrap();
    client
        .send_approval_notification("ops@station3.example")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_approve_missing_order() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/api/orders/999/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Not found." })))
        .mount(&server)
        .await;

    let err = client.approve_order(999).await.unwrap_err();
    assert!(err.is_not_found(), "got {err:?}");
}

#[tokio::test]
async fn test_unreachable_server_is_transient() {
    let endpoints = Endpoints::new(
        Url::parse("http://127.0.0.1:9").unwrap(),
        Url::parse("http://127.0.0.1:9/api/").unwrap(),
    );
    let client = FuelApiClient::with_client(reqwest::Client::new(), endpoints);

    let err = client.fetch_level().await.unwrap_err();
    assert!(err.is_transient(), "got {err:?}");
}
