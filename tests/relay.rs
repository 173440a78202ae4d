//! Relay HTTP surface, driven in-process with `tower::ServiceExt::oneshot`
//! and over a real socket for the client.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tower::ServiceExt;

use tillprint::channel::relay::{RelayChannel, RelayClient};
use tillprint::channel::{Channel, ChannelKind};
use tillprint::error::TillError;
use tillprint::receipt::{LineItem, OrderType, Receipt, ReceiptParts};
use tillprint::server::api::PrintMode;
use tillprint::server::spool::{PrintPrimitive, SpoolJob, Spooler};
use tillprint::server::{RelayConfig, router_with_spooler};

fn config(simulate: bool) -> RelayConfig {
    RelayConfig {
        listen_addr: "127.0.0.1:0".into(),
        printer: "POS-80".into(),
        device: None,
        simulate,
        environment: if simulate { "development" } else { "production" }.into(),
    }
}

/// Primitive that records its jobs and succeeds or fails on demand.
struct Recorder {
    name: &'static str,
    ok: bool,
    jobs: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl PrintPrimitive for Recorder {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn submit(&self, job: &SpoolJob) -> Result<(), TillError> {
        self.jobs.lock().unwrap().push(job.title.clone());
        if self.ok {
            Ok(())
        } else {
            Err(TillError::Spool(format!("{} offline", self.name)))
        }
    }
}

fn app(simulate: bool, outcomes: &[(&'static str, bool)]) -> (Router, Arc<Mutex<Vec<String>>>) {
    let jobs = Arc::new(Mutex::new(Vec::new()));
    let primitives = outcomes
        .iter()
        .map(|&(name, ok)| {
            Box::new(Recorder {
                name,
                ok,
                jobs: jobs.clone(),
            }) as Box<dyn PrintPrimitive>
        })
        .collect();
    (
        router_with_spooler(config(simulate), Spooler::new(primitives)),
        jobs,
    )
}

fn receipt() -> Receipt {
    Receipt::new(ReceiptParts {
        restaurant_name: None,
        address_lines: None,
        order_type: OrderType::Delivery,
        table_number: None,
        building_name: Some("Tower B".into()),
        customer_name: Some("Aye Aye".into()),
        order_id: "D-42".into(),
        timestamp: NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(19, 5, 0)
            .unwrap(),
        line_items: vec![LineItem::new("Water", 2, Decimal::new(1000, 2))],
        total: Decimal::new(2000, 2),
        payment_method: None,
        note: None,
        footer_message: None,
    })
    .unwrap()
}

fn print_request(body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/print")
        .header(header::CONTENT_TYPE, "application/json")
        .body(body.into())
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_malformed_body_is_400() {
    let (app, jobs) = app(false, &[("ok", true)]);

    let (status, body) = send(app, print_request("{not json")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["message"], json!("Invalid receipt"));
    assert!(body["error"].is_string());
    assert!(jobs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_receipt_is_400() {
    let (app, jobs) = app(false, &[("ok", true)]);
    let payload = json!({
        "order_type": "delivery",
        "order_id": "D-43",
        "timestamp": "2026-10-16T19:05:00",
        "line_items": [{"name": "Water", "quantity": 1, "unit_price": "10.00"}],
        "total": "10.00"
    });

    let (status, body) = send(app, print_request(payload.to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("building"));
    assert!(jobs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_simulation_skips_hardware() {
    let (app, jobs) = app(true, &[("ok", true)]);
    let payload = serde_json::to_string(&receipt()).unwrap();

    let (status, body) = send(app, print_request(payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "success": true,
            "message": "Receipt printed successfully",
            "mode": "simulation",
            "order_id": "D-42"
        })
    );
    assert!(jobs.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_first_working_primitive_prints() {
    let (app, jobs) = app(false, &[("raw-device", false), ("queue-submit", true)]);
    let payload = serde_json::to_string(&receipt()).unwrap();

    let (status, body) = send(app, print_request(payload)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["mode"], json!("actual"));
    assert_eq!(
        body["message"],
        json!("Receipt printed successfully via queue-submit")
    );
    assert_eq!(*jobs.lock().unwrap(), vec!["Receipt D-42", "Receipt D-42"]);
}

#[tokio::test]
async fn test_all_primitives_failing_is_500() {
    let (app, _) = app(false, &[("raw-device", false), ("queue-submit", false)]);
    let payload = serde_json::to_string(&receipt()).unwrap();

    let (status, body) = send(app, print_request(payload)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["message"], json!("Print failed"));
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("raw-device offline"));
    assert!(error.contains("queue-submit offline"));
}

#[tokio::test]
async fn test_health() {
    let (app, _) = app(true, &[]);
    let request = Request::get("/health").body(Body::empty()).unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("OK"));
    let timestamp = body["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
}

#[tokio::test]
async fn test_printer_status_in_simulation() {
    let (app, _) = app(true, &[]);
    let request = Request::get("/printer/status").body(Body::empty()).unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connected"], json!(false));
    assert_eq!(body["status"], json!("simulation"));
    assert_eq!(body["mode"], json!("simulation"));
    assert_eq!(body["environment"], json!("development"));
    assert_eq!(body["printer"], json!("POS-80"));
}

#[tokio::test]
async fn test_cors_allows_browser_clients() {
    let (app, _) = app(true, &[]);
    let request = Request::get("/health")
        .header(header::ORIGIN, "http://tablet.local")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

/// Serve `app` on an ephemeral port; returns its base URL.
async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A base URL nothing listens on.
async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_client_falls_back_to_next_relay() {
    let (app, jobs) = app(false, &[("raw-device", true)]);
    let live = spawn(app).await;
    let client = RelayClient::new(&dead_url().await, Duration::from_secs(2))
        .unwrap()
        .with_fallback_urls([format!("{}/", live)]);

    let response = client.print(&receipt()).await.unwrap();

    assert!(response.success);
    assert_eq!(response.mode, Some(PrintMode::Actual));
    assert_eq!(response.order_id.as_deref(), Some("D-42"));
    assert_eq!(*jobs.lock().unwrap(), vec!["Receipt D-42"]);

    let health = client.health().await.unwrap();
    assert_eq!(health.status, "OK");
}

#[tokio::test]
async fn test_client_skips_relay_answering_500() {
    let (failing, _) = app(false, &[("raw-device", false)]);
    let (working, jobs) = app(false, &[("raw-device", true)]);
    let failing = spawn(failing).await;
    let working = spawn(working).await;
    let client = RelayClient::new(&failing, Duration::from_secs(2))
        .unwrap()
        .with_fallback_urls([working]);

    let response = client.print(&receipt()).await.unwrap();

    assert!(response.success);
    assert_eq!(jobs.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_relay_channel_reports_every_relay() {
    let (failing, _) = app(false, &[("raw-device", false)]);
    let failing = spawn(failing).await;
    let dead = dead_url().await;
    let client = RelayClient::new(&failing, Duration::from_secs(2))
        .unwrap()
        .with_fallback_urls([dead.clone()]);
    let channel = RelayChannel::new(client);

    assert_eq!(channel.kind(), ChannelKind::RelayService);
    let err = channel.print(&receipt()).await.unwrap_err();

    let TillError::Relay(message) = err else {
        panic!("expected a relay error, got {:?}", err);
    };
    assert!(message.contains("HTTP 500: Print failed"));
    assert!(message.contains(&dead));
}
