use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Form, Json, Router};
use chrono::NaiveDate;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{json, Value};

use sitepulse_core::analytics::DateRange;
use sitepulse_core::report::ReportFetcher;
use sitepulse_server::ga4::auth::AssertionClaims;
use sitepulse_server::ga4::{Ga4Client, Ga4Error, ServiceAccountKey};

const PRIVATE_PEM: &str = include_str!("fixtures/test_key.pem");
const PUBLIC_PEM: &str = include_str!("fixtures/test_key.pub.pem");
const CLIENT_EMAIL: &str = "sync@demo.iam.gserviceaccount.com";

// ============================================================
// Mock Google endpoints
// ============================================================

#[derive(Default)]
struct MockGoogle {
    token_uri: std::sync::OnceLock<String>,
    token_calls: AtomicUsize,
    report_calls: AtomicUsize,
}

async fn token(
    State(mock): State<Arc<MockGoogle>>,
    Form(form): Form<HashMap<String, String>>,
) -> impl IntoResponse {
    mock.token_calls.fetch_add(1, Ordering::SeqCst);
    if form.get("grant_type").map(String::as_str)
        != Some("urn:ietf:params:oauth:grant-type:jwt-bearer")
    {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "unsupported_grant_type"})));
    }

    let Some(assertion) = form.get("assertion") else {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid_request"})));
    };
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[mock.token_uri.get().map(String::as_str).unwrap_or_default()]);
    let key = DecodingKey::from_rsa_pem(PUBLIC_PEM.as_bytes()).expect("public key");
    match decode::<AssertionClaims>(assertion, &key, &validation) {
        Ok(data) if data.claims.iss == CLIENT_EMAIL => (
            StatusCode::OK,
            Json(json!({"access_token": "ya29.test", "expires_in": 3599, "token_type": "Bearer"})),
        ),
        _ => (StatusCode::BAD_REQUEST, Json(json!({"error": "invalid_grant"}))),
    }
}

async fn denied_token() -> impl IntoResponse {
    (StatusCode::UNAUTHORIZED, Json(json!({"error": "invalid_client"})))
}

async fn run_report(
    State(mock): State<Arc<MockGoogle>>,
    Path(report): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    mock.report_calls.fetch_add(1, Ordering::SeqCst);
    let bearer = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if bearer != "Bearer ya29.test" {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": {"code": 401}})));
    }
    if report != "123456:runReport" {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({"error": {"code": 403, "message": "User does not have sufficient permissions"}})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "echo": body,
            "dimensionHeaders": [{"name": "date"}, {"name": "pagePath"}],
            "rows": [],
            "rowCount": 0
        })),
    )
}

async fn spawn_mock() -> (String, Arc<MockGoogle>) {
    let mock = Arc::new(MockGoogle::default());
    let app = Router::new()
        .route("/token", post(token))
        .route("/token-denied", post(denied_token))
        .route("/v1beta/properties/{report}", post(run_report))
        .with_state(Arc::clone(&mock));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let base = format!("http://{}", listener.local_addr().expect("addr"));
    mock.token_uri
        .set(format!("{base}/token"))
        .expect("token uri set once");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("mock server");
    });
    (base, mock)
}

fn client(base: &str, token_path: &str) -> Ga4Client {
    let key = ServiceAccountKey {
        key_type: Some("service_account".to_string()),
        client_email: CLIENT_EMAIL.to_string(),
        private_key: PRIVATE_PEM.to_string(),
        private_key_id: Some("kid-1".to_string()),
        token_uri: format!("{base}{token_path}"),
    };
    Ga4Client::new(key, base).expect("client")
}

fn range() -> DateRange {
    DateRange::new(
        NaiveDate::from_ymd_opt(2024, 1, 14).expect("date"),
        NaiveDate::from_ymd_opt(2024, 1, 15).expect("date"),
    )
    .expect("range")
}

// ============================================================
// BDD: Report requests carry a bearer token and the daily page query
// ============================================================

#[tokio::test]
async fn test_run_report_sends_bearer_and_daily_pages_query() {
    let (base, mock) = spawn_mock().await;
    let ga4 = client(&base, "/token");

    let payload = ga4.run_report("properties/123456", &range()).await.expect("report");

    let echo = &payload["echo"];
    assert_eq!(
        echo["dateRanges"],
        json!([{"startDate": "2024-01-14", "endDate": "2024-01-15"}])
    );
    assert_eq!(
        echo["dimensions"],
        json!([{"name": "date"}, {"name": "pagePath"}])
    );
    assert_eq!(echo["metrics"].as_array().expect("metrics").len(), 5);
    assert_eq!(echo["limit"], 100_000);
    assert_eq!(payload["rowCount"], 0);

    assert_eq!(mock.token_calls.load(Ordering::SeqCst), 1);
    assert_eq!(mock.report_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_access_token_is_reused_across_reports() {
    let (base, mock) = spawn_mock().await;
    let ga4 = client(&base, "/token");

    for _ in 0..3 {
        ga4.run_report("123456", &range()).await.expect("report");
    }

    assert_eq!(mock.token_calls.load(Ordering::SeqCst), 1);
    assert_eq!(mock.report_calls.load(Ordering::SeqCst), 3);
}

// ============================================================
// BDD: Upstream failures surface as typed errors, no retry
// ============================================================

#[tokio::test]
async fn test_api_error_status_and_body_are_reported() {
    let (base, mock) = spawn_mock().await;
    let ga4 = client(&base, "/token");

    let err = ga4.run_report("999", &range()).await.expect_err("403");
    match err.downcast_ref::<Ga4Error>() {
        Some(Ga4Error::Api { status, body }) => {
            assert_eq!(*status, 403);
            assert!(body.contains("sufficient permissions"));
        }
        other => panic!("expected Ga4Error::Api, got {other:?}"),
    }
    assert_eq!(mock.report_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rejected_token_exchange_skips_report_call() {
    let (base, mock) = spawn_mock().await;
    let ga4 = client(&base, "/token-denied");

    let err = ga4.run_report("123456", &range()).await.expect_err("401");
    assert!(matches!(
        err.downcast_ref::<Ga4Error>(),
        Some(Ga4Error::Token(_))
    ));
    assert_eq!(mock.report_calls.load(Ordering::SeqCst), 0);
}
