//! Payment intent creation against the dummy gateway and a mocked SyncPay.

use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::{Config, GatewayConfig, PaymentSettings, SyncpayConfig};
use crate::test_utils::*;

fn syncpay_config(base_url: &str) -> Config {
    let mut config = create_test_config();
    config.payment = Some(PaymentSettings {
        amount_cents: 250,
        gateway: GatewayConfig::Syncpay(SyncpayConfig {
            base_url: base_url.parse().unwrap(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
        }),
    });
    config
}

#[tokio::test]
async fn dummy_gateway_persists_a_pending_payment() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool.clone()).await;
    let session_id = Uuid::new_v4();

    let response = server
        .post("/api/v1/payments/pix")
        .add_header("authorization", authorization_header(Uuid::new_v4()))
        .json(&json!({ "session_id": session_id }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], json!("PENDING"));
    assert_eq!(body["qr_code"], json!(format!("dummy-qr-{session_id}")));
    assert!(body["payment_id"].is_string());

    assert_eq!(payment_statuses(&pool, session_id).await, vec!["PENDING".to_string()]);
}

#[tokio::test]
async fn intent_creation_requires_a_bearer_token() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool.clone()).await;

    let response = server
        .post("/api/v1/payments/pix")
        .json(&json!({ "session_id": Uuid::new_v4() }))
        .await;

    response.assert_status_unauthorized();
    assert_eq!(payments_count(&pool).await, 0);
}

#[tokio::test]
async fn missing_session_id_is_rejected() {
    let pool = create_test_pool().await;
    let server = create_test_app(pool.clone()).await;

    let response = server
        .post("/api/v1/payments/pix")
        .add_header("authorization", authorization_header(Uuid::new_v4()))
        .json(&json!({}))
        .await;

    response.assert_status_bad_request();
    response.assert_json(&json!({ "error": "session_id is required" }));
}

#[tokio::test]
async fn an_unconfigured_gateway_is_an_internal_error() {
    let pool = create_test_pool().await;
    let mut config = create_test_config();
    config.payment = None;
    let server = create_test_app_with_config(pool.clone(), config).await;

    let response = server
        .post("/api/v1/payments/pix")
        .add_header("authorization", authorization_header(Uuid::new_v4()))
        .json(&json!({ "session_id": Uuid::new_v4() }))
        .await;

    response.assert_status(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(payments_count(&pool).await, 0);
}

#[tokio::test]
async fn syncpay_happy_path_persists_the_charge() {
    let pool = create_test_pool().await;
    let provider = MockServer::start().await;
    let session_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .and(body_partial_json(json!({ "client_id": "client" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "tok" })))
        .mount(&provider)
        .await;
    Mock::given(method("POST"))
        .and(path("/payments/pix"))
        .and(body_partial_json(json!({ "amount": 250, "external_reference": session_id })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "txn-42",
            "qr_code": "QR",
            "qr_code_payload": "COPY-PASTE",
        })))
        .mount(&provider)
        .await;

    let server = create_test_app_with_config(pool.clone(), syncpay_config(&provider.uri())).await;

    let response = server
        .post("/api/v1/payments/pix")
        .add_header("authorization", authorization_header(Uuid::new_v4()))
        .json(&json!({ "session_id": session_id }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["qr_code"], json!("QR"));
    assert_eq!(body["qr_code_payload"], json!("COPY-PASTE"));
    assert_eq!(body["status"], json!("PENDING"));

    let stored: Option<String> = sqlx::query_scalar("SELECT provider_transaction_id FROM payments WHERE session_id = ?")
        .bind(session_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(stored.as_deref(), Some("txn-42"));
}

#[tokio::test]
async fn syncpay_accepts_the_alternate_field_spellings() {
    let pool = create_test_pool().await;
    let provider = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "tok" })))
        .mount(&provider)
        .await;
    Mock::given(method("POST"))
        .and(path("/payments/pix"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "transaction_id": "txn-alt",
            "qrcode_base64": "QR64",
            "pix_copy_paste": "PIX",
        })))
        .mount(&provider)
        .await;

    let server = create_test_app_with_config(pool.clone(), syncpay_config(&provider.uri())).await;

    let response = server
        .post("/api/v1/payments/pix")
        .add_header("authorization", authorization_header(Uuid::new_v4()))
        .json(&json!({ "session_id": Uuid::new_v4() }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["qr_code"], json!("QR64"));
    assert_eq!(body["qr_code_payload"], json!("PIX"));
}

#[tokio::test]
async fn gateway_auth_failure_persists_nothing() {
    let pool = create_test_pool().await;
    let provider = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&provider)
        .await;

    let server = create_test_app_with_config(pool.clone(), syncpay_config(&provider.uri())).await;

    let response = server
        .post("/api/v1/payments/pix")
        .add_header("authorization", authorization_header(Uuid::new_v4()))
        .json(&json!({ "session_id": Uuid::new_v4() }))
        .await;

    response.assert_status(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(payments_count(&pool).await, 0);
}

#[tokio::test]
async fn a_rejected_charge_persists_nothing() {
    let pool = create_test_pool().await;
    let provider = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "tok" })))
        .mount(&provider)
        .await;
    Mock::given(method("POST"))
        .and(path("/payments/pix"))
        .respond_with(ResponseTemplate::new(422).set_body_string("amount too small"))
        .mount(&provider)
        .await;

    let server = create_test_app_with_config(pool.clone(), syncpay_config(&provider.uri())).await;

    let response = server
        .post("/api/v1/payments/pix")
        .add_header("authorization", authorization_header(Uuid::new_v4()))
        .json(&json!({ "session_id": Uuid::new_v4() }))
        .await;

    response.assert_status(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(payments_count(&pool).await, 0);
}

#[tokio::test]
async fn an_incomplete_charge_response_persists_nothing() {
    let pool = create_test_pool().await;
    let provider = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "tok" })))
        .mount(&provider)
        .await;
    // A transaction id but no QR fields: fail fast, write nothing.
    Mock::given(method("POST"))
        .and(path("/payments/pix"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "txn-43" })))
        .mount(&provider)
        .await;

    let server = create_test_app_with_config(pool.clone(), syncpay_config(&provider.uri())).await;

    let response = server
        .post("/api/v1/payments/pix")
        .add_header("authorization", authorization_header(Uuid::new_v4()))
        .json(&json!({ "session_id": Uuid::new_v4() }))
        .await;

    response.assert_status(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json();
    assert!(
        body["error"].as_str().unwrap().contains("Invalid payment response"),
        "unexpected error body: {body}"
    );
    assert_eq!(payments_count(&pool).await, 0);
}
