//! Test utilities for integration testing.

use axum_test::TestServer;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::types::Json;
use uuid::Uuid;

use crate::config::{Config, CronConfig, DatabaseConfig, DummyGatewayConfig, GatewayConfig, PaymentSettings, RunnerConfig};
use crate::db::models::prds::{PrdDocument, PrdInstance};
use crate::lifecycle::PrdState;
use crate::types::{OwnerId, PaymentId, PrdId, SessionId};
use crate::{AppState, build_router};

pub const TEST_SECRET_KEY: &str = "test-secret-key-for-testing-only";
pub const TEST_WEBHOOK_TOKEN: &str = "test-webhook-token";
pub const TEST_RUNNER_SECRET: &str = "test-runner-secret";
pub const TEST_JOB_UPDATE_SECRET: &str = "test-job-update-secret";
pub const TEST_CRON_SECRET: &str = "test-cron-secret";

/// Single-connection in-memory database. The pool never drops its one
/// connection (that would destroy the database), and writes serialize on it
/// exactly like SQLite serializes them in production.
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    crate::migrator().run(&pool).await.expect("Failed to run migrations");
    pool
}

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseConfig::default(),
        secret_key: Some(TEST_SECRET_KEY.to_string()),
        webhook_token: Some(TEST_WEBHOOK_TOKEN.to_string()),
        job_update_secret: Some(TEST_JOB_UPDATE_SECRET.to_string()),
        runner: RunnerConfig {
            secret: Some(TEST_RUNNER_SECRET.to_string()),
            ..Default::default()
        },
        cron: CronConfig {
            secret: Some(TEST_CRON_SECRET.to_string()),
            ..Default::default()
        },
        payment: Some(PaymentSettings {
            amount_cents: 100,
            gateway: GatewayConfig::Dummy(DummyGatewayConfig::default()),
        }),
        cors_allowed_origins: vec!["*".to_string()],
    }
}

pub async fn create_test_app(pool: SqlitePool) -> TestServer {
    create_test_app_with_config(pool, create_test_config()).await
}

pub async fn create_test_app_with_config(pool: SqlitePool, config: Config) -> TestServer {
    let router = build_router(AppState::new(pool, config)).expect("Failed to build router");
    TestServer::new(router).expect("Failed to start test server")
}

/// Mint a bearer token the way the identity provider would.
pub fn bearer_token(owner_id: OwnerId) -> String {
    let claims = crate::auth::Claims {
        sub: owner_id,
        exp: (Utc::now() + chrono::Duration::hours(1)).timestamp(),
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(TEST_SECRET_KEY.as_bytes()),
    )
    .expect("Failed to mint test token")
}

pub fn authorization_header(owner_id: OwnerId) -> String {
    format!("Bearer {}", bearer_token(owner_id))
}

pub fn test_document() -> PrdDocument {
    PrdDocument {
        kind: PrdDocument::PRODUCT_KIND.to_string(),
        layer: PrdDocument::PRODUCT_LAYER.to_string(),
        goal: "launch a newsletter".to_string(),
        audience: "indie founders".to_string(),
        main_feature: "scheduled sending".to_string(),
        created_at: Utc::now(),
    }
}

/// Insert a PRD row directly, bypassing the upsert, so tests control the
/// state and creation time. The id doubles as the session id.
pub async fn seed_prd(pool: &SqlitePool, state: PrdState, created_at: DateTime<Utc>) -> PrdId {
    let id = Uuid::new_v4();
    seed_prd_with_id(pool, id, id, state, created_at).await;
    id
}

pub async fn seed_prd_with_id(
    pool: &SqlitePool,
    id: PrdId,
    session_id: SessionId,
    state: PrdState,
    created_at: DateTime<Utc>,
) {
    sqlx::query(
        r#"
        INSERT INTO prd_instances (id, owner_id, session_id, state, prd_json, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(Uuid::new_v4())
    .bind(session_id)
    .bind(state)
    .bind(Json(test_document()))
    .bind(created_at)
    .bind(created_at)
    .execute(pool)
    .await
    .expect("Failed to seed PRD");
}

pub async fn seed_payment(pool: &SqlitePool, session_id: SessionId, provider_transaction_id: Option<&str>) -> PaymentId {
    let id = Uuid::new_v4();
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO payments (id, owner_id, session_id, provider_transaction_id, qr_code, qr_code_payload, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, 'PENDING', ?, ?)
        "#,
    )
    .bind(id)
    .bind(Uuid::new_v4())
    .bind(session_id)
    .bind(provider_transaction_id)
    .bind("seed-qr")
    .bind("seed-qr-payload")
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .expect("Failed to seed payment");

    id
}

pub async fn prd_state(pool: &SqlitePool, id: PrdId) -> PrdState {
    sqlx::query_scalar("SELECT state FROM prd_instances WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("PRD should exist")
}

pub async fn prd_row(pool: &SqlitePool, id: PrdId) -> PrdInstance {
    sqlx::query_as("SELECT * FROM prd_instances WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("PRD should exist")
}

pub async fn payment_statuses(pool: &SqlitePool, session_id: SessionId) -> Vec<String> {
    sqlx::query_scalar("SELECT status FROM payments WHERE session_id = ? ORDER BY created_at ASC")
        .bind(session_id)
        .fetch_all(pool)
        .await
        .expect("Failed to read payment statuses")
}

pub async fn payments_count(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM payments")
        .fetch_one(pool)
        .await
        .expect("Failed to count payments")
}
