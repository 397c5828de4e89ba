//! # mindsaas: intake-to-payment-to-delivery control service
//!
//! `mindsaas` is the backend for a small product intake flow: a user answers
//! a short questionnaire, a PRD (mini product requirement document) instance
//! is created, a Pix payment is requested through an external gateway, a
//! webhook confirms the charge, and a scheduled builder pass marks the PRD as
//! delivered. The front end polls the PRD's state to advance through pages.
//!
//! ## Overview
//!
//! The interesting part of the system is not any single handler but the PRD
//! lifecycle: a distributed state machine implemented entirely through
//! database row updates, coordinated by stateless HTTP handlers that can run
//! concurrently and out of order. A PRD only ever moves forward along
//! `PAY -> BUILD -> DELIVERED` (or from a non-terminal state to `FAILED`),
//! and that guarantee holds under duplicate webhook delivery, overlapping
//! cron fires, and aggressive client polling.
//!
//! There is no in-process shared state and no locking primitive. The store is
//! the single synchronization point: every transition is a conditional
//! `UPDATE ... WHERE state = ?` that acts as a compare-and-swap, written once
//! in [`db::handlers::Prds::advance`] and driven by the named transitions in
//! [`lifecycle`]. A webhook redelivered after the PRD advanced is a silent
//! no-op; a runner pass overlapping another delivers idempotently.
//!
//! ### Request flow
//!
//! - The intake UI stores answers and upserts the PRD (`/api/v1/prds`),
//!   which lands - or is forced back - into `PAY`.
//! - `/api/v1/payments/pix` performs the two-step gateway exchange and
//!   persists a `PENDING` payment. Nothing is written when the gateway
//!   response is incomplete.
//! - The provider's webhook (`/webhooks/syncpay`) normalizes payment rows and
//!   performs the guarded `PAY -> BUILD` advance. Once authorized and valid
//!   it always acknowledges with 200; redelivery is the retry mechanism.
//! - The cron trigger (`/internal/cron/builder`) relays to the runner
//!   (`/internal/jobs/builder`), which advances `BUILD -> DELIVERED` in
//!   bounded, oldest-first batches with per-item fault isolation.
//! - A trusted pipeline can set `DELIVERED`/`FAILED` directly through
//!   `/internal/jobs/state`.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use mindsaas::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = mindsaas::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     mindsaas::telemetry::init_telemetry()?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database
//!
//! Persistence is SQLite via `sqlx`; migrations are embedded and run on
//! startup:
//!
//! ```no_run
//! # use sqlx::SqlitePool;
//! # async fn example(pool: SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
//! mindsaas::migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod gateway;
pub mod lifecycle;
mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(test)]
mod test;
#[cfg(test)]
pub mod test_utils;

use std::future::Future;
use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

pub use config::Config;
pub use types::{OwnerId, PaymentId, PrdId, SessionId};

use crate::gateway::PixGateway;
use crate::openapi::ApiDoc;

/// Application state shared across all request handlers.
///
/// Handlers are stateless beyond this: a connection pool, the configuration,
/// the optional payment gateway, and an HTTP client for the cron relay.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
    pub gateway: Option<Arc<dyn PixGateway>>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(db: SqlitePool, config: Config) -> Self {
        let gateway = config
            .payment
            .as_ref()
            .map(|settings| gateway::create_gateway(&settings.gateway));

        Self {
            db,
            config,
            gateway,
            http: reqwest::Client::new(),
        }
    }
}

/// Get the database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Connect to SQLite, creating the file when missing, and run migrations.
async fn setup_database(config: &Config) -> anyhow::Result<SqlitePool> {
    let options = config
        .database
        .url
        .parse::<SqliteConnectOptions>()?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new().max_connections(5).connect_with(options).await?;
    migrator().run(&pool).await?;

    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    if config.cors_allowed_origins.iter().any(|origin| origin == "*") {
        return Ok(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));
    }

    let mut origins = Vec::new();
    for origin in &config.cors_allowed_origins {
        origins.push(origin.parse::<axum::http::HeaderValue>()?);
    }

    Ok(CorsLayer::new().allow_origin(origins).allow_methods(Any).allow_headers(Any))
}

/// Build the main application router with all endpoints and middleware.
///
/// Three surfaces: the user-facing API under `/api/v1`, the internal job
/// endpoints under `/internal`, and the provider webhook at the root.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let api_routes = Router::new()
        .route("/prds", post(api::handlers::prds::upsert_prd))
        .route("/prds/{prd}", get(api::handlers::prds::get_prd))
        .route(
            "/sessions/{session_id}/answers",
            post(api::handlers::answers::submit_answers).get(api::handlers::answers::list_answers),
        )
        .route("/payments/pix", post(api::handlers::payments::create_payment_intent))
        .with_state(state.clone());

    // Internal surface: the scheduled jobs and the trusted pipeline callback.
    let internal_routes = Router::new()
        .route("/jobs/builder", post(api::handlers::runner::run_builder_jobs))
        .route("/jobs/state", post(api::handlers::jobs::update_job_state))
        .route("/cron/builder", get(api::handlers::cron::trigger_builder))
        .with_state(state.clone());

    let cors_layer = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        // Webhook route (external payment provider, not part of the client API)
        .route("/webhooks/syncpay", post(api::handlers::payments::payment_webhook))
        .with_state(state)
        .nest("/api/v1", api_routes)
        .nest("/internal", internal_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// The composed application, ready to serve.
pub struct Application {
    router: Router,
    listener: TcpListener,
}

impl Application {
    /// Connect to the configured database, migrate, and bind the listener.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let pool = setup_database(&config).await?;
        Self::new_with_pool(config, pool).await
    }

    /// Build on an existing pool (tests hand in an in-memory database).
    pub async fn new_with_pool(config: Config, pool: SqlitePool) -> anyhow::Result<Self> {
        let addr = format!("{}:{}", config.host, config.port);
        let state = AppState::new(pool, config);
        let router = build_router(state)?;

        let listener = TcpListener::bind(&addr).await?;
        info!("Listening on {}", listener.local_addr()?);

        Ok(Self { router, listener })
    }

    /// Serve until the shutdown future resolves.
    pub async fn serve(self, shutdown: impl Future<Output = ()> + Send + 'static) -> anyhow::Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}
