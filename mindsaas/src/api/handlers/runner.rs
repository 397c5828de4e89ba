//! The builder job runner: advances queued PRDs from `BUILD` to `DELIVERED`.
//!
//! Invoked on a schedule through the cron trigger, or directly. No external
//! build step runs here yet - the runner is the seam where a real pipeline
//! would be inserted without touching the lifecycle contract.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    AppState,
    api::models::runner::{RunnerItem, RunnerReport, RunnerRequest},
    db::{
        handlers::Prds,
        models::prds::TransitionOutcome,
    },
    lifecycle,
    types::PrdId,
};

const SECRET_HEADER: &str = "x-mindsaas-secret";

/// Bounds for the per-pass batch size.
const MIN_LIMIT: i64 = 1;
const MAX_LIMIT: i64 = 20;

/// Run one builder pass.
///
/// Selects up to `limit` PRDs in `BUILD`, oldest first, and advances each one
/// independently: a failing item never blocks the rest, and the report names
/// every failure.
#[utoipa::path(
    post,
    path = "/jobs/builder",
    tag = "jobs",
    request_body = RunnerRequest,
    responses(
        (status = 200, description = "Every selected item delivered", body = RunnerReport),
        (status = 401, description = "Wrong runner secret"),
        (status = 500, description = "Selection failed, or at least one item failed", body = RunnerReport),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn run_builder_jobs(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Option<Json<RunnerRequest>>,
) -> Response {
    // Enforced only when configured, so a local setup can poke the runner
    // without minting secrets.
    if let Some(expected) = state.config.runner.secret.as_deref() {
        let provided = headers.get(SECRET_HEADER).and_then(|value| value.to_str().ok());
        if provided != Some(expected) {
            return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "unauthorized" }))).into_response();
        }
    }

    let request = body.map(|Json(request)| request).unwrap_or_default();

    let limit = request
        .limit
        .unwrap_or_else(|| state.config.runner.default_limit())
        .clamp(MIN_LIMIT, MAX_LIMIT);

    let delivered_url_base = request
        .delivered_url_base
        .filter(|base| !base.is_empty())
        .or_else(|| state.config.runner.delivered_url_base.clone())
        .map(|base| base.trim_end_matches('/').to_string());

    let ids = {
        let mut conn = match state.db.acquire().await {
            Ok(conn) => conn,
            Err(e) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "select_failed", "details": e.to_string() })),
                )
                    .into_response();
            }
        };

        match Prds::new(&mut conn).select_build_batch(limit).await {
            Ok(ids) => ids,
            Err(e) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "select_failed", "details": e.to_string() })),
                )
                    .into_response();
            }
        }
    };

    if ids.is_empty() {
        return Json(RunnerReport::empty()).into_response();
    }

    tracing::info!("Builder pass delivering {} PRD(s)", ids.len());

    // Fan out, collect per-item results; one connection per item so a slow or
    // failing update cannot wedge the others.
    let results = futures::future::join_all(ids.iter().map(|&id| {
        let pool = state.db.clone();
        let delivered_url = delivered_url_base.as_ref().map(|base| format!("{base}?prd={id}"));
        async move {
            match deliver_one(&pool, id, delivered_url.as_deref()).await {
                Ok(()) => RunnerItem { id, ok: true, error: None },
                Err(error) => RunnerItem {
                    id,
                    ok: false,
                    error: Some(error),
                },
            }
        }
    }))
    .await;

    let failed: Vec<RunnerItem> = results.iter().filter(|item| !item.ok).cloned().collect();

    if !failed.is_empty() {
        let report = RunnerReport {
            ok: false,
            processed: results.len() - failed.len(),
            ids: None,
            failed: Some(failed),
        };
        return (StatusCode::INTERNAL_SERVER_ERROR, Json(report)).into_response();
    }

    Json(RunnerReport {
        ok: true,
        processed: results.len(),
        ids: Some(ids),
        failed: None,
    })
    .into_response()
}

async fn deliver_one(pool: &SqlitePool, id: PrdId, delivered_url: Option<&str>) -> Result<(), String> {
    let mut conn = pool.acquire().await.map_err(|e| e.to_string())?;

    let outcome = Prds::new(&mut conn)
        .advance(id, lifecycle::BUILD_COMPLETED, delivered_url)
        .await
        .map_err(|e| e.to_string())?;

    match outcome {
        TransitionOutcome::Applied => Ok(()),
        TransitionOutcome::Skipped { current } => {
            // An overlapping pass got here first; re-delivering is harmless.
            tracing::info!("PRD {id} already in state {current}, skipping delivery");
            Ok(())
        }
        TransitionOutcome::Missing => Err("PRD instance not found".to_string()),
    }
}
