//! Cron trigger for the builder job runner.
//!
//! The scheduler only knows this GET endpoint; the trigger relays to the
//! runner endpoint over HTTP, mirroring the deployment where trigger and
//! runner live in separate functions.

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::{Value, json};

use crate::AppState;

const SECRET_HEADER: &str = "x-mindsaas-secret";

/// Trigger one builder pass through the runner endpoint.
#[utoipa::path(
    get,
    path = "/cron/builder",
    tag = "jobs",
    responses(
        (status = 200, description = "Relay performed; body carries the runner's status and payload"),
        (status = 401, description = "Missing or wrong bearer secret"),
        (status = 500, description = "Runner not configured, or the relay itself failed"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn trigger_builder(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(expected) = state.config.cron.secret.as_deref() {
        let provided = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "));
        if provided != Some(expected) {
            tracing::warn!("Unauthorized cron trigger attempt");
            return (StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" }))).into_response();
        }
    }

    let (Some(runner_url), Some(runner_secret)) =
        (state.config.cron.runner_url.clone(), state.config.runner.secret.clone())
    else {
        tracing::error!("Cron trigger invoked without cron.runner_url or runner.secret configured");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Missing configuration: cron.runner_url or runner.secret" })),
        )
            .into_response();
    };

    let body = json!({
        "limit": state.config.cron.limit,
        "delivered_url_base": state.config.runner.delivered_url_base.clone().unwrap_or_default(),
    });

    tracing::info!("Calling builder job runner at {}", runner_url);

    match state
        .http
        .post(runner_url)
        .header(SECRET_HEADER, runner_secret)
        .json(&body)
        .send()
        .await
    {
        Ok(response) => {
            let status = response.status();
            let data = response.json::<Value>().await.unwrap_or_else(|_| json!({}));

            tracing::info!("Builder job runner responded with status {}", status);

            Json(json!({
                "status": status.as_u16(),
                "data": data,
                "timestamp": Utc::now(),
            }))
            .into_response()
        }
        Err(error) => {
            tracing::error!("Error calling builder job runner: {error}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": error.to_string() })),
            )
                .into_response()
        }
    }
}
