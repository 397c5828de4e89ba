//! The trusted pipeline's direct state-update endpoint.
//!
//! Unlike the public webhook this path is privileged: the update is
//! unconditional on the current state. The target literal is still validated
//! against the lifecycle's terminal vocabulary before anything is written.

use axum::{
    Json,
    extract::State,
    http::HeaderMap,
};
use serde_json::{Value, json};

use crate::{
    AppState,
    api::models::jobs::JobStateUpdateRequest,
    db::{
        errors::{DbError, is_missing_table},
        handlers::{Deliveries, Prds},
    },
    errors::Error,
    lifecycle::PrdState,
    types::abbrev_uuid,
};

const SECRET_HEADER: &str = "x-mindsaas-secret";

/// Set a PRD directly to `DELIVERED` or `FAILED`.
#[utoipa::path(
    post,
    path = "/jobs/state",
    tag = "jobs",
    request_body = JobStateUpdateRequest,
    responses(
        (status = 200, description = "State updated"),
        (status = 400, description = "Missing id/state, or a state outside DELIVERED/FAILED"),
        (status = 401, description = "Missing or wrong secret"),
        (status = 404, description = "No PRD with that id"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_job_state(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<JobStateUpdateRequest>,
) -> Result<Json<Value>, Error> {
    // An unset secret disables the endpoint instead of opening it.
    let expected = state.config.job_update_secret.as_deref();
    let provided = headers.get(SECRET_HEADER).and_then(|value| value.to_str().ok());
    if expected.is_none() || provided != expected {
        return Err(Error::Unauthenticated { message: None });
    }

    let (Some(prd_id), Some(state_literal)) = (request.canonical_id(), request.state.as_deref()) else {
        return Err(Error::BadRequest {
            message: "Missing required fields: prd_id or prd_instance_id, state".to_string(),
        });
    };

    let target = state_literal.parse::<PrdState>().ok();
    let target = match target {
        Some(target @ (PrdState::Delivered | PrdState::Failed)) => target,
        // Anything else - unknown literal or a non-terminal lifecycle state -
        // is a validation error, never silently coerced.
        _ => {
            return Err(Error::BadRequest {
                message: "Invalid state. Must be DELIVERED or FAILED".to_string(),
            });
        }
    };

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    let updated = Prds::new(&mut conn).force_state(prd_id, target).await?;
    if updated.is_none() {
        return Err(Error::NotFound {
            resource: "PRD instance".to_string(),
            id: prd_id.to_string(),
        });
    }

    // Optional side effect: record where the PRD landed. A missing table is
    // skipped; any other failure is logged without failing the response.
    if target == PrdState::Delivered
        && let Some(delivered_url) = request.delivered_url.as_deref()
    {
        match Deliveries::new(&mut conn).upsert(prd_id, delivered_url).await {
            Ok(()) => {}
            Err(e) if is_missing_table(&e) => {
                tracing::debug!("deliveries table does not exist, skipping");
            }
            Err(e) => {
                tracing::error!("Error updating deliveries for PRD {}: {e:#}", abbrev_uuid(&prd_id));
            }
        }
    }

    Ok(Json(json!({ "ok": true })))
}
