//! HTTP handlers for the PRD endpoints: upsert and polling lookup.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    AppState,
    api::models::prds::{PrdResponse, PrdUpsertRequest, PrdUpsertResponse},
    auth::CurrentUser,
    db::{
        errors::DbError,
        handlers::{IntakeAnswers, Prds},
        models::prds::{PrdDocument, PrdUpsertDBRequest},
    },
    errors::Error,
    types::PrdId,
};

/// Create or reset the PRD for an intake session.
///
/// Whatever state the instance was in, afterwards it is in `PAY`: a
/// resubmitted questionnaire restarts billing, not the build.
#[utoipa::path(
    post,
    path = "/prds",
    tag = "prds",
    request_body = PrdUpsertRequest,
    responses(
        (status = 200, description = "PRD created or reset to PAY", body = PrdUpsertResponse),
        (status = 400, description = "Missing session_id, or no answers recorded for the session"),
        (status = 401, description = "Missing or invalid bearer token"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn upsert_prd(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<PrdUpsertRequest>,
) -> Result<Json<PrdUpsertResponse>, Error> {
    let Some(session_id) = payload.session_id else {
        return Err(Error::BadRequest {
            message: "session_id is required".to_string(),
        });
    };

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    let prd_json = match payload.prd_json {
        Some(document) => document,
        None => {
            let answers = IntakeAnswers::new(&mut conn).fetch_for_session(session_id).await?;
            if answers.is_empty() {
                return Err(Error::BadRequest {
                    message: "no prd_json provided and no intake answers recorded for this session".to_string(),
                });
            }
            PrdDocument::from_answers(&answers)
        }
    };

    let outcome = Prds::new(&mut conn)
        .upsert(&PrdUpsertDBRequest {
            session_id,
            owner_id: user.id,
            prd_json,
        })
        .await?;

    Ok(Json(PrdUpsertResponse::from(outcome)))
}

/// Fetch a PRD by id, falling back to a session-id lookup.
///
/// The client poller hits this every few seconds; it is a pure read.
#[utoipa::path(
    get,
    path = "/prds/{prd}",
    tag = "prds",
    params(("prd" = uuid::Uuid, Path, description = "PRD instance id or intake session id")),
    responses(
        (status = 200, description = "The PRD instance", body = PrdResponse),
        (status = 404, description = "No instance matches either lookup"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_prd(State(state): State<AppState>, Path(prd): Path<PrdId>) -> Result<Json<PrdResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;

    let instance = Prds::new(&mut conn).fetch_with_fallback(prd).await?;

    match instance {
        Some(instance) => Ok(Json(PrdResponse::from(instance))),
        None => Err(Error::NotFound {
            resource: "PRD instance".to_string(),
            id: prd.to_string(),
        }),
    }
}
