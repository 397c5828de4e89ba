//! HTTP handlers for intake answers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};

use crate::{
    AppState,
    api::models::answers::{AnswerCreate, AnswerResponse},
    auth::CurrentUser,
    db::{
        errors::DbError,
        handlers::IntakeAnswers,
        models::answers::AnswerCreateDBRequest,
    },
    errors::Error,
    types::SessionId,
};

/// Submit questionnaire answers for a session in bulk.
///
/// Answers are immutable: resubmitting a key leaves the first value in place.
#[utoipa::path(
    post,
    path = "/sessions/{session_id}/answers",
    tag = "prds",
    params(("session_id" = uuid::Uuid, Path, description = "Intake session id")),
    request_body = Vec<AnswerCreate>,
    responses(
        (status = 201, description = "Answers stored"),
        (status = 400, description = "Empty submission"),
        (status = 401, description = "Missing or invalid bearer token"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn submit_answers(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(session_id): Path<SessionId>,
    Json(answers): Json<Vec<AnswerCreate>>,
) -> Result<(StatusCode, Json<Value>), Error> {
    if answers.is_empty() {
        return Err(Error::BadRequest {
            message: "at least one answer is required".to_string(),
        });
    }

    let rows: Vec<AnswerCreateDBRequest> = answers
        .into_iter()
        .map(|answer| AnswerCreateDBRequest {
            question_key: answer.question_key,
            answer_text: answer.answer_text,
        })
        .collect();

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let inserted = IntakeAnswers::new(&mut conn).bulk_insert(session_id, user.id, &rows).await?;

    Ok((StatusCode::CREATED, Json(json!({ "ok": true, "inserted": inserted }))))
}

/// List a session's answers, ordered by question key.
#[utoipa::path(
    get,
    path = "/sessions/{session_id}/answers",
    tag = "prds",
    params(("session_id" = uuid::Uuid, Path, description = "Intake session id")),
    responses(
        (status = 200, description = "The session's answers", body = Vec<AnswerResponse>),
        (status = 401, description = "Missing or invalid bearer token"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_answers(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(session_id): Path<SessionId>,
) -> Result<Json<Vec<AnswerResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let answers = IntakeAnswers::new(&mut conn).fetch_for_session(session_id).await?;

    Ok(Json(answers.into_iter().map(AnswerResponse::from).collect()))
}
