//! API models for intake answers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::answers::IntakeAnswer;
use crate::types::SessionId;

/// One questionnaire answer in a bulk submission.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AnswerCreate {
    pub question_key: String,
    pub answer_text: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnswerResponse {
    #[schema(value_type = Uuid)]
    pub session_id: SessionId,
    pub question_key: String,
    pub answer_text: String,
    pub created_at: DateTime<Utc>,
}

impl From<IntakeAnswer> for AnswerResponse {
    fn from(db: IntakeAnswer) -> Self {
        Self {
            session_id: db.session_id,
            question_key: db.question_key,
            answer_text: db.answer_text,
            created_at: db.created_at,
        }
    }
}
