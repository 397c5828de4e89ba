//! Entity model for intake answers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{OwnerId, SessionId};

// Database entity model for one questionnaire answer
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IntakeAnswer {
    pub session_id: SessionId,
    pub question_key: String,
    pub owner_id: OwnerId,
    pub answer_text: String,
    pub created_at: DateTime<Utc>,
}

/// One answer in a bulk insert.
#[derive(Debug, Clone)]
pub struct AnswerCreateDBRequest {
    pub question_key: String,
    pub answer_text: String,
}
