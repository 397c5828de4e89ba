//! Entity model for PRD instances.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::ToSchema;

use crate::db::models::answers::IntakeAnswer;
use crate::lifecycle::PrdState;
use crate::types::{OwnerId, PrdId, SessionId};

/// Structured questionnaire output stored on a PRD instance.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PrdDocument {
    #[serde(rename = "type")]
    pub kind: String,
    pub layer: String,
    pub goal: String,
    pub audience: String,
    pub main_feature: String,
    pub created_at: DateTime<Utc>,
}

impl PrdDocument {
    /// Single product line for now; the intake flow only sells one thing.
    pub const PRODUCT_KIND: &'static str = "SaaS Simples";
    pub const PRODUCT_LAYER: &'static str = "A";

    /// Assemble a document from a session's stored intake answers. Unanswered
    /// keys become empty strings, matching what the intake UI submits.
    pub fn from_answers(answers: &[IntakeAnswer]) -> Self {
        let find = |key: &str| {
            answers
                .iter()
                .find(|a| a.question_key == key)
                .map(|a| a.answer_text.clone())
                .unwrap_or_default()
        };

        Self {
            kind: Self::PRODUCT_KIND.to_string(),
            layer: Self::PRODUCT_LAYER.to_string(),
            goal: find("goal"),
            audience: find("audience"),
            main_feature: find("main_feature"),
            created_at: Utc::now(),
        }
    }
}

// Database entity model for a PRD instance
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PrdInstance {
    pub id: PrdId,
    pub owner_id: OwnerId,
    pub session_id: SessionId,
    pub state: PrdState,
    pub prd_json: Json<PrdDocument>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub build_started_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub delivered_url: Option<String>,
    pub error_message: Option<String>,
}

/// Request to create-or-reset a PRD instance for a session.
#[derive(Debug, Clone)]
pub struct PrdUpsertDBRequest {
    pub session_id: SessionId,
    pub owner_id: OwnerId,
    pub prd_json: PrdDocument,
}

/// Canonical `(id, state)` projection returned by the upsert.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct PrdUpsertOutcome {
    pub id: PrdId,
    pub state: PrdState,
}

/// Result of a guarded state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The guard matched and the row advanced.
    Applied,
    /// The row exists but is no longer in the transition's source state.
    Skipped { current: PrdState },
    /// No row with that id.
    Missing,
}
