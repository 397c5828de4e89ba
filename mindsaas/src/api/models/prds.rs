//! API models for the PRD endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::prds::{PrdDocument, PrdInstance, PrdUpsertOutcome};
use crate::lifecycle::PrdState;
use crate::types::{OwnerId, PrdId, SessionId};

/// Create-or-reset a PRD for an intake session.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PrdUpsertRequest {
    #[schema(value_type = Option<Uuid>)]
    pub session_id: Option<SessionId>,
    /// Pre-assembled document. When omitted, the document is assembled from
    /// the session's stored intake answers.
    pub prd_json: Option<PrdDocument>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PrdUpsertResponse {
    #[schema(value_type = Uuid)]
    pub id: PrdId,
    pub state: PrdState,
}

impl From<PrdUpsertOutcome> for PrdUpsertResponse {
    fn from(outcome: PrdUpsertOutcome) -> Self {
        Self {
            id: outcome.id,
            state: outcome.state,
        }
    }
}

/// Full public projection of a PRD instance. This is what the client poller
/// reads while waiting for the state to advance.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PrdResponse {
    #[schema(value_type = Uuid)]
    pub id: PrdId,
    #[schema(value_type = Uuid)]
    pub owner_id: OwnerId,
    #[schema(value_type = Uuid)]
    pub session_id: SessionId,
    pub state: PrdState,
    pub prd_json: PrdDocument,
    pub created_at: DateTime<Utc>,
    pub build_started_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub delivered_url: Option<String>,
    pub error_message: Option<String>,
}

impl From<PrdInstance> for PrdResponse {
    fn from(db: PrdInstance) -> Self {
        Self {
            id: db.id,
            owner_id: db.owner_id,
            session_id: db.session_id,
            state: db.state,
            prd_json: db.prd_json.0,
            created_at: db.created_at,
            build_started_at: db.build_started_at,
            delivered_at: db.delivered_at,
            delivered_url: db.delivered_url,
            error_message: db.error_message,
        }
    }
}
