//! API models for the trusted pipeline's state-update endpoint.

use serde::Deserialize;
use utoipa::ToSchema;

use crate::types::PrdId;

/// Direct state update from a trusted pipeline. `prd_id` and
/// `prd_instance_id` are accepted interchangeably for backward compatibility
/// with older pipeline deployments.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct JobStateUpdateRequest {
    #[schema(value_type = Option<Uuid>)]
    pub prd_id: Option<PrdId>,
    #[schema(value_type = Option<Uuid>)]
    pub prd_instance_id: Option<PrdId>,
    pub state: Option<String>,
    pub delivered_url: Option<String>,
}

impl JobStateUpdateRequest {
    /// Normalize the two legacy field names into one canonical id.
    pub fn canonical_id(&self) -> Option<PrdId> {
        self.prd_id.or(self.prd_instance_id)
    }
}
