//! API models for the builder job runner.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::types::PrdId;

/// Optional runner invocation parameters.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct RunnerRequest {
    pub limit: Option<i64>,
    pub delivered_url_base: Option<String>,
}

/// Per-item outcome of a runner pass.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RunnerItem {
    #[schema(value_type = Uuid)]
    pub id: PrdId,
    pub ok: bool,
    pub error: Option<String>,
}

/// Aggregate runner report: `ids` on full success, `failed` otherwise.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RunnerReport {
    pub ok: bool,
    pub processed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<Uuid>>)]
    pub ids: Option<Vec<PrdId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed: Option<Vec<RunnerItem>>,
}

impl RunnerReport {
    pub fn empty() -> Self {
        Self {
            ok: true,
            processed: 0,
            ids: Some(Vec::new()),
            failed: None,
        }
    }
}
