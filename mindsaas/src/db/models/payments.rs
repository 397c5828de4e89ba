//! Entity model for payment records.
//!
//! `status` is stored as text rather than an enum: besides our own `PENDING`
//! and `PAID`, the webhook passes provider-defined statuses through verbatim.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::types::{OwnerId, PaymentId, SessionId};

pub const PENDING: &str = "PENDING";
pub const PAID: &str = "PAID";

/// Whether a provider-reported status means the charge was settled. The
/// provider has shipped both casings.
pub fn provider_status_is_paid(status: &str) -> bool {
    matches!(status, "paid" | "PAID")
}

/// Settled charges normalize to `PAID`; everything else passes through.
pub fn normalized_status(provider_status: &str) -> &str {
    if provider_status_is_paid(provider_status) { PAID } else { provider_status }
}

// Database entity model for a payment record
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub owner_id: OwnerId,
    pub session_id: SessionId,
    pub provider_transaction_id: Option<String>,
    pub qr_code: String,
    pub qr_code_payload: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to persist a freshly created payment intent.
#[derive(Debug, Clone)]
pub struct PaymentCreateDBRequest {
    pub owner_id: OwnerId,
    pub session_id: SessionId,
    pub provider_transaction_id: Option<String>,
    pub qr_code: String,
    pub qr_code_payload: String,
}
