//! API models for payment-intent creation and the provider webhook.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::types::{PaymentId, SessionId};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PaymentIntentRequest {
    #[schema(value_type = Option<Uuid>)]
    pub session_id: Option<SessionId>,
}

/// Minimal public projection of a created payment.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentIntentResponse {
    pub qr_code: String,
    pub qr_code_payload: String,
    #[schema(value_type = Uuid)]
    pub payment_id: PaymentId,
    pub status: String,
}

/// Opaque provider notification. Only the fields the reconciliation needs are
/// modeled; the provider has shipped two spellings for the transaction id and
/// two places for the session reference, so all are accepted. Unknown fields
/// are ignored.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WebhookPayload {
    pub id: Option<String>,
    pub transaction_id: Option<String>,
    pub status: Option<String>,
    pub external_reference: Option<String>,
    pub metadata: Option<WebhookMetadata>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct WebhookMetadata {
    pub session_id: Option<String>,
}

impl WebhookPayload {
    pub fn provider_transaction_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.transaction_id.as_deref())
    }

    /// Session hint from metadata or the external reference. Unparseable
    /// values count as absent; the matched payment row is the fallback.
    pub fn session_hint(&self) -> Option<SessionId> {
        self.metadata
            .as_ref()
            .and_then(|m| m.session_id.as_deref())
            .or(self.external_reference.as_deref())
            .and_then(|raw| raw.parse().ok())
    }
}
