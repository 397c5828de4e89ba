//! Dummy gateway implementation
//!
//! Returns a deterministic charge without calling any external service.
//! Useful for testing and development purposes.

use async_trait::async_trait;

use crate::config::DummyGatewayConfig;
use crate::gateway::{PixCharge, PixGateway, Result};
use crate::types::SessionId;

pub struct DummyGateway {
    _config: DummyGatewayConfig,
}

impl DummyGateway {
    pub fn new(config: DummyGatewayConfig) -> Self {
        Self { _config: config }
    }
}

#[async_trait]
impl PixGateway for DummyGateway {
    async fn create_charge(&self, session_id: SessionId, amount_cents: i64, _description: &str) -> Result<PixCharge> {
        tracing::info!(
            "Dummy gateway created a {} cent charge for session {}",
            amount_cents,
            session_id
        );

        Ok(PixCharge {
            provider_transaction_id: Some(format!("dummy-{session_id}")),
            qr_code: format!("dummy-qr-{session_id}"),
            qr_code_payload: format!("dummy-pix-copy-paste-{session_id}"),
        })
    }
}
