//! Payment gateway abstraction layer
//!
//! This module defines the [`PixGateway`] trait which abstracts Pix charge
//! creation across providers. The HTTP implementation lives in [`syncpay`];
//! [`dummy`] is a deterministic in-process provider for development and tests.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::GatewayConfig;
use crate::types::SessionId;

pub mod dummy;
pub mod syncpay;

/// Create a gateway from configuration
///
/// This is the single point where we convert config into gateway instances.
/// Adding a new provider requires adding a match arm here.
pub fn create_gateway(config: &GatewayConfig) -> Arc<dyn PixGateway> {
    match config {
        GatewayConfig::Syncpay(syncpay_config) => Arc::new(syncpay::SyncpayGateway::new(syncpay_config.clone())),
        GatewayConfig::Dummy(dummy_config) => Arc::new(dummy::DummyGateway::new(dummy_config.clone())),
    }
}

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors that can occur while talking to the payment gateway
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Failed to authenticate with the payment gateway")]
    Auth,

    #[error("Gateway request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Gateway rejected the charge: {0}")]
    ChargeRejected(String),

    #[error("Invalid payment response from gateway: missing {0}")]
    InvalidResponse(&'static str),
}

/// A Pix charge created at the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixCharge {
    /// Provider-side transaction id; some provider responses omit it.
    pub provider_transaction_id: Option<String>,
    pub qr_code: String,
    pub qr_code_payload: String,
}

/// Abstract Pix gateway interface
#[async_trait]
pub trait PixGateway: Send + Sync {
    /// Create a Pix charge tied to an intake session.
    ///
    /// The session id travels as the charge's external reference and
    /// metadata, which is how the confirmation webhook finds its way back.
    /// Implementations must fail without side effects when the provider
    /// response is incomplete - partial charges are never returned.
    async fn create_charge(&self, session_id: SessionId, amount_cents: i64, description: &str) -> Result<PixCharge>;
}
