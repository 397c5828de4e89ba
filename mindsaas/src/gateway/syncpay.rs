//! SyncPay gateway implementation.
//!
//! Two-step exchange: a client-credentials token request, then the Pix charge
//! itself with the session id as external reference and metadata.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::SyncpayConfig;
use crate::gateway::{GatewayError, PixCharge, PixGateway, Result};
use crate::types::SessionId;

pub struct SyncpayGateway {
    http: reqwest::Client,
    config: SyncpayConfig,
}

impl SyncpayGateway {
    pub fn new(config: SyncpayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.as_str().trim_end_matches('/'), path)
    }

    async fn access_token(&self) -> Result<String> {
        let response = self
            .http
            .post(self.endpoint("/auth/token"))
            .json(&json!({
                "client_id": self.config.client_id,
                "client_secret": self.config.client_secret,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GatewayError::Auth);
        }

        let token: TokenResponse = response.json().await.map_err(|_| GatewayError::Auth)?;
        Ok(token.access_token)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// The provider has shipped both spellings of each field; accept either.
#[derive(Deserialize)]
struct ChargeResponse {
    id: Option<String>,
    transaction_id: Option<String>,
    qr_code: Option<String>,
    qrcode_base64: Option<String>,
    qr_code_payload: Option<String>,
    pix_copy_paste: Option<String>,
}

#[async_trait]
impl PixGateway for SyncpayGateway {
    #[tracing::instrument(skip(self, description), err)]
    async fn create_charge(&self, session_id: SessionId, amount_cents: i64, description: &str) -> Result<PixCharge> {
        let token = self.access_token().await?;

        let response = self
            .http
            .post(self.endpoint("/payments/pix"))
            .bearer_auth(token)
            .json(&json!({
                "amount": amount_cents,
                "description": description,
                "external_reference": session_id,
                "metadata": { "session_id": session_id },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GatewayError::ChargeRejected(detail));
        }

        let charge: ChargeResponse = response.json().await?;

        let provider_transaction_id = charge.id.or(charge.transaction_id);
        let qr_code = charge
            .qr_code
            .or(charge.qrcode_base64)
            .ok_or(GatewayError::InvalidResponse("qr_code"))?;
        let qr_code_payload = charge
            .qr_code_payload
            .or(charge.pix_copy_paste)
            .ok_or(GatewayError::InvalidResponse("qr_code_payload"))?;

        tracing::info!("Created Pix charge for session {}", session_id);

        Ok(PixCharge {
            provider_transaction_id,
            qr_code,
            qr_code_payload,
        })
    }
}
