//! HTTP handlers for payment processing: intent creation and the provider
//! webhook that confirms charges and drives `PAY -> BUILD`.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::SqlitePool;

use crate::{
    AppState,
    api::models::payments::{PaymentIntentRequest, PaymentIntentResponse, WebhookPayload},
    auth::CurrentUser,
    db::{
        errors::DbError,
        handlers::{Payments, Prds},
        models::{
            payments::{self, PaymentCreateDBRequest},
            prds::TransitionOutcome,
        },
    },
    errors::Error,
    lifecycle,
    types::{SessionId, abbrev_uuid},
};

/// Create a Pix payment intent for an intake session.
///
/// Two-step gateway exchange; nothing is persisted unless the provider
/// returned a complete charge.
#[utoipa::path(
    post,
    path = "/payments/pix",
    tag = "payments",
    request_body = PaymentIntentRequest,
    responses(
        (status = 200, description = "Pending payment created", body = PaymentIntentResponse),
        (status = 400, description = "Missing session_id"),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 500, description = "Gateway not configured, or the gateway exchange failed"),
    ),
    security(("BearerAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_payment_intent(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(request): Json<PaymentIntentRequest>,
) -> Result<Json<PaymentIntentResponse>, Error> {
    let Some(session_id) = request.session_id else {
        return Err(Error::BadRequest {
            message: "session_id is required".to_string(),
        });
    };

    let (Some(settings), Some(gateway)) = (state.config.payment.as_ref(), state.gateway.as_ref()) else {
        return Err(Error::Internal {
            operation: "create payment intent: no payment gateway is configured".to_string(),
        });
    };

    let description = format!("Payment for session {session_id}");
    let charge = gateway.create_charge(session_id, settings.amount_cents, &description).await?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let record = Payments::new(&mut conn)
        .create(&PaymentCreateDBRequest {
            owner_id: user.id,
            session_id,
            provider_transaction_id: charge.provider_transaction_id,
            qr_code: charge.qr_code,
            qr_code_payload: charge.qr_code_payload,
        })
        .await?;

    Ok(Json(PaymentIntentResponse {
        qr_code: record.qr_code,
        qr_code_payload: record.qr_code_payload,
        payment_id: record.id,
        status: record.status,
    }))
}

#[derive(Debug, Deserialize)]
pub struct WebhookQuery {
    pub token: Option<String>,
}

/// Payment provider webhook.
///
/// Once the caller is authorized and the payload carries a transaction id and
/// status, this always acknowledges with 200: the provider delivers
/// at-least-once and a non-2xx would trigger its retry storm. Correctness
/// under redelivery comes from the guarded writes inside
/// [`reconcile_payment`], not from rejecting duplicates.
#[utoipa::path(
    post,
    path = "/webhooks/syncpay",
    tag = "payments",
    request_body = WebhookPayload,
    params(("token" = Option<String>, Query, description = "Shared webhook token")),
    responses(
        (status = 200, description = "Acknowledged"),
        (status = 400, description = "Payload missing transaction id or status"),
        (status = 401, description = "Missing or wrong token"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    Query(query): Query<WebhookQuery>,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<Value>, Error> {
    let expected = state.config.webhook_token.as_deref();
    if expected.is_none() || query.token.as_deref() != expected {
        return Err(Error::Unauthenticated { message: None });
    }

    let (Some(provider_transaction_id), Some(status)) = (payload.provider_transaction_id(), payload.status.as_deref())
    else {
        return Err(Error::BadRequest {
            message: "Invalid webhook data".to_string(),
        });
    };

    reconcile_payment(&state.db, provider_transaction_id, status, payload.session_hint()).await;

    Ok(Json(json!({ "success": true })))
}

/// Reconcile a provider notification with the store.
///
/// Three steps: normalize the payment matched by transaction id, normalize
/// every payment for the resolved session, then the guarded `PAY -> BUILD`
/// advance. Store errors are logged and swallowed - the webhook must still
/// acknowledge, and a dropped transition is repaired by the next redelivery.
pub(crate) async fn reconcile_payment(
    pool: &SqlitePool,
    provider_transaction_id: &str,
    status: &str,
    session_hint: Option<SessionId>,
) {
    let mut conn = match pool.acquire().await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::error!("Webhook reconciliation could not reach the store: {e:#}");
            return;
        }
    };

    // Step 1: the payment row may not be visible yet (out-of-order delivery),
    // so a miss here is tolerated.
    let matched = match Payments::new(&mut conn)
        .update_status_by_transaction(provider_transaction_id, payments::normalized_status(status))
        .await
    {
        Ok(matched) => matched,
        Err(e) => {
            tracing::error!("Payment update error: {e:#}");
            None
        }
    };

    if !payments::provider_status_is_paid(status) {
        return;
    }

    let Some(session_id) = session_hint.or_else(|| matched.map(|payment| payment.session_id)) else {
        tracing::warn!(
            "Paid webhook for transaction {} carries no session reference and matches no payment",
            provider_transaction_id
        );
        return;
    };

    tracing::info!("Processing payment confirmation for session {}", abbrev_uuid(&session_id));

    // Step 2: cover webhooks whose transaction id differs from the stored one.
    if let Err(e) = Payments::new(&mut conn).normalize_paid_by_session(session_id).await {
        tracing::error!("Payments bulk update error: {e:#}");
    }

    // Step 3: the conditional advance. Duplicates and stragglers land in
    // Skipped, never in a regression.
    match Prds::new(&mut conn)
        .advance(session_id, lifecycle::PAYMENT_CONFIRMED, None)
        .await
    {
        Ok(TransitionOutcome::Applied) => {
            tracing::info!("PRD {} transitioned from PAY to BUILD", abbrev_uuid(&session_id));
        }
        Ok(TransitionOutcome::Skipped { current }) => {
            tracing::info!(
                "PRD {} already in state {}, skipping transition to BUILD",
                abbrev_uuid(&session_id),
                current
            );
        }
        Ok(TransitionOutcome::Missing) => {
            tracing::warn!("PRD {} not found", abbrev_uuid(&session_id));
        }
        Err(e) => {
            tracing::error!("PRD update error: {e:#}");
        }
    }
}
