//! Database repository for payment records.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    db::{
        errors::Result,
        models::payments::{self, PaymentCreateDBRequest, PaymentRecord},
    },
    types::{SessionId, abbrev_uuid},
};

pub struct Payments<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Payments<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Persist a freshly created payment intent as `PENDING`.
    #[instrument(skip(self, request), fields(session_id = %abbrev_uuid(&request.session_id)), err)]
    pub async fn create(&mut self, request: &PaymentCreateDBRequest) -> Result<PaymentRecord> {
        let now = Utc::now();

        let record = sqlx::query_as::<_, PaymentRecord>(
            r#"
            INSERT INTO payments (id, owner_id, session_id, provider_transaction_id, qr_code, qr_code_payload, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(request.owner_id)
        .bind(request.session_id)
        .bind(request.provider_transaction_id.as_deref())
        .bind(&request.qr_code)
        .bind(&request.qr_code_payload)
        .bind(payments::PENDING)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(record)
    }

    /// Update the payment matched by the provider's transaction id. A missing
    /// row is a normal outcome: the payment may not be visible yet when the
    /// webhook arrives out of order.
    #[instrument(skip(self), err)]
    pub async fn update_status_by_transaction(
        &mut self,
        provider_transaction_id: &str,
        status: &str,
    ) -> Result<Option<PaymentRecord>> {
        let record = sqlx::query_as::<_, PaymentRecord>(
            "UPDATE payments SET status = ?, updated_at = ? WHERE provider_transaction_id = ? RETURNING *",
        )
        .bind(status)
        .bind(Utc::now())
        .bind(provider_transaction_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(record)
    }

    /// Mark every payment for the session as settled. Covers webhooks whose
    /// transaction id differs from the one stored at intent creation.
    #[instrument(skip(self), fields(session_id = %abbrev_uuid(&session_id)), err)]
    pub async fn normalize_paid_by_session(&mut self, session_id: SessionId) -> Result<u64> {
        let result = sqlx::query("UPDATE payments SET status = ?, updated_at = ? WHERE session_id = ?")
            .bind(payments::PAID)
            .bind(Utc::now())
            .bind(session_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected())
    }

    /// All payments for a session, oldest first.
    pub async fn fetch_for_session(&mut self, session_id: SessionId) -> Result<Vec<PaymentRecord>> {
        let records = sqlx::query_as::<_, PaymentRecord>(
            "SELECT * FROM payments WHERE session_id = ? ORDER BY created_at ASC",
        )
        .bind(session_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(records)
    }
}
