//! Best-effort delivery records.
//!
//! The deliveries table is an optional side effect of the trusted
//! state-update path. Callers treat a missing table
//! ([`crate::db::errors::is_missing_table`]) as "skip", not as a failure.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;

use crate::{
    db::errors::Result,
    types::{PrdId, abbrev_uuid},
};

pub struct Deliveries<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Deliveries<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Record (or refresh) where a PRD was delivered.
    #[instrument(skip(self), fields(prd_id = %abbrev_uuid(&prd_id)), err)]
    pub async fn upsert(&mut self, prd_id: PrdId, delivered_url: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO deliveries (prd_id, delivered_url, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT (prd_id) DO UPDATE SET delivered_url = excluded.delivered_url, updated_at = excluded.updated_at
            "#,
        )
        .bind(prd_id)
        .bind(delivered_url)
        .bind(Utc::now())
        .execute(&mut *self.db)
        .await?;

        Ok(())
    }

    /// The recorded delivery URL for a PRD, if any.
    pub async fn fetch_url(&mut self, prd_id: PrdId) -> Result<Option<String>> {
        let url = sqlx::query_scalar::<_, String>("SELECT delivered_url FROM deliveries WHERE prd_id = ?")
            .bind(prd_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(url)
    }
}
