//! Database repository for PRD instances and their lifecycle transitions.
//!
//! All state mutations go through [`Prds::advance`], whose `WHERE state = ?`
//! predicate is the compare-and-swap that keeps concurrent webhook deliveries
//! and overlapping runner passes from ever moving a PRD backward. The one
//! exception is [`Prds::force_state`], the trusted-pipeline write, which is
//! deliberately unconditional.

use chrono::Utc;
use sqlx::SqliteConnection;
use sqlx::types::Json;
use tracing::instrument;

use crate::{
    db::{
        errors::{DbError, Result},
        models::prds::{PrdInstance, PrdUpsertDBRequest, PrdUpsertOutcome, TransitionOutcome},
    },
    lifecycle::{PrdState, Transition},
    types::{PrdId, abbrev_uuid},
};

pub struct Prds<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Prds<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Create-or-reset: afterwards the row is in `PAY` with the given
    /// document, whatever it looked like before. Resubmitting a questionnaire
    /// restarts billing, not build.
    #[instrument(skip(self, request), fields(session_id = %abbrev_uuid(&request.session_id)), err)]
    pub async fn upsert(&mut self, request: &PrdUpsertDBRequest) -> Result<PrdUpsertOutcome> {
        let now = Utc::now();

        let existing = sqlx::query_scalar::<_, PrdId>("SELECT id FROM prd_instances WHERE id = ?")
            .bind(request.session_id)
            .fetch_optional(&mut *self.db)
            .await?;

        let outcome = if existing.is_some() {
            sqlx::query_as::<_, PrdUpsertOutcome>(
                r#"
                UPDATE prd_instances
                SET prd_json = ?, state = ?, updated_at = ?
                WHERE id = ?
                RETURNING id, state
                "#,
            )
            .bind(Json(&request.prd_json))
            .bind(PrdState::Pay)
            .bind(now)
            .bind(request.session_id)
            .fetch_optional(&mut *self.db)
            .await?
        } else {
            // The session id doubles as the instance id so the intake flow can
            // navigate with either.
            sqlx::query_as::<_, PrdUpsertOutcome>(
                r#"
                INSERT INTO prd_instances (id, owner_id, session_id, state, prd_json, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                RETURNING id, state
                "#,
            )
            .bind(request.session_id)
            .bind(request.owner_id)
            .bind(request.session_id)
            .bind(PrdState::Pay)
            .bind(Json(&request.prd_json))
            .bind(now)
            .bind(now)
            .fetch_optional(&mut *self.db)
            .await?
        };

        outcome.ok_or(DbError::WriteReturnedNoRow { operation: "PRD upsert" })
    }

    /// Resolve a PRD by an ambiguous external parameter: the instance id
    /// first, then the originating session id, newest match winning. Both
    /// lookups missing is a normal outcome, not an error.
    #[instrument(skip(self), fields(param = %abbrev_uuid(&param)), err)]
    pub async fn fetch_with_fallback(&mut self, param: PrdId) -> Result<Option<PrdInstance>> {
        let by_id = sqlx::query_as::<_, PrdInstance>("SELECT * FROM prd_instances WHERE id = ?")
            .bind(param)
            .fetch_optional(&mut *self.db)
            .await?;

        if by_id.is_some() {
            return Ok(by_id);
        }

        let by_session = sqlx::query_as::<_, PrdInstance>(
            "SELECT * FROM prd_instances WHERE session_id = ? ORDER BY created_at DESC LIMIT 1",
        )
        .bind(param)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(by_session)
    }

    /// Guarded compare-and-swap advance. The `WHERE state = ?` clause
    /// re-checks the transition's source state inside the write itself, so a
    /// duplicate or late caller is a silent no-op instead of a regression.
    #[instrument(skip(self), fields(id = %abbrev_uuid(&id), from = %transition.from, to = %transition.to), err)]
    pub async fn advance(
        &mut self,
        id: PrdId,
        transition: Transition,
        delivered_url: Option<&str>,
    ) -> Result<TransitionOutcome> {
        debug_assert!(transition.is_allowed(), "{transition:?} is not in the lifecycle table");
        let now = Utc::now();

        let result = match transition.to {
            PrdState::Build => {
                sqlx::query(
                    "UPDATE prd_instances SET state = ?, build_started_at = ?, updated_at = ? WHERE id = ? AND state = ?",
                )
                .bind(transition.to)
                .bind(now)
                .bind(now)
                .bind(id)
                .bind(transition.from)
                .execute(&mut *self.db)
                .await?
            }
            PrdState::Delivered => {
                sqlx::query(
                    r#"
                    UPDATE prd_instances
                    SET state = ?, delivered_at = ?, error_message = NULL,
                        delivered_url = COALESCE(?, delivered_url), updated_at = ?
                    WHERE id = ? AND state = ?
                    "#,
                )
                .bind(transition.to)
                .bind(now)
                .bind(delivered_url)
                .bind(now)
                .bind(id)
                .bind(transition.from)
                .execute(&mut *self.db)
                .await?
            }
            PrdState::Failed => {
                sqlx::query("UPDATE prd_instances SET state = ?, updated_at = ? WHERE id = ? AND state = ?")
                    .bind(transition.to)
                    .bind(now)
                    .bind(id)
                    .bind(transition.from)
                    .execute(&mut *self.db)
                    .await?
            }
            PrdState::Pay => {
                return Err(DbError::Other(anyhow::anyhow!("no lifecycle transition targets PAY")));
            }
        };

        if result.rows_affected() > 0 {
            return Ok(TransitionOutcome::Applied);
        }

        // Guard did not match: report what the row looks like now.
        let current = sqlx::query_scalar::<_, PrdState>("SELECT state FROM prd_instances WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(match current {
            Some(current) => TransitionOutcome::Skipped { current },
            None => TransitionOutcome::Missing,
        })
    }

    /// Oldest-first ids currently queued for build.
    #[instrument(skip(self), err)]
    pub async fn select_build_batch(&mut self, limit: i64) -> Result<Vec<PrdId>> {
        let ids = sqlx::query_scalar::<_, PrdId>(
            "SELECT id FROM prd_instances WHERE state = ? ORDER BY created_at ASC LIMIT ?",
        )
        .bind(PrdState::Build)
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(ids)
    }

    /// Privileged unconditional write used by the trusted pipeline endpoint.
    /// Unlike [`Prds::advance`] this does not re-check the current state;
    /// callers are expected to have validated the target against the
    /// lifecycle table. Returns the id when a row was updated.
    #[instrument(skip(self), fields(id = %abbrev_uuid(&id), state = %state), err)]
    pub async fn force_state(&mut self, id: PrdId, state: PrdState) -> Result<Option<PrdId>> {
        let updated = sqlx::query_scalar::<_, PrdId>(
            "UPDATE prd_instances SET state = ?, updated_at = ? WHERE id = ? RETURNING id",
        )
        .bind(state)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(updated)
    }
}
