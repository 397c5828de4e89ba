//! Database repository for intake answers.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        models::answers::{AnswerCreateDBRequest, IntakeAnswer},
    },
    types::{OwnerId, SessionId, abbrev_uuid},
};

pub struct IntakeAnswers<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> IntakeAnswers<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Bulk insert for one session. Answers are immutable: the first write
    /// for a `(session, key)` pair wins, later conflicts are ignored.
    /// Returns how many rows were actually inserted.
    #[instrument(skip(self, answers), fields(session_id = %abbrev_uuid(&session_id), count = answers.len()), err)]
    pub async fn bulk_insert(
        &mut self,
        session_id: SessionId,
        owner_id: OwnerId,
        answers: &[AnswerCreateDBRequest],
    ) -> Result<u64> {
        let now = Utc::now();
        let mut inserted = 0;

        for answer in answers {
            let result = sqlx::query(
                r#"
                INSERT INTO intake_answers (session_id, question_key, owner_id, answer_text, created_at)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT (session_id, question_key) DO NOTHING
                "#,
            )
            .bind(session_id)
            .bind(&answer.question_key)
            .bind(owner_id)
            .bind(&answer.answer_text)
            .bind(now)
            .execute(&mut *self.db)
            .await?;

            inserted += result.rows_affected();
        }

        Ok(inserted)
    }

    /// All answers for a session, ordered by question key.
    #[instrument(skip(self), fields(session_id = %abbrev_uuid(&session_id)), err)]
    pub async fn fetch_for_session(&mut self, session_id: SessionId) -> Result<Vec<IntakeAnswer>> {
        let answers = sqlx::query_as::<_, IntakeAnswer>(
            "SELECT * FROM intake_answers WHERE session_id = ? ORDER BY question_key",
        )
        .bind(session_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(answers)
    }
}
