use thiserror::Error;

/// Unified error type for database operations that application code can handle
#[derive(Error, Debug)]
pub enum DbError {
    /// Entity not found by the given identifier
    #[error("Entity not found")]
    NotFound,

    /// Unique constraint violation
    #[error("Unique constraint violation")]
    UniqueViolation {
        constraint: Option<String>,
        message: String,
    },

    /// Foreign key constraint violation
    #[error("Foreign key constraint violation")]
    ForeignKeyViolation {
        constraint: Option<String>,
        message: String,
    },

    /// A write reported success but its RETURNING clause produced no row.
    /// Treated as a broken invariant rather than silently ignored.
    #[error("{operation} succeeded but returned no row")]
    WriteReturnedNoRow { operation: &'static str },

    /// Catch-all for non-recoverable errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convert from sqlx::Error using proper sqlx error categorization
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    DbError::UniqueViolation {
                        constraint: db_err.constraint().map(|s| s.to_string()),
                        message: db_err.message().to_string(),
                    }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation {
                        constraint: db_err.constraint().map(|s| s.to_string()),
                        message: db_err.message().to_string(),
                    }
                } else {
                    // All other database errors are non-recoverable - convert to anyhow
                    DbError::Other(anyhow::Error::from(err))
                }
            }
            // All other sqlx errors are non-recoverable - convert to anyhow
            _ => DbError::Other(anyhow::Error::from(err)),
        }
    }
}

/// SQLite reports a statement against an absent table as a plain database
/// error whose message starts with "no such table". The deliveries table is
/// optional, so its writers need to recognize this case and move on.
pub fn is_missing_table(err: &DbError) -> bool {
    match err {
        DbError::Other(e) => e.chain().any(|cause| cause.to_string().contains("no such table")),
        _ => false,
    }
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;
