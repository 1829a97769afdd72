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
        table: Option<String>,
        message: String,
    },

    /// Foreign key constraint violation
    #[error("Foreign key constraint violation")]
    ForeignKeyViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Check constraint violation
    #[error("Check constraint violation")]
    CheckViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

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
                let message = db_err.message().to_string();
                // SQLite does not report the table or constraint name through the driver, so we
                // recover them from the message ("UNIQUE constraint failed: users.email").
                let (table, constraint) = match db_err.table() {
                    Some(table) => (Some(table.to_string()), db_err.constraint().map(|s| s.to_string())),
                    None => parse_sqlite_constraint(&message),
                };

                if db_err.is_unique_violation() {
                    DbError::UniqueViolation {
                        constraint,
                        table,
                        message,
                    }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation {
                        constraint,
                        table,
                        message,
                    }
                } else if db_err.is_check_violation() {
                    DbError::CheckViolation {
                        constraint,
                        table,
                        message,
                    }
                } else {
                    // All other database errors are non-recoverable - convert to anyhow
                    DbError::Other(anyhow::Error::from(err))
                }
            }
            // All other sqlx errors are non-recoverable - convert to anyhow with context
            _ => DbError::Other(anyhow::Error::from(err)),
        }
    }
}

/// Extract `(table, constraint)` from a SQLite constraint failure message.
///
/// Unique violations look like `UNIQUE constraint failed: income.user_id, income.id`; the table is
/// taken from the first column and the full column list is returned as the constraint.
fn parse_sqlite_constraint(message: &str) -> (Option<String>, Option<String>) {
    let Some((_, columns)) = message.split_once("constraint failed: ") else {
        return (None, None);
    };
    let columns = columns.trim();
    let table = columns
        .split(',')
        .next()
        .and_then(|first| first.trim().split_once('.'))
        .map(|(table, _)| table.to_string());

    (table, Some(columns.to_string()))
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;
