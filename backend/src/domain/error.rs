use thiserror::Error;

/// Domain failure taxonomy.
///
/// Every operation surfaces one of these kinds; the REST layer maps them to
/// HTTP statuses. Store transactions roll back before an error is surfaced,
/// so a failed operation leaves no partial state.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A referenced entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// A uniqueness rule was violated (duplicate standard fee, duplicate
    /// email)
    #[error("{0}")]
    Conflict(String),

    /// The request is inconsistent: mismatched course/semester, missing
    /// amount with no fallback, enrollment precondition unmet
    #[error("{0}")]
    BadRequest(String),

    /// Role or ownership check failed
    #[error("{0}")]
    Forbidden(String),

    /// Store or render failure not attributable to caller input
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }
}

/// Unique-constraint violations become conflicts so the store constraint,
/// not the application pre-check, decides races like two concurrent
/// standard-fee creations for the same pair. Everything else is internal.
impl From<sqlx::Error> for DomainError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::Database(db)
                if db.kind() == sqlx::error::ErrorKind::UniqueViolation =>
            {
                Self::Conflict("a record with the same unique value already exists".to_string())
            }
            _ => Self::Internal(anyhow::Error::new(error)),
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
