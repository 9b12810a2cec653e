use thiserror::Error;

/// Errors surfaced by the domain services.
///
/// Everything here is a per-request, recoverable condition; the API layer
/// decides the status code and user-visible message.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    /// Deliberately carries no detail: unknown email and wrong password are
    /// indistinguishable to the caller.
    #[error("Invalid email or password")]
    Authentication,

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Authorization(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
