//! Error types for the Tessera content subsystem.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TesseraError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },

    #[error("Invalid order: {reason}")]
    InvalidOrder { reason: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`TesseraError`], so callers can render
/// "does not exist" and "forbidden" differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    InvalidOrder,
    InvalidInput,
    Internal,
}

impl TesseraError {
    pub fn not_found(entity: &str, id: impl ToString) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden {
            reason: reason.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::InvalidOrder { .. } => ErrorKind::InvalidOrder,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::Database(_) | Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

pub type TesseraResult<T> = Result<T, TesseraError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_and_forbidden_are_distinct_kinds() {
        let missing = TesseraError::not_found("saved_chart", "abc");
        let denied = TesseraError::forbidden("no access");
        assert_eq!(missing.kind(), ErrorKind::NotFound);
        assert_eq!(denied.kind(), ErrorKind::Forbidden);
        assert_eq!(
            missing.to_string(),
            "Entity not found: saved_chart with id abc"
        );
    }

    #[test]
    fn storage_failures_are_internal() {
        assert_eq!(
            TesseraError::Database("boom".into()).kind(),
            ErrorKind::Internal
        );
    }
}
