//! Content-layer error types.

use tessera_core::error::TesseraError;
use thiserror::Error;

/// A malformed cron expression.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CronError {
    #[error("expected 5 cron fields, found {0}")]
    FieldCount(usize),

    #[error("invalid {field} value: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("{field} value {value} is out of range {min}-{max}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("invalid {field} step: {value}")]
    InvalidStep { field: &'static str, value: String },

    #[error("{field} range {start}-{end} is reversed")]
    ReversedRange {
        field: &'static str,
        start: u32,
        end: u32,
    },
}

impl From<CronError> for TesseraError {
    fn from(err: CronError) -> Self {
        TesseraError::InvalidInput {
            message: format!("invalid cron expression: {err}"),
        }
    }
}

/// Failure of an external collaborator called after commit. Logged,
/// never returned to the caller of the mutation.
#[derive(Debug, Error)]
pub enum SideEffectError {
    #[error("{service} unavailable: {message}")]
    Unavailable {
        service: &'static str,
        message: String,
    },

    #[error("{service} rejected the request: {message}")]
    Rejected {
        service: &'static str,
        message: String,
    },
}
