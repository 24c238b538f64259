// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;
use vitalake_core::EngineError;

/// Errors raised while validating filters or assembling a statement.
///
/// All of these are local validation failures: nothing has been sent to the
/// database when one is returned.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Invalid value for column {column}: {message}")]
    InvalidValue { column: String, message: String },

    #[error("Page must be a positive integer")]
    InvalidPage,

    #[error("Page size must be between 1 and {max}")]
    InvalidPageSize { max: u32 },

    #[error("Page must be between 1 and {max}")]
    PageOutOfRange { max: u64 },

    #[error("Identifier must not be empty")]
    EmptyIdentifier,

    #[error("Limit must be positive")]
    InvalidLimit,
}

pub type BuildResult<T> = Result<T, QueryError>;

impl From<QueryError> for EngineError {
    fn from(err: QueryError) -> Self {
        EngineError::validation(err.to_string())
    }
}
