// SPDX-License-Identifier: Apache-2.0

//! User-facing error hints
//!
//! Maps an `EngineError` onto an HTTP-style status code with a short title
//! and a suggestion the UI can show next to the raw message.

use serde::{Deserialize, Serialize};
use vitalake_core::EngineError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorHint {
    pub status: u16,
    pub title: String,
    pub details: String,
}

impl ErrorHint {
    fn new(status: u16, title: &str, details: &str) -> Self {
        Self {
            status,
            title: title.to_string(),
            details: details.to_string(),
        }
    }

    pub fn from_error(error: &EngineError) -> Self {
        match error {
            EngineError::ConnectionFailed { .. } => Self::new(
                503,
                "Connection refused",
                "The database server is not reachable. Check that PostgreSQL is running and the host and port are correct.",
            ),
            EngineError::HostNotFound { .. } => Self::new(
                404,
                "Host not found",
                "The database host name could not be resolved. Check the host setting.",
            ),
            EngineError::AuthenticationFailed { .. } => Self::new(
                401,
                "Authentication failed",
                "The username or password was rejected by the server.",
            ),
            EngineError::DatabaseNotFound { .. } => Self::new(
                404,
                "Database not found",
                "The database does not exist. Check the database name or create it first.",
            ),
            EngineError::PermissionDenied { .. } => Self::new(
                403,
                "Permission denied",
                "The database user lacks privileges for this operation.",
            ),
            EngineError::SyntaxError { .. } => Self::new(
                400,
                "SQL syntax error",
                "Check the query near the position reported by the server.",
            ),
            EngineError::ValidationError { .. } => {
                Self::new(400, "Invalid request", "Check the values entered and try again.")
            }
            EngineError::Timeout { .. } => Self::new(
                500,
                "Query timed out",
                "The operation took too long. Add filters or reduce the page size.",
            ),
            _ => Self::new(
                500,
                "Database error",
                "An unexpected error occurred while talking to the database.",
            ),
        }
    }
}
