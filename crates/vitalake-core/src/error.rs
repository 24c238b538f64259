// SPDX-License-Identifier: Apache-2.0

//! Normalized error types for VitaLake
//!
//! Driver-specific failures are mapped to these variants so callers can
//! pick a user-facing hint without inspecting raw driver messages.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for engine, builder and coordinator operations
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum EngineError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Host not found: {message}")]
    HostNotFound { message: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Database not found: {message}")]
    DatabaseNotFound { message: String },

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("Query syntax error: {message}")]
    SyntaxError { message: String },

    #[error("Query execution error: {message}")]
    ExecutionError { message: String },

    #[error("Operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Connection not found: {connection_id}")]
    ConnectionNotFound { connection_id: String },

    #[error("Session not found or expired: {session_id}")]
    SessionNotFound { session_id: String },

    #[error("Driver not found: {driver_id}")]
    DriverNotFound { driver_id: String },

    #[error("Feature not supported: {message}")]
    NotSupported { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl EngineError {
    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed { message: msg.into() }
    }

    pub fn host_not_found(msg: impl Into<String>) -> Self {
        Self::HostNotFound { message: msg.into() }
    }

    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::AuthenticationFailed { message: msg.into() }
    }

    pub fn database_not_found(msg: impl Into<String>) -> Self {
        Self::DatabaseNotFound { message: msg.into() }
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied { message: msg.into() }
    }

    pub fn syntax_error(msg: impl Into<String>) -> Self {
        Self::SyntaxError { message: msg.into() }
    }

    pub fn execution_error(msg: impl Into<String>) -> Self {
        Self::ExecutionError { message: msg.into() }
    }

    pub fn connection_not_found(id: impl Into<String>) -> Self {
        Self::ConnectionNotFound { connection_id: id.into() }
    }

    pub fn session_not_found(id: impl Into<String>) -> Self {
        Self::SessionNotFound { session_id: id.into() }
    }

    pub fn driver_not_found(id: impl Into<String>) -> Self {
        Self::DriverNotFound { driver_id: id.into() }
    }

    pub fn not_supported(msg: impl Into<String>) -> Self {
        Self::NotSupported { message: msg.into() }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationError { message: msg.into() }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal { message: msg.into() }
    }

    /// Best-effort classification of an unstructured driver message.
    ///
    /// Drivers should prefer structured codes (SQLSTATE, IO error kinds) and
    /// only fall back to this when nothing else is available.
    pub fn from_driver_message(msg: impl Into<String>) -> Self {
        let message = msg.into();
        let lower = message.to_ascii_lowercase();

        if lower.contains("econnrefused") || lower.contains("connection refused") {
            Self::ConnectionFailed { message }
        } else if lower.contains("enotfound")
            || lower.contains("failed to lookup address")
            || lower.contains("name or service not known")
        {
            Self::HostNotFound { message }
        } else if lower.contains("authentication failed") {
            Self::AuthenticationFailed { message }
        } else if lower.contains("database") && lower.contains("does not exist") {
            Self::DatabaseNotFound { message }
        } else if lower.contains("permission denied") {
            Self::PermissionDenied { message }
        } else if lower.contains("syntax error") {
            Self::SyntaxError { message }
        } else {
            Self::ExecutionError { message }
        }
    }

    /// True for failures that come from local validation and never reached
    /// the database.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::ValidationError { .. })
    }
}

/// Result type alias for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn driver_messages_map_to_categories() {
        assert!(matches!(
            EngineError::from_driver_message("connect ECONNREFUSED 127.0.0.1:5432"),
            EngineError::ConnectionFailed { .. }
        ));
        assert!(matches!(
            EngineError::from_driver_message("getaddrinfo ENOTFOUND db.internal"),
            EngineError::HostNotFound { .. }
        ));
        assert!(matches!(
            EngineError::from_driver_message("password authentication failed for user \"bob\""),
            EngineError::AuthenticationFailed { .. }
        ));
        assert!(matches!(
            EngineError::from_driver_message("database \"sales\" does not exist"),
            EngineError::DatabaseNotFound { .. }
        ));
        assert!(matches!(
            EngineError::from_driver_message("permission denied for table payroll"),
            EngineError::PermissionDenied { .. }
        ));
        assert!(matches!(
            EngineError::from_driver_message("syntax error at or near \"SELEC\""),
            EngineError::SyntaxError { .. }
        ));
        assert!(matches!(
            EngineError::from_driver_message("division by zero"),
            EngineError::ExecutionError { .. }
        ));
    }

    #[test]
    fn display_includes_message() {
        let err = EngineError::validation("Page must be positive");
        assert_eq!(err.to_string(), "Validation error: Page must be positive");
        assert!(err.is_validation());
    }
}
