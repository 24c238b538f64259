// SPDX-License-Identifier: Apache-2.0

//! Commands
//!
//! The surface a UI shell calls. Every command takes the shared `AppState`
//! and reports failures inside its response instead of returning `Err`, so
//! the caller always gets a status hint it can show.

pub mod chart;
pub mod connection;
pub mod query;
pub mod schema;
pub mod table;

use serde::Serialize;
use vitalake_core::{EngineError, EngineResult};

use crate::hints::ErrorHint;

/// Response wrapper shared by all commands
#[derive(Debug, Clone, Serialize)]
pub struct CommandResponse<T> {
    pub success: bool,
    pub result: Option<T>,
    pub error: Option<String>,
    pub hint: Option<ErrorHint>,
}

impl<T> CommandResponse<T> {
    pub fn ok(result: T) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
            hint: None,
        }
    }

    pub fn failed(error: &EngineError) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.to_string()),
            hint: Some(ErrorHint::from_error(error)),
        }
    }

    pub fn into_result(self) -> Option<T> {
        self.result
    }
}

impl<T> From<EngineResult<T>> for CommandResponse<T> {
    fn from(outcome: EngineResult<T>) -> Self {
        match outcome {
            Ok(result) => Self::ok(result),
            Err(e) => Self::failed(&e),
        }
    }
}
