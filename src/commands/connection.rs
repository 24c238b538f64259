// SPDX-License-Identifier: Apache-2.0

//! Connection Commands
//!
//! Saved connection profiles, connection tests and health checks.

use std::time::Instant;

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::commands::CommandResponse;
use crate::engine::DriverInfo;
use crate::storage::{ConnectionInput, ConnectionSummary};
use crate::AppState;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub healthy: bool,
    pub latency_ms: Option<f64>,
    pub host: String,
    pub port: u16,
    pub database: Option<String>,
}

pub fn list_connections(state: &AppState) -> CommandResponse<Vec<ConnectionSummary>> {
    CommandResponse::ok(state.connections.list())
}

pub fn list_drivers(state: &AppState) -> CommandResponse<Vec<DriverInfo>> {
    CommandResponse::ok(state.registry.list_infos())
}

#[instrument(skip(state, input), fields(name = %input.name, host = %input.host))]
pub fn save_connection(
    state: &AppState,
    input: ConnectionInput,
) -> CommandResponse<ConnectionSummary> {
    state.connections.create(input).into()
}

/// Updates a profile and closes its open session so the next request
/// reconnects with the new settings.
#[instrument(skip(state, input), fields(connection_id = %connection_id))]
pub async fn update_connection(
    state: &AppState,
    connection_id: &str,
    input: ConnectionInput,
) -> CommandResponse<ConnectionSummary> {
    let updated = state.connections.update(connection_id, input);
    if updated.is_ok() {
        close_session(state, connection_id).await;
    }
    updated.into()
}

#[instrument(skip(state), fields(connection_id = %connection_id))]
pub async fn delete_connection(state: &AppState, connection_id: &str) -> CommandResponse<()> {
    let deleted = state.connections.delete(connection_id);
    if deleted.is_ok() {
        close_session(state, connection_id).await;
    }
    deleted.into()
}

async fn close_session(state: &AppState, connection_id: &str) {
    if let Err(e) = state.session_manager.disconnect_connection(connection_id).await {
        warn!(connection_id, error = %e, "Failed to close session");
    }
}

/// Tries the settings without saving them
#[instrument(skip(state, input), fields(host = %input.host))]
pub async fn test_connection(state: &AppState, input: &ConnectionInput) -> CommandResponse<()> {
    let outcome = match input.to_config() {
        Ok(config) => state.session_manager.test_connection(&config).await,
        Err(e) => Err(e),
    };
    if outcome.is_ok() {
        info!("Connection test succeeded");
    }
    outcome.into()
}

/// Runs a trivial statement on the connection's session and reports the
/// round trip.
#[instrument(skip(state), fields(connection_id = ?connection_id))]
pub async fn health_check(
    state: &AppState,
    connection_id: Option<&str>,
) -> CommandResponse<HealthStatus> {
    let config = match state.connection_config(connection_id) {
        Ok(config) => config,
        Err(e) => return CommandResponse::failed(&e),
    };

    let started = Instant::now();
    let outcome = match state.session_for(connection_id).await {
        Ok(session) => {
            state
                .session_manager
                .execute(session, "SELECT 1 AS health_check")
                .await
        }
        Err(e) => Err(e),
    };

    match outcome {
        Ok(_) => CommandResponse::ok(HealthStatus {
            healthy: true,
            latency_ms: Some(started.elapsed().as_secs_f64() * 1000.0),
            host: config.host,
            port: config.port,
            database: config.database,
        }),
        Err(e) => CommandResponse {
            result: Some(HealthStatus {
                healthy: false,
                latency_ms: None,
                host: config.host,
                port: config.port,
                database: config.database,
            }),
            ..CommandResponse::failed(&e)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::state_with;
    use crate::engine::testing::MockDriver;
    use crate::observability::Sensitive;
    use vitalake_core::EngineError;

    fn input(name: &str) -> ConnectionInput {
        ConnectionInput {
            name: name.to_string(),
            host: "localhost".to_string(),
            database: "app".to_string(),
            username: "app".to_string(),
            password: Some(Sensitive::new("pw".to_string())),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn profile_lifecycle() {
        let (state, _driver, _dir) = state_with(MockDriver::new("postgres"));

        let saved = save_connection(&state, input("local")).into_result().unwrap();
        assert_eq!(list_connections(&state).into_result().unwrap().len(), 1);

        // Opening a session, then updating, forces a reconnect
        let first = state.session_for(Some(saved.id.as_str())).await.unwrap();
        let updated = update_connection(&state, &saved.id, input("local-2")).await;
        assert!(updated.success);
        assert!(!state.session_manager.session_exists(first).await);

        assert!(delete_connection(&state, &saved.id).await.success);
        assert!(!delete_connection(&state, &saved.id).await.success);
    }

    #[tokio::test]
    async fn test_connection_validates_input() {
        let (state, _driver, _dir) = state_with(MockDriver::new("postgres"));

        assert!(test_connection(&state, &input("local")).await.success);

        let mut incomplete = input("local");
        incomplete.database.clear();
        let response = test_connection(&state, &incomplete).await;
        assert_eq!(response.hint.map(|h| h.status), Some(400));
    }

    #[tokio::test]
    async fn health_check_reports_failures() {
        let driver = MockDriver::new("postgres");
        driver.push_failure(EngineError::connection_failed("connection refused"));
        let (state, _driver, _dir) = state_with(driver);

        let down = health_check(&state, None).await;
        assert!(!down.success);
        assert_eq!(down.result.as_ref().map(|h| h.healthy), Some(false));
        assert_eq!(down.hint.map(|h| h.status), Some(503));

        let up = health_check(&state, None).await;
        let status = up.into_result().unwrap();
        assert!(status.healthy);
        assert_eq!(status.host, "localhost");
    }

    #[test]
    fn drivers_are_listed() {
        let (state, _driver, _dir) = state_with(MockDriver::new("postgres"));
        let drivers = list_drivers(&state).into_result().unwrap();
        assert_eq!(drivers.len(), 1);
    }
}
