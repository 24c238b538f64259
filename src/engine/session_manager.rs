// SPDX-License-Identifier: Apache-2.0

//! Session Manager
//!
//! Owns every open database session and the mapping from saved connection
//! ids to sessions. All driver calls go through here so that connect and
//! query timeouts are applied in one place.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::time::{timeout, Duration};
use tracing::{instrument, warn};
use vitalake_core::{EngineError, EngineResult};
use vitalake_query::{BoundQuery, TableRef};

use crate::engine::traits::DataEngine;
use crate::engine::types::{Column, ConnectionConfig, QueryResult, SessionId, TableInfo};
use crate::engine::DriverRegistry;
use crate::metrics;

/// An open session and the settings it was opened with
pub struct ActiveSession {
    pub driver_id: String,
    pub connection_id: Option<String>,
    pub display_name: String,
}

pub struct SessionManager {
    registry: Arc<DriverRegistry>,
    sessions: RwLock<HashMap<SessionId, ActiveSession>>,
    by_connection: RwLock<HashMap<String, SessionId>>,
    connect_timeout: Duration,
    query_timeout: Duration,
}

impl SessionManager {
    pub fn new(
        registry: Arc<DriverRegistry>,
        connect_timeout: Duration,
        query_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            sessions: RwLock::new(HashMap::new()),
            by_connection: RwLock::new(HashMap::new()),
            connect_timeout,
            query_timeout,
        }
    }

    pub fn registry(&self) -> &Arc<DriverRegistry> {
        &self.registry
    }

    pub fn query_timeout(&self) -> Duration {
        self.query_timeout
    }

    fn driver_for(&self, driver_id: &str) -> EngineResult<Arc<dyn DataEngine>> {
        self.registry
            .get(driver_id)
            .ok_or_else(|| EngineError::driver_not_found(driver_id))
    }

    /// Tests a connection without persisting it
    #[instrument(
        skip(self, config),
        fields(driver = %config.driver, host = %config.host, port = config.port, database = ?config.database)
    )]
    pub async fn test_connection(&self, config: &ConnectionConfig) -> EngineResult<()> {
        let driver = self.driver_for(&config.driver)?;
        with_timeout(self.connect_timeout, driver.test_connection(config)).await
    }

    /// Opens a new session
    #[instrument(
        skip(self, config),
        fields(driver = %config.driver, host = %config.host, port = config.port, database = ?config.database)
    )]
    pub async fn connect(&self, config: &ConnectionConfig) -> EngineResult<SessionId> {
        self.open(config, None).await
    }

    /// Returns the session already open for `connection_id`, opening one
    /// with `config` if there is none.
    #[instrument(skip(self, config), fields(connection_id = %connection_id))]
    pub async fn ensure_connected(
        &self,
        connection_id: &str,
        config: &ConnectionConfig,
    ) -> EngineResult<SessionId> {
        if let Some(session_id) = self.by_connection.read().await.get(connection_id).copied() {
            if self.session_exists(session_id).await {
                return Ok(session_id);
            }
        }

        let session_id = self.open(config, Some(connection_id.to_string())).await?;
        self.by_connection
            .write()
            .await
            .insert(connection_id.to_string(), session_id);
        Ok(session_id)
    }

    async fn open(
        &self,
        config: &ConnectionConfig,
        connection_id: Option<String>,
    ) -> EngineResult<SessionId> {
        let driver = self.driver_for(&config.driver)?;
        let session_id = with_timeout(self.connect_timeout, driver.connect(config)).await?;

        let session = ActiveSession {
            driver_id: config.driver.clone(),
            connection_id,
            display_name: config.display_name(),
        };
        self.sessions.write().await.insert(session_id, session);
        tracing::info!(session_id = %session_id, "Session opened");

        Ok(session_id)
    }

    #[instrument(skip(self), fields(session_id = %session_id))]
    pub async fn disconnect(&self, session_id: SessionId) -> EngineResult<()> {
        let session = self
            .sessions
            .write()
            .await
            .remove(&session_id)
            .ok_or_else(|| EngineError::session_not_found(session_id.to_string()))?;

        if let Some(connection_id) = &session.connection_id {
            self.by_connection.write().await.remove(connection_id);
        }

        let driver = self.driver_for(&session.driver_id)?;
        driver.disconnect(session_id).await
    }

    /// Closes the session opened for a saved connection, if any
    pub async fn disconnect_connection(&self, connection_id: &str) -> EngineResult<()> {
        let session_id = self.by_connection.read().await.get(connection_id).copied();
        match session_id {
            Some(session_id) => self.disconnect(session_id).await,
            None => Ok(()),
        }
    }

    pub async fn get_driver(&self, session_id: SessionId) -> EngineResult<Arc<dyn DataEngine>> {
        let sessions = self.sessions.read().await;
        let session = sessions
            .get(&session_id)
            .ok_or_else(|| EngineError::session_not_found(session_id.to_string()))?;
        self.driver_for(&session.driver_id)
    }

    pub async fn list_sessions(&self) -> Vec<(SessionId, String)> {
        let sessions = self.sessions.read().await;
        sessions
            .iter()
            .map(|(id, session)| (*id, session.display_name.clone()))
            .collect()
    }

    pub async fn session_exists(&self, session_id: SessionId) -> bool {
        self.sessions.read().await.contains_key(&session_id)
    }

    pub async fn execute(&self, session_id: SessionId, sql: &str) -> EngineResult<QueryResult> {
        let driver = self.get_driver(session_id).await?;
        with_timeout(self.query_timeout, driver.execute(session_id, sql)).await
    }

    pub async fn execute_bound(
        &self,
        session_id: SessionId,
        query: &BoundQuery,
    ) -> EngineResult<QueryResult> {
        let driver = self.get_driver(session_id).await?;
        with_timeout(self.query_timeout, driver.execute_bound(session_id, query)).await
    }

    pub async fn list_databases(&self, session_id: SessionId) -> EngineResult<Vec<String>> {
        let driver = self.get_driver(session_id).await?;
        with_timeout(self.query_timeout, driver.list_databases(session_id)).await
    }

    pub async fn list_schemas(&self, session_id: SessionId) -> EngineResult<Vec<String>> {
        let driver = self.get_driver(session_id).await?;
        with_timeout(self.query_timeout, driver.list_schemas(session_id)).await
    }

    pub async fn list_tables(
        &self,
        session_id: SessionId,
        schema: &str,
    ) -> EngineResult<Vec<TableInfo>> {
        let driver = self.get_driver(session_id).await?;
        with_timeout(self.query_timeout, driver.list_tables(session_id, schema)).await
    }

    pub async fn list_columns(
        &self,
        session_id: SessionId,
        table: &TableRef,
    ) -> EngineResult<Vec<Column>> {
        let driver = self.get_driver(session_id).await?;
        with_timeout(self.query_timeout, driver.list_columns(session_id, table)).await
    }
}

async fn with_timeout<T, F>(limit: Duration, future: F) -> EngineResult<T>
where
    F: Future<Output = EngineResult<T>>,
{
    match timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => {
            let timeout_ms = limit.as_millis() as u64;
            warn!(timeout_ms, "Operation timed out");
            metrics::record_timeout();
            Err(EngineError::Timeout { timeout_ms })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::testing::MockDriver;
    use crate::observability::Sensitive;

    fn create_manager(driver: MockDriver) -> SessionManager {
        let mut registry = DriverRegistry::new();
        registry.register(Arc::new(driver));
        SessionManager::new(
            Arc::new(registry),
            Duration::from_millis(1000),
            Duration::from_millis(200),
        )
    }

    fn create_config() -> ConnectionConfig {
        ConnectionConfig {
            driver: "mock".to_string(),
            host: "localhost".to_string(),
            port: 5432,
            username: "user".to_string(),
            password: Sensitive::new("password".to_string()),
            database: Some("test_db".to_string()),
            ssl: false,
        }
    }

    #[tokio::test]
    async fn test_connect_and_disconnect() {
        let manager = create_manager(MockDriver::new("mock"));

        let session_id = manager.connect(&create_config()).await.expect("connect failed");
        assert!(manager.session_exists(session_id).await);

        let sessions = manager.list_sessions().await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].1, "user@localhost:5432/test_db");

        manager.disconnect(session_id).await.expect("disconnect failed");
        assert!(!manager.session_exists(session_id).await);
        assert!(matches!(
            manager.disconnect(session_id).await,
            Err(EngineError::SessionNotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_ensure_connected_reuses_session() {
        let manager = create_manager(MockDriver::new("mock"));
        let config = create_config();

        let first = manager.ensure_connected("conn-1", &config).await.unwrap();
        let second = manager.ensure_connected("conn-1", &config).await.unwrap();
        assert_eq!(first, second);

        manager.disconnect_connection("conn-1").await.unwrap();
        let third = manager.ensure_connected("conn-1", &config).await.unwrap();
        assert_ne!(first, third);
    }

    #[tokio::test]
    async fn test_connect_invalid_driver() {
        let manager = create_manager(MockDriver::new("mock"));
        let mut config = create_config();
        config.driver = "nonexistent".to_string();

        assert!(matches!(
            manager.connect(&config).await,
            Err(EngineError::DriverNotFound { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_timeout() {
        let driver = MockDriver::new("mock");
        driver.push_delay(Duration::from_secs(5));
        let manager = create_manager(driver);

        let session_id = manager.connect(&create_config()).await.unwrap();
        let result = manager.execute(session_id, "SELECT 1").await;
        assert_eq!(result, Err(EngineError::Timeout { timeout_ms: 200 }));
    }
}
