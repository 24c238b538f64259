// SPDX-License-Identifier: Apache-2.0

//! VitaLake - PostgreSQL explorer
//!
//! Application library: drivers and sessions, the table view (filters,
//! pagination and row count), grid rendering, charts and local storage.
//! A UI shell calls the async functions in `commands`.

pub mod chart;
pub mod commands;
pub mod config;
pub mod coordinator;
pub mod debounce;
pub mod engine;
pub mod export;
pub mod grid;
pub mod hints;
pub mod metrics;
pub mod observability;
pub mod storage;
pub mod table_session;

use std::sync::Arc;

use tracing::info;
use vitalake_core::{EngineError, EngineResult};

use config::AppConfig;
use engine::drivers::postgres::PostgresDriver;
use engine::drivers::unsupported::UnsupportedDriver;
use engine::{ConnectionConfig, DriverRegistry, SessionId, SessionManager};
use storage::{ConnectionStore, PreferencesStore};

/// Session key used for the environment fallback connection
const FALLBACK_CONNECTION_KEY: &str = "__env__";

pub struct AppState {
    pub config: AppConfig,
    pub registry: Arc<DriverRegistry>,
    pub session_manager: Arc<SessionManager>,
    pub connections: ConnectionStore,
    pub preferences: PreferencesStore,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let mut registry = DriverRegistry::new();
        registry.register(Arc::new(PostgresDriver::new()));
        registry.register(Arc::new(UnsupportedDriver::mysql()));
        registry.register(Arc::new(UnsupportedDriver::sqlite()));
        registry.register(Arc::new(UnsupportedDriver::mongodb()));

        Self::with_registry(config, registry)
    }

    /// Builds the state around a caller-provided driver set
    pub fn with_registry(config: AppConfig, registry: DriverRegistry) -> Self {
        let registry = Arc::new(registry);
        let session_manager = Arc::new(SessionManager::new(
            Arc::clone(&registry),
            config.connect_timeout,
            config.query_timeout,
        ));
        let connections = ConnectionStore::new(config.connections_path());
        let preferences = PreferencesStore::file(config.preferences_path());

        Self {
            config,
            registry,
            session_manager,
            connections,
            preferences,
        }
    }

    pub fn from_env() -> Self {
        Self::new(AppConfig::from_env())
    }

    /// Connection settings for a saved profile, or the environment fallback
    /// when no id is given.
    pub fn connection_config(&self, connection_id: Option<&str>) -> EngineResult<ConnectionConfig> {
        match connection_id.filter(|id| !id.is_empty()) {
            Some(id) => self.connections.config(id),
            None => self
                .config
                .fallback_connection
                .clone()
                .ok_or_else(|| EngineError::internal("Database connection not configured")),
        }
    }

    /// Session for a saved profile (or the fallback), opened on first use and
    /// reused afterwards.
    pub async fn session_for(&self, connection_id: Option<&str>) -> EngineResult<SessionId> {
        let config = self.connection_config(connection_id)?;
        let key = connection_id
            .filter(|id| !id.is_empty())
            .unwrap_or(FALLBACK_CONNECTION_KEY);
        self.session_manager.ensure_connected(key, &config).await
    }
}

/// Installs logging and builds the state from the environment.
pub fn init() -> AppState {
    let config = AppConfig::from_env();
    observability::init_tracing(&config.log_dir());
    info!(data_dir = %config.data_dir.display(), "VitaLake starting");
    AppState::new(config)
}
