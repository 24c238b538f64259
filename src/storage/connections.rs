// SPDX-License-Identifier: Apache-2.0

//! Connection profiles
//!
//! Profiles live in a single `connections.json` file. The password is kept
//! in the file but never leaves this module except as part of the
//! `ConnectionConfig` handed to the session manager.

use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use vitalake_core::{EngineError, EngineResult};

use crate::engine::types::ConnectionConfig;
use crate::observability::Sensitive;

/// Placeholder a client sends back when the password was not edited
pub const PASSWORD_MASK: &str = "\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}\u{2022}";

const DEFAULT_DRIVER: &str = "postgres";
const DEFAULT_PORT: u16 = 5432;

/// A profile as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredConnection {
    id: String,
    name: String,
    #[serde(alias = "type")]
    driver: String,
    host: String,
    port: u16,
    database: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    ssl: bool,
    created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
}

/// A profile as listed to clients: everything but the password
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSummary {
    pub id: String,
    pub name: String,
    pub driver: String,
    pub host: String,
    pub port: u16,
    pub database: String,
    pub username: String,
    pub has_password: bool,
    pub ssl: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&StoredConnection> for ConnectionSummary {
    fn from(stored: &StoredConnection) -> Self {
        Self {
            id: stored.id.clone(),
            name: stored.name.clone(),
            driver: stored.driver.clone(),
            host: stored.host.clone(),
            port: stored.port,
            database: stored.database.clone(),
            username: stored.username.clone(),
            has_password: !stored.password.is_empty(),
            ssl: stored.ssl,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        }
    }
}

/// Create/update payload for a profile
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInput {
    pub name: String,
    #[serde(default, alias = "type")]
    pub driver: Option<String>,
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    pub database: String,
    #[serde(default)]
    pub username: String,
    /// `None` or the mask keeps the stored password on update
    #[serde(default)]
    pub password: Option<Sensitive<String>>,
    #[serde(default)]
    pub ssl: bool,
}

impl ConnectionInput {
    fn validate(&self) -> EngineResult<()> {
        if self.name.trim().is_empty()
            || self.host.trim().is_empty()
            || self.database.trim().is_empty()
        {
            return Err(EngineError::validation(
                "Missing required fields: name, host, database",
            ));
        }
        Ok(())
    }

    /// Settings for trying the input out before it is saved
    pub fn to_config(&self) -> EngineResult<ConnectionConfig> {
        self.validate()?;
        Ok(ConnectionConfig {
            driver: driver_id(self.driver.as_deref().unwrap_or(DEFAULT_DRIVER)).to_string(),
            host: self.host.clone(),
            port: self.port.unwrap_or(DEFAULT_PORT),
            username: self.username.clone(),
            password: Sensitive::new(self.new_password().unwrap_or_default().to_string()),
            database: Some(self.database.clone()),
            ssl: self.ssl,
        })
    }

    fn new_password(&self) -> Option<&str> {
        self.password
            .as_ref()
            .map(|p| p.expose().as_str())
            .filter(|p| !p.is_empty() && *p != PASSWORD_MASK)
    }
}

/// Profiles written by older clients name the driver "postgresql"
fn driver_id(name: &str) -> &str {
    match name {
        "postgresql" | "pg" => DEFAULT_DRIVER,
        other => other,
    }
}

pub struct ConnectionStore {
    path: PathBuf,
    cache: RwLock<Option<Vec<StoredConnection>>>,
}

impl ConnectionStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            cache: RwLock::new(None),
        }
    }

    fn load(&self) -> Vec<StoredConnection> {
        if let Some(cached) = self.cache.read().as_ref() {
            return cached.clone();
        }

        let connections = match fs::read_to_string(&self.path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                warn!(path = %self.path.display(), error = %e, "Failed to parse connections file");
                Vec::new()
            }),
            Err(_) => Vec::new(),
        };
        *self.cache.write() = Some(connections.clone());
        connections
    }

    fn persist(&self, connections: Vec<StoredConnection>) -> EngineResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::internal(format!("Failed to create storage directory: {}", e))
            })?;
        }
        let content = serde_json::to_string_pretty(&connections)
            .map_err(|e| EngineError::internal(format!("Failed to serialize connections: {}", e)))?;
        fs::write(&self.path, content)
            .map_err(|e| EngineError::internal(format!("Failed to save connections: {}", e)))?;

        *self.cache.write() = Some(connections);
        Ok(())
    }

    pub fn list(&self) -> Vec<ConnectionSummary> {
        self.load().iter().map(ConnectionSummary::from).collect()
    }

    pub fn get(&self, id: &str) -> EngineResult<ConnectionSummary> {
        self.load()
            .iter()
            .find(|c| c.id == id)
            .map(ConnectionSummary::from)
            .ok_or_else(|| EngineError::connection_not_found(id))
    }

    /// Settings needed to open a session for profile `id`
    pub fn config(&self, id: &str) -> EngineResult<ConnectionConfig> {
        let connections = self.load();
        let stored = connections
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| EngineError::connection_not_found(id))?;

        Ok(ConnectionConfig {
            driver: driver_id(&stored.driver).to_string(),
            host: stored.host.clone(),
            port: stored.port,
            username: stored.username.clone(),
            password: Sensitive::new(stored.password.clone()),
            database: Some(stored.database.clone()),
            ssl: stored.ssl,
        })
    }

    /// Adds a profile. Names must be unique.
    pub fn create(&self, input: ConnectionInput) -> EngineResult<ConnectionSummary> {
        input.validate()?;
        let mut connections = self.load();
        if connections.iter().any(|c| c.name == input.name) {
            return Err(EngineError::validation(
                "A connection with this name already exists",
            ));
        }

        let stored = StoredConnection {
            id: Uuid::new_v4().to_string(),
            name: input.name.clone(),
            driver: input.driver.clone().unwrap_or_else(|| DEFAULT_DRIVER.to_string()),
            host: input.host.clone(),
            port: input.port.unwrap_or(DEFAULT_PORT),
            database: input.database.clone(),
            username: input.username.clone(),
            password: input.new_password().unwrap_or_default().to_string(),
            ssl: input.ssl,
            created_at: Utc::now(),
            updated_at: None,
        };
        let summary = ConnectionSummary::from(&stored);
        connections.push(stored);
        self.persist(connections)?;

        info!(connection_id = %summary.id, "Connection profile created");
        Ok(summary)
    }

    /// Replaces profile `id`. The stored password is kept unless a new one
    /// is supplied.
    pub fn update(&self, id: &str, input: ConnectionInput) -> EngineResult<ConnectionSummary> {
        input.validate()?;
        let mut connections = self.load();
        if connections.iter().any(|c| c.name == input.name && c.id != id) {
            return Err(EngineError::validation(
                "A connection with this name already exists",
            ));
        }
        let stored = connections
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| EngineError::connection_not_found(id))?;

        stored.name = input.name.clone();
        stored.driver = input.driver.clone().unwrap_or_else(|| DEFAULT_DRIVER.to_string());
        stored.host = input.host.clone();
        stored.port = input.port.unwrap_or(DEFAULT_PORT);
        stored.database = input.database.clone();
        stored.username = input.username.clone();
        if let Some(password) = input.new_password() {
            stored.password = password.to_string();
        }
        stored.ssl = input.ssl;
        stored.updated_at = Some(Utc::now());

        let summary = ConnectionSummary::from(&*stored);
        self.persist(connections)?;
        Ok(summary)
    }

    pub fn delete(&self, id: &str) -> EngineResult<()> {
        let mut connections = self.load();
        let before = connections.len();
        connections.retain(|c| c.id != id);
        if connections.len() == before {
            return Err(EngineError::connection_not_found(id));
        }
        self.persist(connections)?;
        info!(connection_id = %id, "Connection profile deleted");
        Ok(())
    }
}
