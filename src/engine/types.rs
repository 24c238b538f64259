// SPDX-License-Identifier: Apache-2.0

//! Engine-level types: sessions, connection settings and catalog entries.
//!
//! Result-set types (`QueryResult`, `Row`, `CellValue`) live in
//! `vitalake_core` and are re-exported here.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use vitalake_core::{CellValue, Column, DeclaredType, QueryResult, Row};

use crate::observability::Sensitive;

/// Unique identifier for a database session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Database connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub driver: String,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Sensitive<String>,
    pub database: Option<String>,
    pub ssl: bool,
}

impl ConnectionConfig {
    /// `user@host:port/db`, safe to log
    pub fn display_name(&self) -> String {
        format!(
            "{}@{}:{}/{}",
            self.username,
            self.host,
            self.port,
            self.database.as_deref().unwrap_or("default")
        )
    }
}

/// Kind of relation in a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    Table,
    View,
    MaterializedView,
}

impl TableKind {
    /// Maps an `information_schema.tables.table_type` value
    pub fn from_table_type(table_type: &str) -> Self {
        match table_type {
            "VIEW" => TableKind::View,
            "MATERIALIZED VIEW" => TableKind::MaterializedView,
            _ => TableKind::Table,
        }
    }
}

/// A table or view in a schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub schema: String,
    pub name: String,
    pub kind: TableKind,
}

/// Driver metadata exposed to callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverInfo {
    pub id: String,
    pub name: String,
    pub supported: bool,
}
