// SPDX-License-Identifier: Apache-2.0

//! DataEngine trait definition
//!
//! The abstraction every database driver implements. Sessions are opaque
//! ids handed out by `connect`; all catalog and query calls go through one.

use async_trait::async_trait;
use vitalake_query::{BoundQuery, TableRef};

use crate::engine::types::{Column, ConnectionConfig, QueryResult, SessionId, TableInfo};
use vitalake_core::EngineResult;

#[async_trait]
pub trait DataEngine: Send + Sync {
    /// Returns the unique identifier for this driver (e.g., "postgres")
    fn driver_id(&self) -> &'static str;

    /// Returns a human-readable name for this driver
    fn driver_name(&self) -> &'static str;

    /// Whether the driver can actually serve queries
    fn is_supported(&self) -> bool {
        true
    }

    /// Tests the connection without establishing a persistent session
    async fn test_connection(&self, config: &ConnectionConfig) -> EngineResult<()>;

    /// Establishes a connection and returns a session identifier
    async fn connect(&self, config: &ConnectionConfig) -> EngineResult<SessionId>;

    /// Closes a session and releases associated resources
    async fn disconnect(&self, session: SessionId) -> EngineResult<()>;

    async fn list_databases(&self, session: SessionId) -> EngineResult<Vec<String>>;

    async fn list_schemas(&self, session: SessionId) -> EngineResult<Vec<String>>;

    async fn list_tables(&self, session: SessionId, schema: &str) -> EngineResult<Vec<TableInfo>>;

    /// Columns of a table in ordinal order
    async fn list_columns(&self, session: SessionId, table: &TableRef) -> EngineResult<Vec<Column>>;

    /// Executes free-form SQL typed by the user
    async fn execute(&self, session: SessionId, sql: &str) -> EngineResult<QueryResult>;

    /// Executes a statement with positional parameters bound by the driver
    async fn execute_bound(&self, session: SessionId, query: &BoundQuery)
        -> EngineResult<QueryResult>;
}
