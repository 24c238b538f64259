// SPDX-License-Identifier: Apache-2.0

//! Placeholder drivers for engines VitaLake lists but cannot query yet.

use async_trait::async_trait;
use vitalake_core::{EngineError, EngineResult};
use vitalake_query::{BoundQuery, TableRef};

use crate::engine::traits::DataEngine;
use crate::engine::types::{Column, ConnectionConfig, QueryResult, SessionId, TableInfo};

pub struct UnsupportedDriver {
    id: &'static str,
    name: &'static str,
}

impl UnsupportedDriver {
    pub fn mysql() -> Self {
        Self { id: "mysql", name: "MySQL" }
    }

    pub fn sqlite() -> Self {
        Self { id: "sqlite", name: "SQLite" }
    }

    pub fn mongodb() -> Self {
        Self { id: "mongodb", name: "MongoDB" }
    }

    fn unsupported<T>(&self) -> EngineResult<T> {
        Err(EngineError::not_supported(format!(
            "{} connections are not supported yet",
            self.name
        )))
    }
}

#[async_trait]
impl DataEngine for UnsupportedDriver {
    fn driver_id(&self) -> &'static str {
        self.id
    }

    fn driver_name(&self) -> &'static str {
        self.name
    }

    fn is_supported(&self) -> bool {
        false
    }

    async fn test_connection(&self, _config: &ConnectionConfig) -> EngineResult<()> {
        self.unsupported()
    }

    async fn connect(&self, _config: &ConnectionConfig) -> EngineResult<SessionId> {
        self.unsupported()
    }

    async fn disconnect(&self, _session: SessionId) -> EngineResult<()> {
        self.unsupported()
    }

    async fn list_databases(&self, _session: SessionId) -> EngineResult<Vec<String>> {
        self.unsupported()
    }

    async fn list_schemas(&self, _session: SessionId) -> EngineResult<Vec<String>> {
        self.unsupported()
    }

    async fn list_tables(&self, _session: SessionId, _schema: &str) -> EngineResult<Vec<TableInfo>> {
        self.unsupported()
    }

    async fn list_columns(&self, _session: SessionId, _table: &TableRef) -> EngineResult<Vec<Column>> {
        self.unsupported()
    }

    async fn execute(&self, _session: SessionId, _sql: &str) -> EngineResult<QueryResult> {
        self.unsupported()
    }

    async fn execute_bound(
        &self,
        _session: SessionId,
        _query: &BoundQuery,
    ) -> EngineResult<QueryResult> {
        self.unsupported()
    }
}
