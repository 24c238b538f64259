// SPDX-License-Identifier: Apache-2.0

//! In-memory driver used by unit tests.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use vitalake_core::{EngineError, EngineResult};
use vitalake_query::{BindValue, BoundQuery, TableRef};

use crate::engine::traits::DataEngine;
use crate::engine::types::{
    CellValue, Column, ConnectionConfig, QueryResult, Row, SessionId, TableInfo, TableKind,
};

/// Serves a fixed table. Page statements are answered by slicing the rows
/// with the bound LIMIT/OFFSET; count statements return `count_override`
/// or the row total. Per-call delays and failures can be queued.
pub struct MockDriver {
    id: &'static str,
    columns: Vec<Column>,
    rows: Vec<Row>,
    count_override: Mutex<Option<u64>>,
    delays: Mutex<VecDeque<Duration>>,
    failures: Mutex<VecDeque<EngineError>>,
    canned: Mutex<VecDeque<QueryResult>>,
    executed: Mutex<Vec<BoundQuery>>,
}

impl MockDriver {
    pub fn new(id: &'static str) -> Self {
        Self::with_table(id, Vec::new(), Vec::new())
    }

    pub fn with_table(id: &'static str, columns: Vec<Column>, rows: Vec<Row>) -> Self {
        Self {
            id,
            columns,
            rows,
            count_override: Mutex::new(None),
            delays: Mutex::new(VecDeque::new()),
            failures: Mutex::new(VecDeque::new()),
            canned: Mutex::new(VecDeque::new()),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn set_count(&self, count: Option<u64>) {
        *self.count_override.lock() = count;
    }

    /// Delay applied to the next statement, in call order
    pub fn push_delay(&self, delay: Duration) {
        self.delays.lock().push_back(delay);
    }

    /// Error returned by the next statement, in call order
    pub fn push_failure(&self, error: EngineError) {
        self.failures.lock().push_back(error);
    }

    /// Result returned verbatim by the next successful statement
    pub fn push_result(&self, result: QueryResult) {
        self.canned.lock().push_back(result);
    }

    pub fn executed(&self) -> Vec<BoundQuery> {
        self.executed.lock().clone()
    }

    fn answer(&self, query: &BoundQuery) -> QueryResult {
        if let Some(result) = self.canned.lock().pop_front() {
            return result;
        }
        if query.sql.starts_with("SELECT COUNT(*) AS total") {
            let total = self.count_override.lock().unwrap_or(self.rows.len() as u64);
            return QueryResult::new(
                vec![Column::new("total", vitalake_core::DeclaredType::Integer)],
                vec![Row::new().with("total", CellValue::Number(total as f64))],
            )
            .unwrap_or_else(|_| QueryResult::empty());
        }

        let ints: Vec<i64> = query
            .params
            .iter()
            .filter_map(|p| match p {
                BindValue::Int(i) => Some(*i),
                BindValue::Text(_) => None,
            })
            .collect();
        let (limit, offset) = match ints.as_slice() {
            [.., limit, offset] => (*limit as usize, *offset as usize),
            _ => (self.rows.len(), 0),
        };
        let rows = self.rows.iter().skip(offset).take(limit).cloned().collect();
        QueryResult::new(self.columns.clone(), rows).unwrap_or_else(|_| QueryResult::empty())
    }
}

#[async_trait]
impl DataEngine for MockDriver {
    fn driver_id(&self) -> &'static str {
        self.id
    }

    fn driver_name(&self) -> &'static str {
        "Mock Driver"
    }

    async fn test_connection(&self, _config: &ConnectionConfig) -> EngineResult<()> {
        Ok(())
    }

    async fn connect(&self, _config: &ConnectionConfig) -> EngineResult<SessionId> {
        Ok(SessionId::new())
    }

    async fn disconnect(&self, _session: SessionId) -> EngineResult<()> {
        Ok(())
    }

    async fn list_databases(&self, _session: SessionId) -> EngineResult<Vec<String>> {
        Ok(vec!["mock".to_string()])
    }

    async fn list_schemas(&self, _session: SessionId) -> EngineResult<Vec<String>> {
        Ok(vec!["public".to_string()])
    }

    async fn list_tables(&self, _session: SessionId, schema: &str) -> EngineResult<Vec<TableInfo>> {
        Ok(vec![TableInfo {
            schema: schema.to_string(),
            name: "items".to_string(),
            kind: TableKind::Table,
        }])
    }

    async fn list_columns(
        &self,
        _session: SessionId,
        _table: &TableRef,
    ) -> EngineResult<Vec<Column>> {
        Ok(self.columns.clone())
    }

    async fn execute(&self, session: SessionId, sql: &str) -> EngineResult<QueryResult> {
        self.execute_bound(session, &BoundQuery::raw(sql)).await
    }

    async fn execute_bound(
        &self,
        _session: SessionId,
        query: &BoundQuery,
    ) -> EngineResult<QueryResult> {
        self.executed.lock().push(query.clone());
        let delay = self.delays.lock().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let failure = self.failures.lock().pop_front();
        if let Some(error) = failure {
            return Err(error);
        }
        Ok(self.answer(query))
    }
}
