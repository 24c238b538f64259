// SPDX-License-Identifier: Apache-2.0

//! Table view actor
//!
//! Hosts a `TableViewCoordinator` on its own tokio task. User actions and
//! fetch completions arrive on one channel, so every state mutation is
//! serialized through the task. Fetches run concurrently as spawned tasks
//! and report back with the token they were issued under; the coordinator
//! drops whatever is stale. Each change is published on a `watch` channel.

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, instrument, warn};
use vitalake_core::{CellValue, EngineError, EngineResult, QueryResult};
use vitalake_query::{ColumnFilter, FilterSet, TableRef};

use crate::coordinator::{
    parse_count, Applied, FetchPlan, RequestToken, TableViewCoordinator, TableViewSnapshot,
    ViewAction,
};
use crate::engine::{SessionId, SessionManager};
use crate::metrics;

const COMMAND_BUFFER: usize = 64;

enum Command {
    Action {
        action: ViewAction,
        reply: oneshot::Sender<EngineResult<()>>,
    },
    DataDone {
        token: RequestToken,
        page: u64,
        page_size: u32,
        outcome: EngineResult<QueryResult>,
    },
    CountDone {
        token: RequestToken,
        outcome: EngineResult<u64>,
    },
}

/// Handle to a running table view. Dropping every handle stops the actor
/// once in-flight fetches have reported back.
pub struct TableSession {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<TableViewSnapshot>,
    task: JoinHandle<()>,
}

impl TableSession {
    /// Loads the table's columns, starts the actor and issues the initial
    /// page and count fetches.
    #[instrument(skip(manager), fields(table = %table))]
    pub async fn open(
        manager: Arc<SessionManager>,
        session_id: SessionId,
        table: TableRef,
        page_size: u32,
        max_page_size: u32,
    ) -> EngineResult<Self> {
        let columns = manager.list_columns(session_id, &table).await?;
        let coordinator = TableViewCoordinator::new(table, columns, page_size, max_page_size)?;

        let session = Self::spawn(coordinator, manager, session_id);
        session.dispatch(ViewAction::Load).await?;
        Ok(session)
    }

    fn spawn(
        coordinator: TableViewCoordinator,
        manager: Arc<SessionManager>,
        session_id: SessionId,
    ) -> Self {
        let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
        let (snapshot_tx, snapshots) = watch::channel(coordinator.snapshot());

        let actor = Actor {
            coordinator,
            manager,
            session_id,
            feedback: commands.downgrade(),
            snapshots: snapshot_tx,
        };
        let task = tokio::spawn(actor.run(receiver));

        Self {
            commands,
            snapshots,
            task,
        }
    }

    /// Applies an action. Validation failures come back here and leave the
    /// view unchanged; fetch failures show up in the snapshot instead.
    pub async fn dispatch(&self, action: ViewAction) -> EngineResult<()> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::Action { action, reply })
            .await
            .map_err(|_| EngineError::internal("Table view is closed"))?;
        response
            .await
            .map_err(|_| EngineError::internal("Table view stopped before replying"))?
    }

    pub async fn go_to_page(&self, page: u64) -> EngineResult<()> {
        self.dispatch(ViewAction::GoToPage { page }).await
    }

    pub async fn next_page(&self) -> EngineResult<()> {
        self.dispatch(ViewAction::NextPage).await
    }

    pub async fn previous_page(&self) -> EngineResult<()> {
        self.dispatch(ViewAction::PreviousPage).await
    }

    pub async fn set_page_size(&self, page_size: u32) -> EngineResult<()> {
        self.dispatch(ViewAction::SetPageSize { page_size }).await
    }

    pub async fn add_filter(&self, filter: ColumnFilter) -> EngineResult<()> {
        self.dispatch(ViewAction::AddFilter { filter }).await
    }

    pub async fn remove_filter(&self, column: impl Into<String>) -> EngineResult<()> {
        self.dispatch(ViewAction::RemoveFilter {
            column: column.into(),
        })
        .await
    }

    pub async fn set_filters(&self, filters: FilterSet) -> EngineResult<()> {
        self.dispatch(ViewAction::SetFilters { filters }).await
    }

    pub async fn clear_filters(&self) -> EngineResult<()> {
        self.dispatch(ViewAction::ClearFilters).await
    }

    /// Toggles the clicked cell's filter against the filters the view holds
    /// at the moment the action is applied.
    pub async fn toggle_cell(
        &self,
        column: impl Into<String>,
        value: CellValue,
    ) -> EngineResult<()> {
        self.dispatch(ViewAction::ToggleCell {
            column: column.into(),
            value,
        })
        .await
    }

    pub async fn refresh(&self) -> EngineResult<()> {
        self.dispatch(ViewAction::Refresh).await
    }

    pub fn snapshot(&self) -> TableViewSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TableViewSnapshot> {
        self.snapshots.clone()
    }

    /// Waits until no data or count fetch is outstanding
    pub async fn settled(&self) -> EngineResult<TableViewSnapshot> {
        let mut receiver = self.snapshots.clone();
        let snapshot = receiver
            .wait_for(|s| s.is_settled())
            .await
            .map_err(|_| EngineError::internal("Table view is closed"))?;
        Ok(snapshot.clone())
    }

    /// Stops the actor immediately; in-flight results are dropped.
    pub fn close(self) {
        self.task.abort();
    }
}

struct Actor {
    coordinator: TableViewCoordinator,
    manager: Arc<SessionManager>,
    session_id: SessionId,
    feedback: mpsc::WeakSender<Command>,
    snapshots: watch::Sender<TableViewSnapshot>,
}

impl Actor {
    async fn run(mut self, mut receiver: mpsc::Receiver<Command>) {
        while let Some(command) = receiver.recv().await {
            match command {
                Command::Action { action, reply } => {
                    let result = self.coordinator.apply_action(action).map(|plan| {
                        self.launch(plan);
                    });
                    if let Err(e) = &result {
                        debug!(error = %e, "Table view action rejected");
                    }
                    // the caller must observe its own action once the reply lands
                    self.publish();
                    let _ = reply.send(result);
                }
                Command::DataDone {
                    token,
                    page,
                    page_size,
                    outcome,
                } => {
                    if let Err(e) = &outcome {
                        warn!(token = token.value(), error = %e, "Page fetch failed");
                    }
                    let applied = self.coordinator.apply_data(token, page, page_size, outcome);
                    self.note_stale(applied, token, "data");
                    self.publish();
                }
                Command::CountDone { token, outcome } => {
                    if let Err(e) = &outcome {
                        warn!(token = token.value(), error = %e, "Count fetch failed");
                    }
                    let applied = self.coordinator.apply_count(token, outcome);
                    self.note_stale(applied, token, "count");
                    self.publish();
                }
            }
        }
        debug!("Table view actor stopped");
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.coordinator.snapshot());
    }

    fn note_stale(&self, applied: Applied, token: RequestToken, slot: &'static str) {
        if applied == Applied::Stale {
            debug!(token = token.value(), slot, "Discarded stale response");
            metrics::record_stale_response();
        }
    }

    fn launch(&self, plan: FetchPlan) {
        let Some(feedback) = self.feedback.upgrade() else {
            return;
        };

        if let Some(data) = plan.data {
            let manager = Arc::clone(&self.manager);
            let session_id = self.session_id;
            let feedback = feedback.clone();
            tokio::spawn(async move {
                let started = std::time::Instant::now();
                let outcome = manager.execute_bound(session_id, &data.query).await;
                metrics::record_query(started.elapsed().as_secs_f64() * 1000.0, outcome.is_ok());
                let _ = feedback
                    .send(Command::DataDone {
                        token: data.token,
                        page: data.page,
                        page_size: data.page_size,
                        outcome,
                    })
                    .await;
            });
        }

        if let Some(count) = plan.count {
            let manager = Arc::clone(&self.manager);
            let session_id = self.session_id;
            tokio::spawn(async move {
                metrics::record_count_query();
                let outcome = manager
                    .execute_bound(session_id, &count.query)
                    .await
                    .and_then(|result| parse_count(&result));
                let _ = feedback
                    .send(Command::CountDone {
                        token: count.token,
                        outcome,
                    })
                    .await;
            });
        }
    }
}
