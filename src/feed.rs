//! Change notification.
//!
//! Writers publish a [`ChangeEvent`] after a mutation succeeds. Readers never
//! patch local state from an event: they re-run their query and replace the
//! snapshot they hold ([`LiveQuery`]).

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::models::EntityKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Projects,
    Hackathons,
    ProjectMembers,
    HackathonMembers,
    HackathonProjects,
}

impl Table {
    pub fn entities(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Project => Table::Projects,
            EntityKind::Hackathon => Table::Hackathons,
        }
    }

    pub fn members(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Project => Table::ProjectMembers,
            EntityKind::Hackathon => Table::HackathonMembers,
        }
    }
}

/// `column = value` restriction on the rows an event concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFilter {
    pub column: &'static str,
    pub value: String,
}

impl RowFilter {
    pub fn eq(column: &'static str, value: impl Into<String>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub filter: Option<RowFilter>,
}

impl ChangeEvent {
    pub fn new(table: Table, filter: Option<RowFilter>) -> Self {
        Self { table, filter }
    }

    /// A change to one entity row (`id = entity_id`).
    pub fn entity(kind: EntityKind, entity_id: &str) -> Self {
        Self::new(Table::entities(kind), Some(RowFilter::eq("id", entity_id)))
    }

    /// A change to one entity's roster.
    pub fn roster(kind: EntityKind, entity_id: &str) -> Self {
        Self::new(
            Table::members(kind),
            Some(RowFilter::eq(kind.fk_column(), entity_id)),
        )
    }
}

#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, event: ChangeEvent) {
        tracing::debug!(table = ?event.table, filter = ?event.filter, "Change published");
        let _ = self.tx.send(event);
    }

    /// Subscribe to changes on `table`, optionally restricted to `filter`.
    pub fn subscribe(&self, table: Table, filter: Option<RowFilter>) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
            table,
            filter,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

pub struct Subscription {
    rx: broadcast::Receiver<ChangeEvent>,
    table: Table,
    filter: Option<RowFilter>,
}

impl Subscription {
    fn matches(&self, event: &ChangeEvent) -> bool {
        if event.table != self.table {
            return false;
        }
        match (&self.filter, &event.filter) {
            (None, _) => true,
            // An unfiltered event may touch any row
            (Some(_), None) => true,
            (Some(wanted), Some(got)) => wanted == got,
        }
    }

    /// Wait for the next matching event. Returns None once the feed is gone.
    ///
    /// A subscriber that fell behind gets a synthetic event for its own
    /// table and filter: it has to refetch either way.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if self.matches(&event) => return Some(event),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, table = ?self.table, "Change subscriber lagged");
                    return Some(ChangeEvent::new(self.table, self.filter.clone()));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// A query result kept fresh by refetching on every matching change.
///
/// The fetch returns `Ok(None)` once the query no longer applies (the row is
/// gone or the reader lost access). The refresh task then stops and
/// [`LiveQuery::changed`] yields `None`.
///
/// Dropping it aborts the refresh task, so a refetch that is still pending
/// never lands anywhere.
pub struct LiveQuery<T> {
    rx: watch::Receiver<Arc<T>>,
    task: JoinHandle<()>,
}

impl<T: Send + Sync + 'static> LiveQuery<T> {
    pub fn spawn<F>(initial: T, mut subscription: Subscription, fetch: F) -> Self
    where
        F: Fn() -> Result<Option<T>> + Send + 'static,
    {
        let (tx, rx) = watch::channel(Arc::new(initial));

        let task = tokio::spawn(async move {
            while subscription.recv().await.is_some() {
                match fetch() {
                    Ok(Some(fresh)) => {
                        if tx.send(Arc::new(fresh)).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        tracing::debug!("Live query closed");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Live refresh failed, keeping previous snapshot");
                    }
                }
            }
        });

        Self { rx, task }
    }

    pub fn snapshot(&self) -> Arc<T> {
        self.rx.borrow().clone()
    }

    /// Wait for the next replacement snapshot. `None` once the query closed.
    pub async fn changed(&mut self) -> Option<Arc<T>> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }
}

impl<T> Drop for LiveQuery<T> {
    fn drop(&mut self) {
        self.task.abort();
    }
}
