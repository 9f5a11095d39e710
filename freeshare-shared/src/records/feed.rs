use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Insert,
    Update,
}

/// A committed write to one row, carrying the row as it now reads.
#[derive(Debug, Clone, Serialize)]
pub struct RowChange {
    pub table: &'static str,
    pub id: Uuid,
    pub kind: ChangeKind,
    pub record: serde_json::Value,
    pub at: DateTime<Utc>,
}

/// In-process fan-out of row writes. Cheap to clone.
///
/// Receivers that fall behind by more than the channel capacity skip the
/// oldest changes and are told how many they missed.
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<Arc<RowChange>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Returns the number of subscribers that will see the change.
    pub fn publish(&self, change: RowChange) -> usize {
        tracing::trace!(table = change.table, id = %change.id, kind = ?change.kind, "row change");
        // send only fails when nobody is listening
        self.tx.send(Arc::new(change)).unwrap_or(0)
    }

    pub fn subscribe_row(&self, table: &'static str, id: Uuid) -> RowSubscription {
        RowSubscription {
            rx: self.tx.subscribe(),
            table,
            id,
        }
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub enum RowEvent {
    Changed(Arc<RowChange>),
    Lagged(u64),
}

/// Changes to a single row, in commit order.
pub struct RowSubscription {
    rx: broadcast::Receiver<Arc<RowChange>>,
    table: &'static str,
    id: Uuid,
}

impl RowSubscription {
    pub fn table(&self) -> &'static str {
        self.table
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Next change for this row; `None` once the feed is gone.
    pub async fn next(&mut self) -> Option<RowEvent> {
        loop {
            match self.rx.recv().await {
                Ok(change) if change.table == self.table && change.id == self.id => {
                    return Some(RowEvent::Changed(change));
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => return Some(RowEvent::Lagged(n)),
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(table: &'static str, id: Uuid, title: &str) -> RowChange {
        RowChange {
            table,
            id,
            kind: ChangeKind::Update,
            record: serde_json::json!({ "id": id, "title": title }),
            at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn subscription_only_sees_its_row() {
        let feed = ChangeFeed::new();
        let id = Uuid::new_v4();
        let mut sub = feed.subscribe_row("items", id);

        feed.publish(change("items", Uuid::new_v4(), "other item"));
        feed.publish(change("profiles", id, "same id, other table"));
        feed.publish(change("items", id, "mine"));

        match sub.next().await {
            Some(RowEvent::Changed(c)) => assert_eq!(c.record["title"], "mine"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_fine() {
        let feed = ChangeFeed::new();
        assert_eq!(feed.publish(change("items", Uuid::new_v4(), "x")), 0);
    }

    #[tokio::test]
    async fn lagging_subscriber_is_told() {
        let feed = ChangeFeed::with_capacity(2);
        let id = Uuid::new_v4();
        let mut sub = feed.subscribe_row("items", id);

        for i in 0..5 {
            feed.publish(change("items", id, &format!("v{i}")));
        }

        assert!(matches!(sub.next().await, Some(RowEvent::Lagged(3))));
        match sub.next().await {
            Some(RowEvent::Changed(c)) => assert_eq!(c.record["title"], "v3"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn closed_feed_ends_subscription() {
        let feed = ChangeFeed::new();
        let mut sub = feed.subscribe_row("items", Uuid::new_v4());
        drop(feed);
        assert!(sub.next().await.is_none());
    }
}
