use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};

use crate::common::{Message, StoreEvent};

use super::{RemoteStore, StoreError, Subscription};

/// In-process collection. Snapshots are published through a watch channel, so
/// bursts of appends may be coalesced into one notification.
pub struct MemoryStore {
    collection: String,
    log: watch::Sender<Vec<Message>>,
    next_key: AtomicU64,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new(collection: &str) -> Self {
        let (log, _) = watch::channel(Vec::new());
        Self {
            collection: collection.to_string(),
            log,
            next_key: AtomicU64::new(0),
            unavailable: AtomicBool::new(false),
        }
    }
}

#[cfg(test)]
impl MemoryStore {
    /// Makes subsequent appends fail, as a dropped connection would.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Vec<Message> {
        self.log.borrow().clone()
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn append(&self, message: &Message) -> Result<String, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!(
                "{} is offline",
                self.collection
            )));
        }

        let seq = self.next_key.fetch_add(1, Ordering::SeqCst);
        self.log.send_modify(|log| log.push(message.clone()));
        Ok(format!("{}-{seq:08}", self.collection))
    }

    fn subscribe(&self, sink: mpsc::Sender<StoreEvent>) -> Subscription {
        let mut changes = self.log.subscribe();
        Subscription::spawn(format!("memory:{}", self.collection), async move {
            loop {
                let snapshot = changes.borrow_and_update().clone();
                if sink.send(StoreEvent::Snapshot(snapshot)).await.is_err() {
                    break;
                }
                if changes.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}
