//! The seam between the chat core and whatever database holds the messages.

pub mod memory;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::common::{Message, StoreEvent};
use crate::config::{AppConfig, Backend};
use crate::network::FirebaseStore;
use crate::storage::SqliteStore;

pub use memory::MemoryStore;

/// Errors raised by store backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database responded {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Malformed payload: {0}")]
    Payload(#[from] serde_json::Error),

    #[error("Subscription cancelled by server: {0}")]
    Cancelled(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid store configuration: {0}")]
    Config(String),
}

/// An ordered, append-only remote collection with change notification.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Appends `message` at the end of the collection and returns the key the
    /// store assigned to it.
    async fn append(&self, message: &Message) -> Result<String, StoreError>;

    /// Starts listening. The current contents are sent to `sink` right away as
    /// a [`StoreEvent::Snapshot`], then again in full after every change.
    /// Failures arrive as [`StoreEvent::SubscriptionError`].
    ///
    /// Listening stops when the returned handle is dropped or the sink closes.
    fn subscribe(&self, sink: mpsc::Sender<StoreEvent>) -> Subscription;
}

/// Handle on a live listener. Dropping it releases the listener.
#[derive(Debug)]
pub struct Subscription {
    name: String,
    task: JoinHandle<()>,
}

impl Subscription {
    pub fn spawn<F>(name: impl Into<String>, listener: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        log::info!("Subscribed to {name}");
        Self {
            name,
            task: tokio::spawn(listener),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.task.abort();
        log::info!("Unsubscribed from {}", self.name);
    }
}

/// Builds the backend selected by `config`.
pub fn open(config: &AppConfig) -> Result<Arc<dyn RemoteStore>, StoreError> {
    match config.backend {
        Backend::Firebase => {
            let url = config.database_url.as_deref().ok_or_else(|| {
                StoreError::Config(
                    "firebase backend needs a database URL (FIREBASE_DATABASE_URL or --database-url)"
                        .to_string(),
                )
            })?;
            let store = FirebaseStore::new(
                url,
                &config.collection,
                config.reconnect_delay(),
                config.request_timeout(),
            )?;
            log::info!("Realtime collection at {}", store.collection_url());
            Ok(Arc::new(store))
        }
        Backend::Sqlite => {
            let store =
                SqliteStore::open(&config.sqlite_path, &config.collection, config.poll_interval())?;
            log::info!(
                "SQLite log {} holds {} messages",
                config.sqlite_path,
                store.count()?
            );
            Ok(Arc::new(store))
        }
        Backend::Memory => Ok(Arc::new(MemoryStore::new(&config.collection))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn dropping_subscription_stops_listener() {
        let (tx, mut rx) = mpsc::channel::<StoreEvent>(4);
        let subscription = Subscription::spawn("ticker", async move {
            loop {
                if tx.send(StoreEvent::Snapshot(Vec::new())).await.is_err() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        });

        assert!(rx.recv().await.is_some());
        assert_eq!(subscription.name(), "ticker");
        subscription.cancel();

        // Once the task is aborted its sender is dropped and the channel drains.
        let drained = tokio::time::timeout(Duration::from_secs(1), async {
            while rx.recv().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok());
    }

    #[test]
    fn firebase_backend_requires_url() {
        let config = AppConfig {
            backend: Backend::Firebase,
            database_url: None,
            ..AppConfig::default()
        };
        assert!(matches!(open(&config), Err(StoreError::Config(_))));
    }

    #[tokio::test]
    async fn memory_backend_opens() {
        let config = AppConfig {
            backend: Backend::Memory,
            ..AppConfig::default()
        };
        let store = open(&config).unwrap();
        let message = Message::compose("hi", "09:00").unwrap();
        assert!(store.append(&message).await.is_ok());
    }
}
