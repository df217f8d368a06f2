use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;

use crate::common::{Message, StoreEvent};
use crate::store::{RemoteStore, StoreError, Subscription};

use super::database::Database;
use super::ensure_parent_dir;

/// Append-only message log in a local SQLite file, usable in place of the
/// cloud database.
///
/// SQLite has no change feed, so listeners wake on local appends and poll the
/// file to notice writes from other processes. Every query runs on the
/// blocking pool since a locked file can stall a write for seconds.
pub struct SqliteStore {
    db: Arc<Mutex<Database>>,
    collection: String,
    changes: watch::Sender<u64>,
    poll_interval: Duration,
}

impl SqliteStore {
    /// Open (or create) the log at `path`
    pub fn open<P: AsRef<Path>>(
        path: P,
        collection: &str,
        poll_interval: Duration,
    ) -> Result<Self, StoreError> {
        ensure_parent_dir(&path).map_err(|err| {
            StoreError::Config(format!(
                "cannot create directory for {}: {err}",
                path.as_ref().display()
            ))
        })?;
        Ok(Self::with_database(
            Database::open(path)?,
            collection,
            poll_interval,
        ))
    }

    fn with_database(db: Database, collection: &str, poll_interval: Duration) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            db: Arc::new(Mutex::new(db)),
            collection: collection.to_string(),
            changes,
            poll_interval,
        }
    }

    /// Number of messages in the collection. Blocks; meant for startup.
    pub fn count(&self) -> Result<usize, StoreError> {
        Ok(lock(&self.db)?.message_count(&self.collection)?)
    }
}

#[cfg(test)]
impl SqliteStore {
    pub fn in_memory(collection: &str, poll_interval: Duration) -> Result<Self, StoreError> {
        Ok(Self::with_database(
            Database::in_memory()?,
            collection,
            poll_interval,
        ))
    }

    pub async fn snapshot(&self) -> Result<Vec<Message>, StoreError> {
        load_snapshot(Arc::clone(&self.db), self.collection.clone()).await
    }
}

fn lock(db: &Mutex<Database>) -> Result<MutexGuard<'_, Database>, StoreError> {
    db.lock()
        .map_err(|_| StoreError::Unavailable("database lock poisoned".to_string()))
}

/// Runs `task` against the database on the blocking pool.
async fn with_db<T, F>(db: Arc<Mutex<Database>>, task: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    F: FnOnce(&Database) -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || task(&*lock(&db)?))
        .await
        .map_err(|err| StoreError::Unavailable(format!("SQLite task failed: {err}")))?
}

async fn load_snapshot(
    db: Arc<Mutex<Database>>,
    collection: String,
) -> Result<Vec<Message>, StoreError> {
    with_db(db, move |db| Ok(db.messages(&collection)?)).await
}

#[async_trait]
impl RemoteStore for SqliteStore {
    async fn append(&self, message: &Message) -> Result<String, StoreError> {
        let key = Uuid::new_v4().to_string();
        {
            let key = key.clone();
            let collection = self.collection.clone();
            let message = message.clone();
            with_db(Arc::clone(&self.db), move |db| {
                Ok(db.insert_message(&collection, &key, &message)?)
            })
            .await?;
        }

        self.changes.send_modify(|version| *version += 1);
        Ok(key)
    }

    fn subscribe(&self, sink: mpsc::Sender<StoreEvent>) -> Subscription {
        let db = Arc::clone(&self.db);
        let collection = self.collection.clone();
        let poll_interval = self.poll_interval;
        let mut changes = self.changes.subscribe();

        Subscription::spawn(format!("sqlite:{collection}"), async move {
            let mut last_sent: Option<Vec<Message>> = None;
            let mut last_error: Option<String> = None;

            loop {
                let event = match load_snapshot(Arc::clone(&db), collection.clone()).await {
                    Ok(snapshot) if last_sent.as_ref() != Some(&snapshot) => {
                        last_error = None;
                        last_sent = Some(snapshot.clone());
                        Some(StoreEvent::Snapshot(snapshot))
                    }
                    Ok(_) => None,
                    Err(err) => {
                        let reason = err.to_string();
                        if last_error.as_ref() == Some(&reason) {
                            None
                        } else {
                            log::warn!("Reading {collection} failed: {reason}");
                            last_error = Some(reason.clone());
                            Some(StoreEvent::SubscriptionError(reason))
                        }
                    }
                };

                if let Some(event) = event {
                    if sink.send(event).await.is_err() {
                        break;
                    }
                }

                tokio::select! {
                    changed = changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = tokio::time::sleep(poll_interval) => {}
                }
            }
        })
    }
}
