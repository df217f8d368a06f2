use std::cmp::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::common::{Message, StoreEvent};
use crate::store::{RemoteStore, StoreError, Subscription};

use super::sse::{SseDecoder, SseEvent};

/// Realtime database collection reached through its REST API.
pub struct FirebaseStore {
    http: reqwest::Client,
    collection: String,
    collection_url: String,
    reconnect_delay: Duration,
    request_timeout: Duration,
}

/// Body returned by a push (`POST`): the generated child key.
#[derive(Debug, Deserialize)]
struct PushResponse {
    name: String,
}

/// Payload of `put` / `patch` stream events.
#[derive(Debug, Deserialize)]
struct ChangeEvent {
    path: String,
    #[serde(default)]
    data: Value,
}

impl FirebaseStore {
    pub fn new(
        database_url: &str,
        collection: &str,
        reconnect_delay: Duration,
        request_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let collection_url = collection_url(database_url, collection)?;
        // No client-wide timeout: it would also cut the long-lived event stream.
        let http = reqwest::Client::builder()
            .connect_timeout(request_timeout)
            .build()?;

        Ok(Self {
            http,
            collection: collection.to_string(),
            collection_url,
            reconnect_delay,
            request_timeout,
        })
    }

    pub fn collection_url(&self) -> &str {
        &self.collection_url
    }
}

#[async_trait]
impl RemoteStore for FirebaseStore {
    async fn append(&self, message: &Message) -> Result<String, StoreError> {
        let response = self
            .http
            .post(&self.collection_url)
            .timeout(self.request_timeout)
            .json(message)
            .send()
            .await?;
        let pushed: PushResponse = check_status(response).await?.json().await?;
        Ok(pushed.name)
    }

    fn subscribe(&self, sink: mpsc::Sender<StoreEvent>) -> Subscription {
        let listener = Listener {
            http: self.http.clone(),
            url: self.collection_url.clone(),
            reconnect_delay: self.reconnect_delay,
            request_timeout: self.request_timeout,
            sink,
        };
        Subscription::spawn(format!("firebase:{}", self.collection), listener.run())
    }
}

/// Builds `{base}/{collection}.json`.
fn collection_url(database_url: &str, collection: &str) -> Result<String, StoreError> {
    let base = database_url.trim().trim_end_matches('/');
    if !(base.starts_with("https://") || base.starts_with("http://")) {
        return Err(StoreError::Config(format!(
            "database URL must be http(s), got `{database_url}`"
        )));
    }

    let collection = collection.trim_matches('/');
    if collection.is_empty() {
        return Err(StoreError::Config("collection name is empty".to_string()));
    }

    Ok(format!("{base}/{collection}.json"))
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status { status, body })
}

async fn fetch_snapshot(
    http: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<Vec<Message>, StoreError> {
    let response = http.get(url).timeout(timeout).send().await?;
    let value: Value = check_status(response).await?.json().await?;
    Ok(decode_snapshot(&value))
}

/// Turns the JSON value of the whole collection into an ordered message list.
///
/// Object children are ordered the way the database orders keys (see
/// [`compare_keys`]); push keys sort chronologically. Children that are not
/// message-shaped are skipped.
pub fn decode_snapshot(value: &Value) -> Vec<Message> {
    match value {
        Value::Null => Vec::new(),
        Value::Object(children) => {
            let mut children: Vec<_> = children.iter().collect();
            children.sort_by(|a, b| compare_keys(a.0, b.0));
            children
                .into_iter()
                .filter_map(|(key, child)| decode_child(key, child))
                .collect()
        }
        // Integer-like keys come back as a sparse array.
        Value::Array(children) => children
            .iter()
            .enumerate()
            .filter(|(_, child)| !child.is_null())
            .filter_map(|(index, child)| decode_child(&index.to_string(), child))
            .collect(),
        other => {
            log::debug!("Collection holds a scalar ({other}); treating as empty");
            Vec::new()
        }
    }
}

/// Database key order: keys that read as 32-bit integers come first in
/// numeric order, every other key follows in byte order.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    match (integer_key(a), integer_key(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// `0`, `42`, `-7`; not `007`, `1.5` or values outside `i32`.
fn integer_key(key: &str) -> Option<i32> {
    let digits = key.strip_prefix('-').unwrap_or(key);
    let canonical = digits == "0"
        || (!digits.is_empty()
            && !digits.starts_with('0')
            && digits.bytes().all(|byte| byte.is_ascii_digit()));
    if !canonical {
        return None;
    }
    key.parse().ok()
}

fn decode_child(key: &str, child: &Value) -> Option<Message> {
    match serde_json::from_value::<Message>(child.clone()) {
        Ok(message) => Some(message),
        Err(err) => {
            log::debug!("Skipping child {key}: {err}");
            None
        }
    }
}

/// Background half of a subscription: keeps an event stream open and turns it
/// into snapshots.
struct Listener {
    http: reqwest::Client,
    url: String,
    reconnect_delay: Duration,
    request_timeout: Duration,
    sink: mpsc::Sender<StoreEvent>,
}

impl Listener {
    async fn run(self) {
        loop {
            match self.stream_once().await {
                Ok(()) => log::info!("Event stream for {} ended", self.url),
                Err(err @ StoreError::Cancelled(_)) => {
                    log::warn!("Subscription to {} cancelled: {err}", self.url);
                    let _ = self
                        .sink
                        .send(StoreEvent::SubscriptionError(err.to_string()))
                        .await;
                    return;
                }
                Err(err) => {
                    log::warn!("Subscription to {} failed: {err}", self.url);
                    if self
                        .sink
                        .send(StoreEvent::SubscriptionError(err.to_string()))
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
            }

            if self.sink.is_closed() {
                return;
            }
            tokio::time::sleep(self.reconnect_delay).await;
            log::info!("Reconnecting to {}", self.url);
        }
    }

    async fn stream_once(&self) -> Result<(), StoreError> {
        let response = self
            .http
            .get(&self.url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await?;
        let mut stream = check_status(response).await?.bytes_stream();
        let mut decoder = SseDecoder::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for event in decoder.feed(&chunk) {
                if !self.handle_event(event).await? {
                    return Ok(());
                }
            }
        }

        Ok(())
    }

    /// Returns `Ok(false)` once nobody is listening any more.
    async fn handle_event(&self, event: SseEvent) -> Result<bool, StoreError> {
        match event.event.as_str() {
            "put" | "patch" => {
                let change: ChangeEvent = serde_json::from_str(&event.data)?;
                let snapshot = if event.event == "put" && change.path == "/" {
                    decode_snapshot(&change.data)
                } else {
                    fetch_snapshot(&self.http, &self.url, self.request_timeout).await?
                };
                log::debug!(
                    "{} at {}: snapshot of {} messages",
                    event.event,
                    change.path,
                    snapshot.len()
                );
                Ok(self.sink.send(StoreEvent::Snapshot(snapshot)).await.is_ok())
            }
            "keep-alive" => Ok(true),
            "cancel" | "auth_revoked" => Err(StoreError::Cancelled(format!(
                "{} ({})",
                event.event, event.data
            ))),
            other => {
                log::debug!("Ignoring stream event `{other}`");
                Ok(true)
            }
        }
    }
}
