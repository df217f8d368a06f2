use std::fs;
use std::path::Path;
use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "config/chat.json";
pub const DEFAULT_COLLECTION: &str = "contactForm";

/// Where messages are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Cloud realtime database over REST
    Firebase,
    /// Local SQLite file
    Sqlite,
    /// Process memory only; lost on exit
    Memory,
}

impl std::str::FromStr for Backend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(value, true)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub backend: Backend,
    /// Root URL of the realtime database, e.g. `https://<project>.firebaseio.com`
    pub database_url: Option<String>,
    pub collection: String,
    pub sqlite_path: String,
    pub poll_interval_ms: u64,
    pub reconnect_delay_ms: u64,
    /// Bound on connecting and on each one-shot request (append, snapshot
    /// fetch). The live event stream itself is not bounded.
    pub request_timeout_ms: u64,
    pub window_title: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Firebase,
            database_url: None,
            collection: DEFAULT_COLLECTION.to_string(),
            sqlite_path: "data/chat.db".to_string(),
            poll_interval_ms: 1000,
            reconnect_delay_ms: 3000,
            request_timeout_ms: 10_000,
            window_title: "Chat".to_string(),
        }
    }
}

impl AppConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms.max(1))
    }

    /// Applies `CHAT_BACKEND`, `FIREBASE_DATABASE_URL` and `CHAT_COLLECTION`.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(backend) = lookup("CHAT_BACKEND") {
            match backend.parse() {
                Ok(backend) => self.backend = backend,
                Err(err) => log::warn!("Ignoring CHAT_BACKEND=`{backend}`: {err}"),
            }
        }
        if let Some(url) = lookup("FIREBASE_DATABASE_URL").filter(|url| !url.trim().is_empty()) {
            self.database_url = Some(url);
        }
        if let Some(collection) = lookup("CHAT_COLLECTION").filter(|name| !name.trim().is_empty())
        {
            self.collection = collection;
        }
    }
}

/// Reads the chat config at `path`. Anything unreadable leaves the chat on
/// defaults; environment and CLI overrides are applied afterwards.
pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            log::info!(
                "No chat config at {}; using defaults (collection `{DEFAULT_COLLECTION}`)",
                path.display()
            );
            return AppConfig::default();
        }
        Err(err) => {
            log::warn!("Cannot read chat config {}: {err}", path.display());
            return AppConfig::default();
        }
    };

    match serde_json::from_str::<AppConfig>(&content) {
        Ok(config) => {
            log::debug!(
                "Loaded chat config {}: {:?} backend, collection `{}`",
                path.display(),
                config.backend,
                config.collection
            );
            config
        }
        Err(err) => {
            log::warn!(
                "Chat config {} is malformed ({err}); falling back to defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}
