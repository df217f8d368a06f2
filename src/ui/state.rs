use chrono::{DateTime, Local};

use crate::chat::ChatMirror;
use crate::common::StoreEvent;

const MAX_LOG_ENTRIES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    Snapshot,
    WriteCompleted,
    WriteFailed,
    SubscriptionError,
}

/// One line of the event panel.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub kind: LogKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Live,
    Failed(String),
}

/// Local state of the chat screen.
pub struct AppState {
    pub mirror: ChatMirror,
    pub input_text: String,
    pub status: ConnectionStatus,
    pub event_log: Vec<LogEntry>,
    pub show_event_log: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            mirror: ChatMirror::new(),
            input_text: String::new(),
            status: ConnectionStatus::Connecting,
            event_log: Vec::new(),
            show_event_log: false,
        }
    }

    pub fn apply_event(&mut self, event: StoreEvent) {
        match event {
            StoreEvent::Snapshot(snapshot) => {
                self.add_log_entry(
                    LogKind::Snapshot,
                    format!("Snapshot with {} messages", snapshot.len()),
                );
                self.mirror.on_snapshot(snapshot);
                self.status = ConnectionStatus::Live;
            }
            StoreEvent::SubscriptionError(reason) => {
                // The mirror keeps whatever it last saw.
                self.add_log_entry(LogKind::SubscriptionError, reason.clone());
                self.status = ConnectionStatus::Failed(reason);
            }
            StoreEvent::WriteCompleted { key } => {
                self.add_log_entry(LogKind::WriteCompleted, format!("Stored as {key}"));
            }
            StoreEvent::WriteFailed(reason) => {
                self.add_log_entry(LogKind::WriteFailed, reason);
            }
        }
    }

    /// Marks the screen as waiting for a fresh subscription.
    pub fn mark_reconnecting(&mut self) {
        self.status = ConnectionStatus::Connecting;
    }

    pub fn add_log_entry(&mut self, kind: LogKind, message: String) {
        self.event_log.push(LogEntry {
            timestamp: Local::now(),
            kind,
            message,
        });

        if self.event_log.len() > MAX_LOG_ENTRIES {
            self.event_log.remove(0);
        }
    }

    pub fn write_failures(&self) -> usize {
        self.event_log
            .iter()
            .filter(|entry| entry.kind == LogKind::WriteFailed)
            .count()
    }
}
