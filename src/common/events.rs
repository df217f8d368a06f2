use super::types::Message;

/// Events delivered from the store side up to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    /// Full, ordered contents of the collection. Never a diff.
    Snapshot(Vec<Message>),
    /// The subscription failed (permission denied, stream cancelled, network).
    SubscriptionError(String),
    WriteCompleted { key: String },
    WriteFailed(String),
}
