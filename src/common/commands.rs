use super::types::Message;

/// Commands the UI sends down to the store worker.
#[derive(Debug, Clone)]
pub enum StoreCommand {
    /// Append a message to the end of the remote collection. Fire-and-forget
    /// from the sender's point of view; the outcome comes back as a
    /// [`StoreEvent`](super::StoreEvent).
    Append(Message),
    /// Drop the current subscription and open a fresh one.
    Resubscribe,
}
