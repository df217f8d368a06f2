use chrono::{Local, NaiveTime};
use tokio::sync::mpsc;

use crate::common::{Message, StoreCommand};

/// Source of the wall-clock time stamped on outgoing messages.
pub trait Clock {
    fn now(&self) -> NaiveTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveTime {
        Local::now().time()
    }
}

/// Zero-padded 24-hour `HH:MM`.
pub fn time_label(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

/// Validates what the user typed and forwards it to the store worker.
pub struct InputHandler<C = LocalClock> {
    command_sender: mpsc::Sender<StoreCommand>,
    clock: C,
}

impl InputHandler<LocalClock> {
    pub fn new(command_sender: mpsc::Sender<StoreCommand>) -> Self {
        Self::with_clock(command_sender, LocalClock)
    }
}

impl<C: Clock> InputHandler<C> {
    pub fn with_clock(command_sender: mpsc::Sender<StoreCommand>, clock: C) -> Self {
        Self {
            command_sender,
            clock,
        }
    }

    /// Submits the contents of `input`.
    ///
    /// Blank input is ignored and left in place. Otherwise the message is
    /// handed to the worker without waiting and the field is cleared.
    pub fn submit(&self, input: &mut String) -> Option<Message> {
        let message = Message::compose(input, time_label(self.clock.now()))?;

        if let Err(err) = self
            .command_sender
            .try_send(StoreCommand::Append(message.clone()))
        {
            log::warn!("Failed to hand message to store worker: {err}");
        }

        input.clear();
        Some(message)
    }
}
