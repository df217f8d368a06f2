use std::sync::Arc;

use tokio::sync::mpsc;

use crate::common::{Message, StoreCommand, StoreEvent};
use crate::store::RemoteStore;

/// Background worker sitting between the UI and the store.
///
/// Owns the live subscription for as long as the UI keeps its command sender.
pub struct StoreClient {
    store: Arc<dyn RemoteStore>,
    event_sender: mpsc::Sender<StoreEvent>,
    command_receiver: mpsc::Receiver<StoreCommand>,
}

impl StoreClient {
    pub fn new(
        store: Arc<dyn RemoteStore>,
        event_sender: mpsc::Sender<StoreEvent>,
        command_receiver: mpsc::Receiver<StoreCommand>,
    ) -> Self {
        Self {
            store,
            event_sender,
            command_receiver,
        }
    }

    pub async fn run(mut self) {
        let mut subscription = self.store.subscribe(self.event_sender.clone());
        log::info!("Store worker started");

        while let Some(command) = self.command_receiver.recv().await {
            match command {
                // Awaited in place so writes land in the order they were typed.
                StoreCommand::Append(message) => self.append(message).await,
                StoreCommand::Resubscribe => {
                    drop(subscription);
                    subscription = self.store.subscribe(self.event_sender.clone());
                }
            }
        }

        log::info!(
            "Command channel closed; releasing subscription {}",
            subscription.name()
        );
    }

    async fn append(&self, message: Message) {
        let event = match self.store.append(&message).await {
            Ok(key) => {
                log::info!("Stored message {key}");
                StoreEvent::WriteCompleted { key }
            }
            Err(err) => {
                log::warn!("Failed to store message: {err}");
                StoreEvent::WriteFailed(err.to_string())
            }
        };

        if let Err(err) = self.event_sender.send(event).await {
            log::debug!("UI gone before write result arrived: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::time::Duration;

    struct Harness {
        store: Arc<MemoryStore>,
        commands: mpsc::Sender<StoreCommand>,
        events: mpsc::Receiver<StoreEvent>,
        worker: tokio::task::JoinHandle<()>,
    }

    fn start() -> Harness {
        let store = Arc::new(MemoryStore::new("contactForm"));
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, event_rx) = mpsc::channel(16);
        let client = StoreClient::new(store.clone(), event_tx, cmd_rx);
        Harness {
            store,
            commands: cmd_tx,
            events: event_rx,
            worker: tokio::spawn(client.run()),
        }
    }

    async fn next_event(events: &mut mpsc::Receiver<StoreEvent>) -> StoreEvent {
        tokio::time::timeout(Duration::from_secs(1), events.recv())
            .await
            .expect("timed out waiting for store event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn initial_snapshot_is_forwarded() {
        let mut harness = start();
        assert_eq!(
            next_event(&mut harness.events).await,
            StoreEvent::Snapshot(Vec::new())
        );
    }

    #[tokio::test]
    async fn append_reports_completion_and_new_snapshot() {
        let mut harness = start();
        next_event(&mut harness.events).await;

        let message = Message::compose("hello", "14:05").unwrap();
        harness
            .commands
            .send(StoreCommand::Append(message.clone()))
            .await
            .unwrap();

        let mut completed = false;
        let mut mirrored = false;
        while !(completed && mirrored) {
            match next_event(&mut harness.events).await {
                StoreEvent::WriteCompleted { .. } => completed = true,
                StoreEvent::Snapshot(snapshot) => mirrored = snapshot == vec![message.clone()],
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn failed_write_is_reported() {
        let mut harness = start();
        next_event(&mut harness.events).await;
        harness.store.set_unavailable(true);

        harness
            .commands
            .send(StoreCommand::Append(Message::compose("x", "10:00").unwrap()))
            .await
            .unwrap();

        assert!(matches!(
            next_event(&mut harness.events).await,
            StoreEvent::WriteFailed(_)
        ));
        assert!(harness.store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn writes_keep_submission_order() {
        let mut harness = start();
        next_event(&mut harness.events).await;

        for text in ["a", "b", "c"] {
            harness
                .commands
                .send(StoreCommand::Append(Message::compose(text, "10:00").unwrap()))
                .await
                .unwrap();
        }

        let mut completed = 0;
        while completed < 3 {
            if let StoreEvent::WriteCompleted { .. } = next_event(&mut harness.events).await {
                completed += 1;
            }
        }
        let texts: Vec<_> = harness
            .store
            .snapshot()
            .iter()
            .map(|message| message.text().to_string())
            .collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn resubscribe_delivers_fresh_snapshot() {
        let mut harness = start();
        next_event(&mut harness.events).await;
        harness
            .store
            .append(&Message::compose("kept", "12:00").unwrap())
            .await
            .unwrap();
        assert_eq!(
            next_event(&mut harness.events).await,
            StoreEvent::Snapshot(vec![Message::stored("kept", "12:00")])
        );

        harness.commands.send(StoreCommand::Resubscribe).await.unwrap();

        assert_eq!(
            next_event(&mut harness.events).await,
            StoreEvent::Snapshot(vec![Message::stored("kept", "12:00")])
        );
    }

    #[tokio::test]
    async fn worker_stops_when_ui_drops_sender() {
        let harness = start();
        drop(harness.commands);

        let finished = tokio::time::timeout(Duration::from_secs(1), harness.worker).await;
        assert!(finished.is_ok());
    }

    #[tokio::test]
    async fn unresponsive_server_reports_failed_writes_and_keeps_worker_alive() {
        use crate::network::FirebaseStore;
        use crate::network::test_server::{Reply, serve};

        // One connection for the event stream, one per append; none answer.
        let server = serve(vec![Reply::Hang, Reply::Hang, Reply::Hang, Reply::Hang]).await;
        let store = FirebaseStore::new(
            &server.base_url,
            "contactForm",
            Duration::from_millis(10),
            Duration::from_millis(200),
        )
        .unwrap();

        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (event_tx, mut event_rx) = mpsc::channel(16);
        tokio::spawn(StoreClient::new(Arc::new(store), event_tx, cmd_rx).run());

        for text in ["first", "second"] {
            cmd_tx
                .send(StoreCommand::Append(Message::compose(text, "10:00").unwrap()))
                .await
                .unwrap();
            let event = tokio::time::timeout(Duration::from_secs(5), event_rx.recv())
                .await
                .expect("write result never arrived");
            assert!(matches!(event, Some(StoreEvent::WriteFailed(_))), "{event:?}");
        }
    }
}
