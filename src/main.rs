mod chat;
mod common;
mod config;
mod network;
mod storage;
mod store;
mod ui;

use std::error::Error;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use eframe::egui;
use network::StoreClient;
use store::RemoteStore;
use tokio::sync::mpsc;
use ui::ChatApp;

use chat::InputHandler;
use common::StoreEvent;
use config::{AppConfig, Backend};

#[derive(Parser)]
#[command(
    name = "chat_mirror",
    version,
    about = "Single-room chat mirrored from a realtime database"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    /// Message backend (overrides config and CHAT_BACKEND)
    #[arg(long, value_enum)]
    backend: Option<Backend>,
    /// Realtime database root URL
    #[arg(long, value_name = "URL")]
    database_url: Option<String>,
    /// Collection holding the messages
    #[arg(long, value_name = "NAME")]
    collection: Option<String>,
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Clone, PartialEq, Eq)]
enum Mode {
    /// Print every snapshot to stdout (no UI)
    Tail,
    /// Send one message and wait for the store to accept it (no UI)
    Send { text: String },
}

impl Cli {
    fn apply(&self, config: &mut AppConfig) {
        if let Some(backend) = self.backend {
            config.backend = backend;
        }
        if let Some(url) = &self.database_url {
            config.database_url = Some(url.clone());
        }
        if let Some(collection) = &self.collection {
            config.collection = collection.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let mut app_config = config::load_config(&cli.config);
    app_config.apply_env();
    cli.apply(&mut app_config);

    log::info!(
        "Using {:?} backend, collection `{}`",
        app_config.backend,
        app_config.collection
    );
    let store = store::open(&app_config)?;

    match cli.mode {
        Some(Mode::Tail) => run_tail(store).await,
        Some(Mode::Send { text }) => run_send(store, &text).await,
        None => run_full_client(store, app_config).await.map_err(Into::into),
    }
}

async fn run_tail(store: Arc<dyn RemoteStore>) -> Result<(), Box<dyn Error>> {
    let (event_tx, mut event_rx) = mpsc::channel(32);
    let _subscription = store.subscribe(event_tx);

    loop {
        tokio::select! {
            event = event_rx.recv() => match event {
                Some(StoreEvent::Snapshot(snapshot)) => {
                    println!("--- {} messages ---", snapshot.len());
                    for row in chat::render(&snapshot) {
                        println!("[{}] {}", row.time_label, row.text);
                    }
                }
                Some(StoreEvent::SubscriptionError(reason)) => {
                    log::warn!("Subscription error: {reason}");
                }
                Some(_) => {}
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    Ok(())
}

async fn run_send(store: Arc<dyn RemoteStore>, text: &str) -> Result<(), Box<dyn Error>> {
    let (cmd_tx, cmd_rx) = mpsc::channel(1);
    let (event_tx, mut event_rx) = mpsc::channel(32);
    let worker = tokio::spawn(StoreClient::new(store, event_tx, cmd_rx).run());

    let input = InputHandler::new(cmd_tx);
    let mut buffer = text.to_string();
    if input.submit(&mut buffer).is_none() {
        log::warn!("Nothing to send: message is blank");
        return Ok(());
    }

    let outcome = loop {
        match event_rx.recv().await {
            Some(StoreEvent::WriteCompleted { key }) => break Ok(key),
            Some(StoreEvent::WriteFailed(reason)) => break Err(reason),
            Some(_) => continue,
            None => break Err("store worker stopped".to_string()),
        }
    };

    // Closing the command channel ends the worker and its subscription.
    drop(input);
    drop(event_rx);
    if let Err(err) = worker.await {
        log::warn!("Store worker did not shut down cleanly: {err}");
    }

    let key = outcome?;
    println!("{key}");
    Ok(())
}

async fn run_full_client(
    store: Arc<dyn RemoteStore>,
    app_config: AppConfig,
) -> Result<(), eframe::Error> {
    // UI -> store worker
    let (cmd_tx, cmd_rx) = mpsc::channel(100);
    // store worker -> UI
    let (event_tx, event_rx) = mpsc::channel(100);

    tokio::spawn(StoreClient::new(store, event_tx, cmd_rx).run());

    let title = app_config.window_title;
    let app_name = title.clone();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([420.0, 720.0])
            .with_title(title.clone()),
        ..Default::default()
    };

    eframe::run_native(
        &app_name,
        options,
        Box::new(move |cc| {
            log::info!("Chat window started");
            Ok(Box::new(ChatApp::new(cc, cmd_tx, event_rx, title)))
        }),
    )
}
