use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc;

use crate::chat::{self, InputHandler};
use crate::common::{StoreCommand, StoreEvent};

use super::components::{chat_area, event_log, input_bar};
use super::state::{AppState, ConnectionStatus};

/// Background snapshots only show up when egui repaints.
const REPAINT_INTERVAL: Duration = Duration::from_millis(200);

pub struct ChatApp {
    state: AppState,
    title: String,
    input: InputHandler,
    command_sender: mpsc::Sender<StoreCommand>,
    event_receiver: mpsc::Receiver<StoreEvent>,
}

impl ChatApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        command_sender: mpsc::Sender<StoreCommand>,
        event_receiver: mpsc::Receiver<StoreEvent>,
        title: String,
    ) -> Self {
        Self {
            state: AppState::new(),
            title,
            input: InputHandler::new(command_sender.clone()),
            command_sender,
            event_receiver,
        }
    }

    fn handle_store_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            self.state.apply_event(event);
        }
    }

    fn resubscribe(&mut self) {
        if let Err(err) = self.command_sender.try_send(StoreCommand::Resubscribe) {
            log::warn!("Failed to send resubscribe command: {err}");
        } else {
            self.state.mark_reconnecting();
        }
    }

    fn render_status(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading(self.title.as_str());

            match &self.state.status {
                ConnectionStatus::Connecting => {
                    ui.colored_label(egui::Color32::GRAY, "○ connecting");
                }
                ConnectionStatus::Live => {
                    ui.colored_label(egui::Color32::GREEN, "● live");
                }
                ConnectionStatus::Failed(reason) => {
                    ui.colored_label(egui::Color32::RED, "● offline")
                        .on_hover_text(reason.as_str());
                }
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.toggle_value(&mut self.state.show_event_log, "Events");
                if matches!(self.state.status, ConnectionStatus::Failed(_))
                    && ui.button("Reconnect").clicked()
                {
                    self.resubscribe();
                }
            });
        });
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_store_events();

        egui::TopBottomPanel::top("status_bar").show(ctx, |ui| {
            self.render_status(ui);
        });

        if self.state.show_event_log {
            egui::SidePanel::right("event_log")
                .resizable(true)
                .default_width(260.0)
                .show(ctx, |ui| {
                    event_log::render(ui, &self.state);
                });
        }

        egui::TopBottomPanel::bottom("input_bar").show(ctx, |ui| {
            ui.add_space(4.0);
            if input_bar::render(ui, &mut self.state.input_text) {
                self.input.submit(&mut self.state.input_text);
            }
            ui.add_space(4.0);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let scroll_to_end = self.state.mirror.take_scroll_request();
            let rows = chat::render(self.state.mirror.messages());
            chat_area::render(ui, &rows, scroll_to_end);
        });

        ctx.request_repaint_after(REPAINT_INTERVAL);
    }
}
