use eframe::egui;

use crate::ui::state::{AppState, LogKind};

pub fn render(ui: &mut egui::Ui, state: &AppState) {
    ui.heading("Store Events");
    ui.separator();

    ui.horizontal(|ui| {
        ui.label("Messages:");
        ui.label(format!("{}", state.mirror.len()));
    });
    ui.horizontal(|ui| {
        ui.label("Failed writes:");
        ui.label(format!("{}", state.write_failures()));
    });

    ui.separator();

    ui.label("Recent Events:");
    egui::ScrollArea::vertical()
        .max_height(300.0)
        .show(ui, |ui| {
            for entry in state.event_log.iter().rev().take(20) {
                let time_str = entry.timestamp.format("%H:%M:%S");
                let color = match entry.kind {
                    LogKind::Snapshot => egui::Color32::LIGHT_BLUE,
                    LogKind::WriteCompleted => egui::Color32::GREEN,
                    LogKind::WriteFailed => egui::Color32::YELLOW,
                    LogKind::SubscriptionError => egui::Color32::RED,
                };

                ui.horizontal(|ui| {
                    ui.colored_label(color, format!("[{}]", time_str));
                    ui.label(entry.message.as_str());
                });
            }
        });
}
