use eframe::egui;

use crate::chat::MessageRow;

pub fn render(ui: &mut egui::Ui, rows: &[MessageRow<'_>], scroll_to_end: bool) {
    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            if rows.is_empty() {
                ui.label(egui::RichText::new("No messages yet").weak());
            }

            for row in rows {
                egui::Frame::group(ui.style()).show(ui, |ui| {
                    ui.set_width(ui.available_width());
                    ui.label(egui::RichText::new(row.text).size(16.0));
                    // Time sits in the bottom-right corner of the bubble
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Min), |ui| {
                        ui.label(egui::RichText::new(row.time_label).size(14.0).weak());
                    });
                });
            }

            if scroll_to_end {
                ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
            }
        });
}
