use eframe::egui;

/// Draws the text field and Send button. Returns true when the user asked to
/// send, either by clicking or by pressing Enter in the field.
pub fn render(ui: &mut egui::Ui, input_text: &mut String) -> bool {
    let mut send = false;
    ui.horizontal(|ui| {
        let response = ui.add(
            egui::TextEdit::singleline(input_text)
                .hint_text("Type a message")
                .desired_width(ui.available_width() - 60.0),
        );
        if ui.button("Send").clicked() {
            send = true;
        }

        if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
            send = true;
            response.request_focus();
        }
    });

    send
}
