//! Credential setup screen.
//!
//! Shown on first run and when the user rotates their key from the header.

use eframe::egui;

use crate::state::AppState;

const KEY_HELP_URL: &str = "https://platform.openai.com/api-keys";

pub fn render_setup_screen(s: &mut AppState, ui: &mut egui::Ui) {
    let accent = egui::Color32::from_rgb(59, 130, 246);
    let muted = egui::Color32::from_rgb(120, 120, 135);

    ui.add_space(24.0);
    ui.vertical_centered(|ui| {
        ui.heading(
            egui::RichText::new(s.popup.setup.heading())
                .size(20.0)
                .strong(),
        );
        ui.add_space(4.0);
        ui.label(
            egui::RichText::new(s.popup.setup.subheading())
                .size(13.0)
                .color(muted),
        );
    });
    ui.add_space(20.0);

    egui::Frame::none()
        .rounding(egui::Rounding::same(10.0))
        .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(210, 215, 225)))
        .inner_margin(egui::Margin::same(14.0))
        .show(ui, |ui| {
            ui.label(egui::RichText::new("OpenAI API Key").strong());
            ui.add_space(4.0);

            let mut submitted = false;
            ui.horizontal(|ui| {
                let edit = egui::TextEdit::singleline(&mut s.popup.setup.key_input)
                    .password(!s.popup.setup.reveal)
                    .hint_text("sk-...")
                    .desired_width(ui.available_width() - 40.0);
                let response = ui.add(edit);
                if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    submitted = true;
                }

                let eye = if s.popup.setup.reveal { "🙈" } else { "👁" };
                if ui
                    .button(eye)
                    .on_hover_text(if s.popup.setup.reveal { "Hide key" } else { "Show key" })
                    .clicked()
                {
                    s.popup.setup.reveal = !s.popup.setup.reveal;
                }
            });

            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Get your key from").size(11.0).color(muted));
                ui.hyperlink_to(egui::RichText::new("OpenAI").size(11.0), KEY_HELP_URL);
            });

            ui.add_space(12.0);
            let has_input = !s.popup.setup.key_input.trim().is_empty();
            ui.horizontal(|ui| {
                let save = egui::Button::new(
                    egui::RichText::new("Save API Key")
                        .strong()
                        .color(egui::Color32::WHITE),
                )
                .fill(accent)
                .rounding(egui::Rounding::same(8.0))
                .min_size(egui::vec2(140.0, 32.0));

                if ui.add_enabled(has_input, save).clicked() {
                    submitted = true;
                }

                if s.popup.setup.is_update && ui.button("Cancel").clicked() {
                    s.popup.cancel_settings();
                }
            });

            if submitted && has_input {
                s.save_credential();
            }
        });

    ui.add_space(12.0);
    ui.label(
        egui::RichText::new("Your key is stored on this device and sent only to the OpenAI API.")
            .size(11.0)
            .weak(),
    );
}
