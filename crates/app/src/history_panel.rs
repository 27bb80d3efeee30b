//! History tab: saved summaries, newest first, with search.

use eframe::egui;

use crate::state::AppState;
use crate::utils::{format_timestamp, truncate_preview};

const PREVIEW_CHARS: usize = 100;

enum HistoryAction {
    Copy(String),
    Reuse(String),
    ClearAll,
}

pub fn render_history_panel(s: &mut AppState, ui: &mut egui::Ui) {
    let muted = egui::Color32::from_rgb(120, 120, 135);
    let mut action: Option<HistoryAction> = None;

    if !s.settings.history_enabled {
        ui.add_space(24.0);
        ui.vertical_centered(|ui| {
            ui.label(egui::RichText::new("History is turned off in settings.json").color(muted));
        });
        return;
    }

    let mut query_changed = false;
    ui.horizontal(|ui| {
        query_changed = ui
            .add(
                egui::TextEdit::singleline(&mut s.popup.history_query)
                    .hint_text("🔍 Search summaries...")
                    .desired_width(ui.available_width() - 90.0),
            )
            .changed();
        let has_history = !s.popup.history.is_empty();
        if ui
            .add_enabled(has_history, egui::Button::new("🗑 Clear All"))
            .clicked()
        {
            action = Some(HistoryAction::ClearAll);
        }
    });
    ui.add_space(8.0);

    if query_changed {
        s.refresh_history();
    }

    let records = &s.popup.history;
    if records.is_empty() {
        ui.add_space(24.0);
        ui.vertical_centered(|ui| {
            let msg = if s.popup.history_query.trim().is_empty() {
                "No summaries yet. Generate one and it will show up here."
            } else {
                "No summaries match your search."
            };
            ui.label(egui::RichText::new(msg).color(muted));
        });
    }

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for record in records {
                egui::Frame::group(ui.style())
                    .rounding(egui::Rounding::same(8.0))
                    .inner_margin(egui::Margin::same(10.0))
                    .show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        ui.horizontal(|ui| {
                            ui.label(
                                egui::RichText::new(format_timestamp(&record.timestamp))
                                    .size(11.0)
                                    .color(muted),
                            );
                            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                                if ui.small_button("📋").on_hover_text("Copy summary").clicked() {
                                    action = Some(HistoryAction::Copy(record.summary.clone()));
                                }
                                if ui
                                    .small_button("↩")
                                    .on_hover_text("Load original text")
                                    .clicked()
                                {
                                    action = Some(HistoryAction::Reuse(record.text.clone()));
                                }
                            });
                        });
                        ui.label(
                            egui::RichText::new(truncate_preview(&record.text, PREVIEW_CHARS))
                                .size(11.0)
                                .italics()
                                .color(muted),
                        );
                        ui.add_space(4.0);
                        ui.label(record.summary.as_str());
                    });
                ui.add_space(6.0);
            }
        });

    match action {
        Some(HistoryAction::Copy(summary)) => s.copy_text(&summary),
        Some(HistoryAction::Reuse(text)) => s.popup.reuse_text(text),
        Some(HistoryAction::ClearAll) => s.clear_history(),
        None => {}
    }
}
