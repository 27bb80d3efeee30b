use eframe::egui;
use parking_lot::Mutex;
use providers::OpenAIClient;
use services::storage::Storage;
use shared::notice::{NoticeLevel, NOTICE_TTL};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

mod history_panel;
mod onboarding;
mod state;
mod types;
mod utils;
mod watcher;
mod worker;

use state::AppState;
use types::{Tab, UiMode};
use utils::{load_settings_or_default, save_settings};
use watcher::{spawn_watcher, ClipboardSource, POLL_INTERVAL};

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let state = match build_state() {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("failed to start ParaSummarizer: {:#}", e);
            std::process::exit(1);
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([420.0, 640.0])
            .with_min_inner_size([360.0, 480.0]),
        vsync: true,
        ..Default::default()
    };
    eframe::run_native(
        "ParaSummarizer",
        options,
        Box::new(|_cc| {
            Box::new(ParaSummarizerApp {
                state: Arc::new(Mutex::new(state)),
            })
        }),
    )
}

fn build_state() -> anyhow::Result<AppState> {
    let (settings, found) = load_settings_or_default();
    if !found {
        // First run: write defaults so they can be edited.
        if let Err(e) = save_settings(&settings) {
            tracing::warn!("could not write default settings: {:#}", e);
        }
    }
    tracing::info!(model = %settings.model, base_url = %settings.base_url, "starting");

    let storage = Storage::open_default();
    let client = OpenAIClient::from_settings(&settings)?;
    let min_chars = settings.capture_min_chars;

    let mut state = AppState::new(settings, storage, Arc::new(client))?;
    state.attach_watcher(|storage, events| {
        spawn_watcher(ClipboardSource::new()?, storage, min_chars, events, POLL_INTERVAL)
    });
    state.load();
    Ok(state)
}

struct ParaSummarizerApp {
    state: Arc<Mutex<AppState>>,
}

impl eframe::App for ParaSummarizerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut s = self.state.lock();

        // Worker replies and captured selections (non-blocking)
        s.poll();
        s.popup.notices.prune(Instant::now(), NOTICE_TTL);

        // Keep polling while a request is in flight or capture is on
        if s.is_busy() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
        if !s.popup.notices.is_empty() {
            ctx.request_repaint_after(Duration::from_millis(250));
        }

        let mut style = (*ctx.style()).clone();
        style.visuals.window_rounding = egui::Rounding::same(12.0);
        style.spacing.item_spacing = egui::vec2(8.0, 8.0);
        style.visuals.panel_fill = egui::Color32::from_rgb(250, 250, 252);
        ctx.set_style(style);

        egui::TopBottomPanel::top("header")
            .frame(
                egui::Frame::none()
                    .fill(egui::Color32::from_rgb(245, 247, 250))
                    .inner_margin(egui::Margin::symmetric(12.0, 10.0)),
            )
            .show(ctx, |ui| render_header(&mut s, ui));

        if !s.popup.notices.is_empty() {
            egui::TopBottomPanel::bottom("notices")
                .frame(egui::Frame::none().inner_margin(egui::Margin::same(8.0)))
                .show(ctx, |ui| render_notices(&mut s, ui));
        }

        egui::CentralPanel::default()
            .frame(egui::Frame::none().inner_margin(egui::Margin::same(14.0)))
            .show(ctx, |ui| match s.popup.mode() {
                UiMode::Loading => {
                    ui.add_space(60.0);
                    ui.vertical_centered(|ui| {
                        ui.spinner();
                        ui.label("Loading...");
                    });
                }
                UiMode::SetupRequired => onboarding::render_setup_screen(&mut s, ui),
                UiMode::Ready | UiMode::Submitting => {
                    ui.horizontal(|ui| {
                        for tab in [Tab::Summarize, Tab::History] {
                            ui.selectable_value(&mut s.popup.tab, tab, tab.display_name());
                        }
                    });
                    ui.separator();
                    match s.popup.tab {
                        Tab::Summarize => render_summarize_tab(&mut s, ui),
                        Tab::History => history_panel::render_history_panel(&mut s, ui),
                    }
                }
            });
    }
}

fn render_header(s: &mut AppState, ui: &mut egui::Ui) {
    ui.horizontal(|ui| {
        ui.heading(
            egui::RichText::new("ParaSummarizer")
                .size(20.0)
                .color(egui::Color32::from_rgb(60, 60, 80)),
        );

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            let can_open_settings = s.popup.mode() == UiMode::Ready;
            if ui
                .add_enabled(can_open_settings, egui::Button::new("⚙"))
                .on_hover_text("API key settings")
                .clicked()
            {
                s.popup.open_settings();
            }

            let (label, color) = if s.popup.capture_active {
                ("● Capturing", egui::Color32::from_rgb(22, 163, 74))
            } else {
                ("○ Capture off", egui::Color32::from_rgb(120, 120, 135))
            };
            if ui
                .add(egui::Button::new(egui::RichText::new(label).color(color)).frame(false))
                .on_hover_text("Toggle selection capture")
                .clicked()
            {
                s.toggle_capture();
            }
        });
    });
}

fn render_notices(s: &mut AppState, ui: &mut egui::Ui) {
    let mut dismissed = None;
    for (i, notice) in s.popup.notices.iter().enumerate() {
        let (fill, stroke) = match notice.level {
            NoticeLevel::Success => (
                egui::Color32::from_rgb(236, 253, 243),
                egui::Color32::from_rgb(22, 163, 74),
            ),
            NoticeLevel::Info => (
                egui::Color32::from_rgb(239, 246, 255),
                egui::Color32::from_rgb(59, 130, 246),
            ),
            NoticeLevel::Error => (
                egui::Color32::from_rgb(254, 242, 242),
                egui::Color32::from_rgb(220, 38, 38),
            ),
        };
        egui::Frame::none()
            .fill(fill)
            .stroke(egui::Stroke::new(1.0, stroke))
            .rounding(egui::Rounding::same(8.0))
            .inner_margin(egui::Margin::same(8.0))
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.horizontal(|ui| {
                    ui.label(egui::RichText::new(&notice.title).strong().color(stroke));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("×").clicked() {
                            dismissed = Some(i);
                        }
                    });
                });
                if !notice.description.is_empty() {
                    ui.label(egui::RichText::new(&notice.description).size(12.0));
                }
            });
    }
    if let Some(i) = dismissed {
        s.popup.notices.dismiss(i);
    }
}

fn render_summarize_tab(s: &mut AppState, ui: &mut egui::Ui) {
    let submitting = s.popup.mode() == UiMode::Submitting;
    let max_chars = s.popup.max_input_chars();

    ui.label(egui::RichText::new("Text to summarize").strong());
    ui.add_enabled(
        !submitting,
        egui::TextEdit::multiline(&mut s.popup.input_text)
            .char_limit(max_chars)
            .desired_rows(8)
            .desired_width(f32::INFINITY)
            .hint_text("Paste text here, or turn on capture and select a paragraph..."),
    );
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(s.popup.char_counter()).size(11.0).weak());
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if !s.popup.input_text.is_empty()
                && ui.add_enabled(!submitting, egui::Button::new("Clear")).clicked()
            {
                s.popup.input_text.clear();
                s.popup.summary.clear();
            }
        });
    });

    ui.add_space(6.0);
    ui.vertical_centered_justified(|ui| {
        let text = if submitting {
            "Generating Summary..."
        } else {
            "Generate Summary"
        };
        let button = egui::Button::new(
            egui::RichText::new(text)
                .strong()
                .color(egui::Color32::WHITE),
        )
        .fill(egui::Color32::from_rgb(59, 130, 246))
        .rounding(egui::Rounding::same(8.0))
        .min_size(egui::vec2(0.0, 36.0));

        if ui.add_enabled(s.popup.can_submit(), button).clicked() {
            s.submit();
        }
        if submitting {
            ui.spinner();
        }
    });

    if s.popup.summary.is_empty() {
        return;
    }

    ui.add_space(10.0);
    let mut copy = false;
    egui::Frame::group(ui.style())
        .rounding(egui::Rounding::same(8.0))
        .inner_margin(egui::Margin::same(10.0))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new("Summary").strong());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("📋 Copy").clicked() {
                        copy = true;
                    }
                });
            });
            egui::ScrollArea::vertical()
                .max_height(220.0)
                .show(ui, |ui| {
                    ui.label(s.popup.summary.as_str());
                });
        });
    if copy {
        let summary = s.popup.summary.clone();
        s.copy_text(&summary);
    }
}
