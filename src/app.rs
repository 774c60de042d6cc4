// src/app.rs
use chrono::{Local, NaiveDate};
use eframe::egui;
use rfd::FileDialog;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::analysis::AnalysisKind;
use crate::export::{ExportArtifact, ExportError, ReportCapture};
use crate::state::{AppState, Level, Screen};
use crate::ui::data::{self, DataAction};
use crate::ui::{page, source, PageAction};

const REPAINT_INTERVAL: Duration = Duration::from_millis(100);

pub struct StatisticaApp {
    state: AppState,
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

impl StatisticaApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    fn show_menu(&mut self, ui: &mut egui::Ui) {
        egui::menu::bar(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open CSV...").clicked() {
                    self.open_dataset();
                    ui.close_menu();
                }
                if ui.button("Load Sample Data").clicked() {
                    self.state.load_sample(rand::random());
                    ui.close_menu();
                }
                ui.separator();
                if ui.button("Quit").clicked() {
                    ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                    ui.close_menu();
                }
            });

            ui.separator();

            if ui.selectable_label(self.state.current_screen == Screen::Data, "Data").clicked() {
                self.state.current_screen = Screen::Data;
            }
            for kind in AnalysisKind::ALL {
                let screen = Screen::Analysis(kind);
                if ui.selectable_label(self.state.current_screen == screen, kind.title()).clicked() {
                    self.state.current_screen = screen;
                }
            }
        });
    }

    fn open_dataset(&mut self) {
        let file_dialog = FileDialog::new()
            .add_filter("CSV files", &["csv"])
            .set_title("Open Dataset");

        if let Some(path) = file_dialog.pick_file() {
            self.state.load_dataset(&path);
        }
    }

    fn handle_page_action(&mut self, ctx: &egui::Context, kind: AnalysisKind, action: PageAction) {
        debug!(?kind, ?action, "page action");
        match action {
            PageAction::Next => {
                self.state.advance(kind);
            }
            PageAction::ExportCsv => self.state.export_csv(kind, today()),
            PageAction::ExportClusters => self.state.export_clusters(kind, today()),
            PageAction::ExportPng => {
                if let Some(page) = self.state.page_mut(kind) {
                    page.awaiting_screenshot = true;
                    ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot);
                }
            }
            PageAction::ExportDocument => self.state.request_document(kind, today()),
            PageAction::SavePreset => {
                let file_dialog = FileDialog::new()
                    .add_filter("RON files", &["ron"])
                    .set_file_name(format!("{}.ron", kind.slug()))
                    .set_title("Save Analysis Settings");
                if let Some(path) = file_dialog.save_file() {
                    self.state.save_preset(kind, &path);
                }
            }
            PageAction::LoadPreset => {
                let file_dialog = FileDialog::new()
                    .add_filter("RON files", &["ron"])
                    .set_title("Load Analysis Settings");
                if let Some(path) = file_dialog.pick_file() {
                    self.state.load_preset(kind, &path);
                }
            }
            PageAction::ShowSource => self.state.open_source(kind),
        }
    }

    /// Finishes PNG exports once the requested screenshot arrives.
    fn handle_screenshots(&mut self, ctx: &egui::Context) {
        let image = ctx.input(|i| {
            i.raw.events.iter().rev().find_map(|e| match e {
                egui::Event::Screenshot { image, .. } => Some(Arc::clone(image)),
                _ => None,
            })
        });
        let Some(image) = image else {
            return;
        };

        let waiting: Vec<_> = self
            .state
            .pages
            .iter_mut()
            .filter(|p| p.awaiting_screenshot)
            .map(|p| {
                p.awaiting_screenshot = false;
                (p.kind, p.report_region)
            })
            .collect();
        if waiting.is_empty() {
            return;
        }

        let rgba: Vec<u8> = image.pixels.iter().flat_map(|c| c.to_srgba_unmultiplied()).collect();
        let ppp = ctx.pixels_per_point();
        for (kind, region) in waiting {
            let capture = region
                .ok_or_else(|| ExportError::Image("the report is not on screen".to_string()))
                .and_then(|region| {
                    ReportCapture::new(image.size[0] as u32, image.size[1] as u32, rgba.clone(), ppp, region)
                });
            match capture {
                Ok(capture) => self.state.export_png(kind, &capture, today()),
                Err(e) => self.state.notifications.error(e.to_string()),
            }
        }
    }

    fn offer_pending_save(&mut self) {
        let Some(artifact) = self.state.pending_save.take() else {
            return;
        };
        let extension = artifact.extension().to_string();
        let file_dialog = FileDialog::new()
            .add_filter(extension.to_uppercase(), &[extension.as_str()])
            .set_file_name(&artifact.file_name)
            .set_title("Save Export");

        if let Some(path) = file_dialog.save_file() {
            self.state.save_artifact(&artifact, &path);
        }
    }

    fn show_notifications(&mut self, ctx: &egui::Context) {
        self.state.notifications.prune(Instant::now());
        if self.state.notifications.is_empty() {
            return;
        }

        let mut dismissed = None;
        egui::Area::new("notifications")
            .anchor(egui::Align2::RIGHT_BOTTOM, [-12.0, -12.0])
            .show(ctx, |ui| {
                for (idx, note) in self.state.notifications.iter().enumerate() {
                    let color = match note.level {
                        Level::Info => ui.visuals().text_color(),
                        Level::Success => egui::Color32::from_rgb(100, 200, 100),
                        Level::Error => egui::Color32::from_rgb(230, 100, 100),
                    };
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.horizontal(|ui| {
                            ui.colored_label(color, &note.message);
                            if ui.small_button("✕").clicked() {
                                dismissed = Some(idx);
                            }
                        });
                    });
                    ui.add_space(4.0);
                }
            });

        if let Some(idx) = dismissed {
            self.state.notifications.dismiss(idx);
        }
    }

    fn show_source(&mut self, ctx: &egui::Context) {
        if !source::show_source_window(ctx, &mut self.state.source_view) {
            return;
        }
        let Some(view) = self.state.source_view.as_ref() else {
            return;
        };
        if let Some(text) = &view.text {
            self.state.pending_save = Some(ExportArtifact {
                file_name: view.kind.source_file().to_string(),
                mime: "text/x-python",
                bytes: text.clone().into_bytes(),
            });
        }
    }
}

impl eframe::App for StatisticaApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll_tasks();
        self.handle_screenshots(ctx);

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            self.show_menu(ui);
        });

        let mut page_action = None;
        let mut data_action = None;
        egui::CentralPanel::default().show(ctx, |ui| match self.state.current_screen {
            Screen::Data => {
                data_action = data::show_data_view(ui, &self.state);
            }
            Screen::Analysis(kind) => {
                if let Some(page) = self.state.page_mut(kind) {
                    page_action = page::show_analysis_page(ui, page).map(|a| (kind, a));
                }
            }
        });

        match data_action {
            Some(DataAction::OpenCsv) => self.open_dataset(),
            Some(DataAction::LoadSample) => self.state.load_sample(rand::random()),
            None => {}
        }
        if let Some((kind, action)) = page_action {
            self.handle_page_action(ctx, kind, action);
        }

        self.show_source(ctx);
        self.show_notifications(ctx);

        // Show error modal if needed
        let error_msg = self.state.error_message.clone();
        if let Some(error) = error_msg {
            egui::Window::new("Error")
                .collapsible(false)
                .resizable(false)
                .show(ctx, |ui| {
                    ui.label(&error);
                    if ui.button("OK").clicked() {
                        self.state.error_message = None;
                    }
                });
        }

        self.offer_pending_save();

        let waiting_for_screenshot = self.state.pages.iter().any(|p| p.awaiting_screenshot);
        if waiting_for_screenshot {
            ctx.request_repaint();
        } else if self.state.tasks.pending() > 0 || !self.state.notifications.is_empty() {
            ctx.request_repaint_after(REPAINT_INTERVAL);
        }
    }
}
