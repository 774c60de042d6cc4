// src/ui/data.rs
use eframe::egui;

use crate::state::AppState;
use crate::utils::fmt_opt;

const PREVIEW_ROWS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataAction {
    OpenCsv,
    LoadSample,
}

pub fn show_data_view(ui: &mut egui::Ui, state: &AppState) -> Option<DataAction> {
    let mut action = None;

    ui.horizontal(|ui| {
        ui.heading("Dataset");
        ui.add_space(16.0);
        if ui.button("📂 Open CSV...").clicked() {
            action = Some(DataAction::OpenCsv);
        }
        if ui.button("Load Sample Data").clicked() {
            action = Some(DataAction::LoadSample);
        }
    });
    ui.separator();

    let Some(dataset) = state.dataset.as_ref() else {
        ui.centered_and_justified(|ui| {
            ui.label("Open a CSV file or load the sample data to begin");
        });
        return action;
    };

    ui.horizontal(|ui| {
        ui.strong(&dataset.name);
        ui.label(format!("{} rows, {} columns", dataset.row_count(), dataset.columns.len()));
    });
    ui.add_space(8.0);

    egui::ScrollArea::vertical()
        .id_source("data_scroll")
        .show(ui, |ui| {
            ui.group(|ui| {
                ui.heading("Columns");
                egui::Grid::new("column_stats")
                    .num_columns(7)
                    .spacing([24.0, 4.0])
                    .striped(true)
                    .show(ui, |ui| {
                        for header in ["Column", "Type", "Missing", "Distinct", "Min", "Mean", "Max"] {
                            ui.strong(header);
                        }
                        ui.end_row();

                        for name in &dataset.columns {
                            let Some(stats) = dataset.column_stats(name) else { continue };
                            ui.label(name);
                            ui.label(if stats.is_numeric() { "numeric" } else { "text" });
                            ui.label(stats.missing.to_string());
                            ui.label(stats.distinct.to_string());
                            ui.label(fmt_opt(stats.min, 3));
                            ui.label(fmt_opt(stats.mean, 3));
                            ui.label(fmt_opt(stats.max, 3));
                            ui.end_row();
                        }
                    });
            });

            ui.add_space(8.0);
            ui.group(|ui| {
                ui.heading("Analyses");
                for page in &state.pages {
                    ui.horizontal(|ui| {
                        match &page.incompatible {
                            None => {
                                ui.colored_label(egui::Color32::from_rgb(100, 200, 100), "✔");
                                ui.label(page.kind.title());
                            }
                            Some(reason) => {
                                ui.colored_label(egui::Color32::from_rgb(200, 100, 100), "✖");
                                ui.label(page.kind.title());
                                ui.weak(reason);
                            }
                        }
                    });
                }
            });

            ui.add_space(8.0);
            ui.group(|ui| {
                ui.heading(format!("Preview (first {} rows)", PREVIEW_ROWS.min(dataset.row_count())));
                egui::ScrollArea::horizontal()
                    .id_source("preview_scroll")
                    .show(ui, |ui| {
                        egui::Grid::new("data_preview")
                            .striped(true)
                            .spacing([16.0, 2.0])
                            .show(ui, |ui| {
                                for column in &dataset.columns {
                                    ui.strong(column);
                                }
                                ui.end_row();
                                for row in dataset.rows.iter().take(PREVIEW_ROWS) {
                                    for cell in row {
                                        ui.label(cell.display());
                                    }
                                    ui.end_row();
                                }
                            });
                    });
            });
        });

    action
}
