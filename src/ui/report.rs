// src/ui/report.rs
use eframe::egui;
use egui_plot::{Bar, BarChart, Legend, Plot, Points, VLine};
use std::collections::BTreeMap;

use super::PageAction;
use crate::analysis::{AnalysisFields, AnalysisResult};
use crate::dataset::Dataset;
use crate::export::CaptureRegion;
use crate::wizard::{Step, Wizard};

const PALETTE: [egui::Color32; 8] = [
    egui::Color32::from_rgb(100, 150, 255),
    egui::Color32::from_rgb(230, 120, 80),
    egui::Color32::from_rgb(100, 200, 100),
    egui::Color32::from_rgb(200, 100, 200),
    egui::Color32::from_rgb(240, 200, 60),
    egui::Color32::from_rgb(80, 200, 200),
    egui::Color32::from_rgb(160, 110, 70),
    egui::Color32::from_rgb(250, 140, 180),
];

/// Result steps. The region the report body covers is recorded every frame
/// so a screenshot can be cropped to it.
pub fn show_report(
    ui: &mut egui::Ui,
    step: Step,
    wizard: &Wizard,
    region: &mut Option<CaptureRegion>,
    document_pending: bool,
) -> Option<PageAction> {
    let Some(result) = wizard.result() else {
        *region = None;
        ui.label("Run the analysis to see results");
        return None;
    };

    let action = show_export_bar(ui, result, document_pending);
    ui.separator();

    let body = ui.scope(|ui| match step {
        Step::Summary => show_summary(ui, wizard, result),
        Step::Reasoning => show_reasoning(ui, wizard.fields(), result),
        _ => show_statistics(ui, result),
    });

    let rect = body.response.rect.intersect(ui.clip_rect());
    *region = (rect.width() > 0.0 && rect.height() > 0.0).then(|| CaptureRegion {
        x: rect.min.x,
        y: rect.min.y,
        width: rect.width(),
        height: rect.height(),
    });

    action
}

fn show_export_bar(ui: &mut egui::Ui, result: &AnalysisResult, document_pending: bool) -> Option<PageAction> {
    let mut action = None;
    ui.horizontal(|ui| {
        ui.label("Export:");
        if ui.button("CSV").clicked() {
            action = Some(PageAction::ExportCsv);
        }
        if result.annotated_dataset().is_some() && ui.button("Clustered Data").clicked() {
            action = Some(PageAction::ExportClusters);
        }
        if ui.button("PNG").clicked() {
            action = Some(PageAction::ExportPng);
        }
        if ui.add_enabled(!document_pending, egui::Button::new("Word")).clicked() {
            action = Some(PageAction::ExportDocument);
        }
        if document_pending {
            ui.spinner();
            ui.label("Preparing document...");
        }
    });
    action
}

fn show_summary(ui: &mut egui::Ui, wizard: &Wizard, result: &AnalysisResult) {
    ui.heading("Summary");
    ui.add_space(4.0);
    for sentence in result.summary(wizard.fields()) {
        ui.label(sentence);
        ui.add_space(2.0);
    }
    ui.add_space(8.0);
    show_chart(ui, wizard.fields(), result, wizard.dataset());
}

fn show_reasoning(ui: &mut egui::Ui, fields: &AnalysisFields, result: &AnalysisResult) {
    ui.heading("How this result was reached");
    ui.add_space(4.0);
    for note in result.reasoning(fields) {
        ui.horizontal_wrapped(|ui| {
            ui.label("•");
            ui.label(note);
        });
        ui.add_space(2.0);
    }
}

fn show_statistics(ui: &mut egui::Ui, result: &AnalysisResult) {
    ui.heading("Statistics");
    ui.add_space(4.0);
    egui::Grid::new("statistics_grid")
        .num_columns(2)
        .spacing([40.0, 4.0])
        .striped(true)
        .show(ui, |ui| {
            for (key, value) in result.statistics() {
                ui.label(key);
                ui.strong(value);
                ui.end_row();
            }
        });

    let table = result.csv_table();
    if table.rows.is_empty() {
        return;
    }
    ui.add_space(12.0);
    ui.heading("Detail");
    egui::ScrollArea::horizontal()
        .id_source("statistics_table_scroll")
        .show(ui, |ui| {
            egui::Grid::new("statistics_table")
                .striped(true)
                .spacing([20.0, 2.0])
                .show(ui, |ui| {
                    for header in &table.headers {
                        ui.strong(header);
                    }
                    ui.end_row();
                    for row in &table.rows {
                        for cell in row {
                            ui.label(cell);
                        }
                        ui.end_row();
                    }
                });
        });
}

fn show_chart(ui: &mut egui::Ui, fields: &AnalysisFields, result: &AnalysisResult, dataset: &Dataset) {
    match (fields, result) {
        (AnalysisFields::RegressionDiscontinuity(f), AnalysisResult::RegressionDiscontinuity(_)) => {
            let (Some(running), Some(outcome)) = (f.running_col.as_deref(), f.outcome_col.as_deref()) else {
                return;
            };
            let rows = dataset.complete_numeric_rows(&[running, outcome]);
            let (left, right): (Vec<[f64; 2]>, Vec<[f64; 2]>) = rows
                .iter()
                .map(|r| [r[0], r[1]])
                .partition(|p| p[0] < f.cutoff);
            Plot::new("rdd_scatter")
                .height(260.0)
                .allow_zoom(false)
                .legend(Legend::default())
                .show(ui, |plot_ui| {
                    plot_ui.points(Points::new(left).radius(2.0).color(PALETTE[0]).name("Below cutoff"));
                    plot_ui.points(Points::new(right).radius(2.0).color(PALETTE[1]).name("Above cutoff"));
                    plot_ui.vline(VLine::new(f.cutoff).color(egui::Color32::RED).name("Cutoff"));
                });
        }
        (AnalysisFields::Dbscan(f), AnalysisResult::Dbscan(r)) => {
            if let Some(annotated) = r.annotated.as_ref() {
                cluster_scatter(ui, "dbscan_scatter", annotated, &f.selected_items);
            }
        }
        (AnalysisFields::KMeans(f), AnalysisResult::KMeans(r)) => {
            if let Some(annotated) = r.annotated.as_ref() {
                cluster_scatter(ui, "kmeans_scatter", annotated, &f.selected_items);
            }
        }
        (_, AnalysisResult::KruskalWallis(r)) => {
            let bars = r
                .group_stats
                .iter()
                .enumerate()
                .map(|(i, g)| {
                    Bar::new(i as f64, g.median)
                        .name(&g.group)
                        .width(0.6)
                        .fill(PALETTE[i % PALETTE.len()])
                })
                .collect();
            bar_plot(ui, "kruskal_medians", "Median by group", bars);
        }
        (_, AnalysisResult::GradientBoosting(r)) => {
            let bars = r
                .ranked_features()
                .into_iter()
                .enumerate()
                .map(|(i, f)| Bar::new(i as f64, f.importance).name(&f.feature).width(0.6).fill(PALETTE[0]))
                .collect();
            bar_plot(ui, "boosting_importance", "Feature importance", bars);
        }
        (_, AnalysisResult::SpatialAutoregressive(r)) => {
            let bars = r
                .coefficients
                .iter()
                .enumerate()
                .map(|(i, c)| {
                    let fill = if c.estimate >= 0.0 { PALETTE[2] } else { PALETTE[1] };
                    Bar::new(i as f64, c.estimate).name(&c.variable).width(0.6).fill(fill)
                })
                .collect();
            bar_plot(ui, "spatial_coefficients", "Coefficient estimates", bars);
        }
        _ => {}
    }
}

fn bar_plot(ui: &mut egui::Ui, id: &str, title: &str, bars: Vec<Bar>) {
    ui.strong(title);
    Plot::new(id)
        .height(220.0)
        .allow_zoom(false)
        .allow_drag(false)
        .show_axes([false, true])
        .include_y(0.0)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

/// First two clustering variables against each other, one series per label.
fn cluster_scatter(ui: &mut egui::Ui, id: &str, annotated: &Dataset, selected: &[String]) {
    let [x, y, ..] = selected else {
        return;
    };
    let rows = annotated.complete_numeric_rows(&[x.as_str(), y.as_str(), "cluster"]);
    let mut by_label: BTreeMap<i64, Vec<[f64; 2]>> = BTreeMap::new();
    for row in rows {
        by_label.entry(row[2] as i64).or_default().push([row[0], row[1]]);
    }

    ui.strong(format!("{} vs {}", y, x));
    Plot::new(id)
        .height(260.0)
        .allow_zoom(false)
        .legend(Legend::default())
        .show(ui, |plot_ui| {
            for (i, (label, points)) in by_label.into_iter().enumerate() {
                let (name, color) = if label < 0 {
                    ("Noise".to_string(), egui::Color32::GRAY)
                } else {
                    (format!("Cluster {}", label), PALETTE[i % PALETTE.len()])
                };
                plot_ui.points(Points::new(points).radius(2.5).color(color).name(name));
            }
        });
}
