// src/ui/fields.rs
//
// Variable and settings editors. Each edits a copy of the field state and
// hands it back to the wizard only when something changed, so validation
// is recomputed once per edit.
use eframe::egui;
use std::sync::Arc;

use super::{column_checklist, column_combo};
use crate::analysis::{
    AnalysisFields, BoostingFields, BoostingTask, DbscanFields, KMeansFields, Kernel,
    KruskalFields, RddFields, SpatialFields, SpatialModel,
};
use crate::dataset::Dataset;
use crate::wizard::Wizard;

pub fn show_variables(ui: &mut egui::Ui, wizard: &mut Wizard) {
    let dataset = Arc::clone(wizard.dataset());
    let mut fields = wizard.fields().clone();
    let changed = match &mut fields {
        AnalysisFields::RegressionDiscontinuity(f) => rdd_variables(ui, f, &dataset),
        AnalysisFields::Dbscan(f) => {
            ui.label("Variables to cluster on (numeric):");
            column_checklist(ui, &mut f.selected_items, &dataset.numeric_columns())
        }
        AnalysisFields::KMeans(f) => {
            ui.label("Variables to cluster on (numeric):");
            column_checklist(ui, &mut f.selected_items, &dataset.numeric_columns())
        }
        AnalysisFields::KruskalWallis(f) => kruskal_variables(ui, f, &dataset),
        AnalysisFields::GradientBoosting(f) => boosting_variables(ui, f, &dataset),
        AnalysisFields::SpatialAutoregressive(f) => spatial_variables(ui, f, &dataset),
    };
    if changed {
        wizard.set_fields(fields);
    }
}

pub fn show_settings(ui: &mut egui::Ui, wizard: &mut Wizard) {
    let mut fields = wizard.fields().clone();
    let changed = match &mut fields {
        AnalysisFields::RegressionDiscontinuity(f) => rdd_settings(ui, f),
        AnalysisFields::Dbscan(f) => dbscan_settings(ui, f),
        AnalysisFields::KMeans(f) => kmeans_settings(ui, f),
        AnalysisFields::KruskalWallis(f) => ui.checkbox(&mut f.post_hoc, "Pairwise post-hoc comparisons").changed(),
        AnalysisFields::GradientBoosting(f) => boosting_settings(ui, f),
        AnalysisFields::SpatialAutoregressive(f) => spatial_settings(ui, f),
    };
    if changed {
        wizard.set_fields(fields);
    }
}

fn rdd_variables(ui: &mut egui::Ui, f: &mut RddFields, dataset: &Dataset) -> bool {
    let numeric = dataset.numeric_columns();
    let mut changed = false;
    egui::Grid::new("rdd_variables")
        .num_columns(2)
        .spacing([40.0, 8.0])
        .show(ui, |ui| {
            ui.label("Outcome variable");
            changed |= column_combo(ui, "rdd_outcome", &mut f.outcome_col, &numeric);
            ui.end_row();
            ui.label("Running variable");
            changed |= column_combo(ui, "rdd_running", &mut f.running_col, &numeric);
            ui.end_row();
        });
    changed
}

fn rdd_settings(ui: &mut egui::Ui, f: &mut RddFields) -> bool {
    let mut changed = false;
    egui::Grid::new("rdd_settings")
        .num_columns(2)
        .spacing([40.0, 8.0])
        .show(ui, |ui| {
            ui.label("Cutoff");
            changed |= ui.add(egui::DragValue::new(&mut f.cutoff).speed(0.1)).changed();
            ui.end_row();

            ui.label("Bandwidth");
            ui.horizontal(|ui| {
                let mut automatic = f.bandwidth.is_none();
                if ui.checkbox(&mut automatic, "Automatic").changed() {
                    f.bandwidth = if automatic { None } else { Some(1.0) };
                    changed = true;
                }
                if let Some(bandwidth) = f.bandwidth.as_mut() {
                    changed |= ui.add(egui::DragValue::new(bandwidth).speed(0.05)).changed();
                }
            });
            ui.end_row();

            ui.label("Polynomial order");
            changed |= ui.add(egui::DragValue::new(&mut f.polynomial_order).clamp_range(0..=4)).changed();
            ui.end_row();

            ui.label("Kernel");
            egui::ComboBox::from_id_source("rdd_kernel")
                .selected_text(f.kernel.as_str())
                .show_ui(ui, |ui| {
                    for kernel in Kernel::ALL {
                        changed |= ui.selectable_value(&mut f.kernel, kernel, kernel.as_str()).changed();
                    }
                });
            ui.end_row();
        });
    changed
}

fn dbscan_settings(ui: &mut egui::Ui, f: &mut DbscanFields) -> bool {
    let mut changed = false;
    egui::Grid::new("dbscan_settings")
        .num_columns(2)
        .spacing([40.0, 8.0])
        .show(ui, |ui| {
            ui.label("Epsilon (neighborhood radius)");
            changed |= ui.add(egui::DragValue::new(&mut f.eps).speed(0.01)).changed();
            ui.end_row();
            ui.label("Minimum samples");
            changed |= ui.add(egui::DragValue::new(&mut f.min_samples)).changed();
            ui.end_row();
            ui.label("Standardize variables");
            changed |= ui.checkbox(&mut f.standardize, "").changed();
            ui.end_row();
        });
    changed
}

fn kmeans_settings(ui: &mut egui::Ui, f: &mut KMeansFields) -> bool {
    let mut changed = false;
    egui::Grid::new("kmeans_settings")
        .num_columns(2)
        .spacing([40.0, 8.0])
        .show(ui, |ui| {
            ui.label("Number of clusters");
            changed |= ui.add(egui::DragValue::new(&mut f.n_clusters)).changed();
            ui.end_row();
            ui.label("Maximum iterations");
            changed |= ui.add(egui::DragValue::new(&mut f.max_iter).speed(10)).changed();
            ui.end_row();
            ui.label("Standardize variables");
            changed |= ui.checkbox(&mut f.standardize, "").changed();
            ui.end_row();
        });
    changed
}

fn kruskal_variables(ui: &mut egui::Ui, f: &mut KruskalFields, dataset: &Dataset) -> bool {
    let numeric = dataset.numeric_columns();
    let mut changed = false;
    egui::Grid::new("kruskal_variables")
        .num_columns(2)
        .spacing([40.0, 8.0])
        .show(ui, |ui| {
            ui.label("Group variable");
            changed |= column_combo(ui, "kruskal_group", &mut f.group_col, &dataset.columns);
            ui.end_row();
            ui.label("Value variable");
            changed |= column_combo(ui, "kruskal_value", &mut f.value_col, &numeric);
            ui.end_row();
        });

    let sizes = f.group_sizes(dataset);
    if !sizes.is_empty() {
        ui.add_space(4.0);
        ui.weak(format!(
            "{} groups: {}",
            sizes.len(),
            sizes.iter().map(|(g, n)| format!("{} ({})", g, n)).collect::<Vec<_>>().join(", ")
        ));
    }
    changed
}

fn boosting_variables(ui: &mut egui::Ui, f: &mut BoostingFields, dataset: &Dataset) -> bool {
    let mut changed = false;
    egui::Grid::new("boosting_variables")
        .num_columns(2)
        .spacing([40.0, 8.0])
        .show(ui, |ui| {
            ui.label("Target variable");
            changed |= column_combo(ui, "boosting_target", &mut f.target_col, &dataset.columns);
            ui.end_row();
        });

    let candidates: Vec<String> = dataset
        .columns
        .iter()
        .filter(|c| f.target_col.as_deref() != Some(c.as_str()))
        .cloned()
        .collect();
    ui.add_space(4.0);
    ui.label("Features:");
    changed |= column_checklist(ui, &mut f.feature_cols, &candidates);
    changed
}

fn boosting_settings(ui: &mut egui::Ui, f: &mut BoostingFields) -> bool {
    let mut changed = false;
    egui::Grid::new("boosting_settings")
        .num_columns(2)
        .spacing([40.0, 8.0])
        .show(ui, |ui| {
            ui.label("Task");
            egui::ComboBox::from_id_source("boosting_task")
                .selected_text(f.task.as_str())
                .show_ui(ui, |ui| {
                    for task in BoostingTask::ALL {
                        changed |= ui.selectable_value(&mut f.task, task, task.as_str()).changed();
                    }
                });
            ui.end_row();
            ui.label("Number of estimators");
            changed |= ui.add(egui::DragValue::new(&mut f.n_estimators).speed(10)).changed();
            ui.end_row();
            ui.label("Learning rate");
            changed |= ui.add(egui::DragValue::new(&mut f.learning_rate).speed(0.01)).changed();
            ui.end_row();
            ui.label("Maximum depth");
            changed |= ui.add(egui::DragValue::new(&mut f.max_depth)).changed();
            ui.end_row();
            ui.label("Test size");
            changed |= ui.add(egui::DragValue::new(&mut f.test_size).speed(0.01)).changed();
            ui.end_row();
        });
    changed
}

fn spatial_variables(ui: &mut egui::Ui, f: &mut SpatialFields, dataset: &Dataset) -> bool {
    let numeric = dataset.numeric_columns();
    let mut changed = false;
    egui::Grid::new("spatial_variables")
        .num_columns(2)
        .spacing([40.0, 8.0])
        .show(ui, |ui| {
            ui.label("Dependent variable");
            changed |= column_combo(ui, "spatial_dependent", &mut f.dependent_col, &numeric);
            ui.end_row();
            ui.label("Latitude");
            changed |= column_combo(ui, "spatial_lat", &mut f.lat_col, &numeric);
            ui.end_row();
            ui.label("Longitude");
            changed |= column_combo(ui, "spatial_lon", &mut f.lon_col, &numeric);
            ui.end_row();
        });

    let taken = [&f.dependent_col, &f.lat_col, &f.lon_col];
    let candidates: Vec<String> = numeric
        .iter()
        .filter(|c| !taken.iter().any(|t| t.as_deref() == Some(c.as_str())))
        .cloned()
        .collect();
    ui.add_space(4.0);
    ui.label("Independent variables:");
    changed |= column_checklist(ui, &mut f.independent_cols, &candidates);
    changed
}

fn spatial_settings(ui: &mut egui::Ui, f: &mut SpatialFields) -> bool {
    let mut changed = false;
    egui::Grid::new("spatial_settings")
        .num_columns(2)
        .spacing([40.0, 8.0])
        .show(ui, |ui| {
            ui.label("Model");
            egui::ComboBox::from_id_source("spatial_model")
                .selected_text(f.model.label())
                .show_ui(ui, |ui| {
                    for model in SpatialModel::ALL {
                        changed |= ui.selectable_value(&mut f.model, model, model.label()).changed();
                    }
                });
            ui.end_row();
            ui.label("Nearest neighbors (k)");
            changed |= ui.add(egui::DragValue::new(&mut f.k_neighbors)).changed();
            ui.end_row();
        });
    changed
}
