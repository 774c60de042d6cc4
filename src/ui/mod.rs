// src/ui/mod.rs
use eframe::egui;

pub mod data;
pub mod fields;
pub mod glossary;
pub mod page;
pub mod report;
pub mod source;

/// Requests from a page that need the app (dialogs, background work).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageAction {
    Next,
    ExportCsv,
    ExportClusters,
    ExportPng,
    ExportDocument,
    SavePreset,
    LoadPreset,
    ShowSource,
}

/// Single column picker. Returns true when the selection changed.
pub(crate) fn column_combo(
    ui: &mut egui::Ui,
    id: &str,
    selected: &mut Option<String>,
    options: &[String],
) -> bool {
    let mut changed = false;
    egui::ComboBox::from_id_source(id)
        .selected_text(selected.as_deref().unwrap_or("Select..."))
        .width(180.0)
        .show_ui(ui, |ui| {
            for option in options {
                changed |= ui
                    .selectable_value(selected, Some(option.clone()), option)
                    .changed();
            }
        });
    changed
}

/// Multi column picker, keeps the order columns were ticked in.
pub(crate) fn column_checklist(ui: &mut egui::Ui, selected: &mut Vec<String>, options: &[String]) -> bool {
    let mut changed = false;
    for option in options {
        let mut on = selected.contains(option);
        if ui.checkbox(&mut on, option).changed() {
            if on {
                selected.push(option.clone());
            } else {
                selected.retain(|c| c != option);
            }
            changed = true;
        }
    }
    changed
}
