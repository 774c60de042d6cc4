// src/ui/source.rs
use eframe::egui;

use crate::state::SourceView;

/// Source viewer window. Returns true when the user asked to save the file.
pub fn show_source_window(ctx: &egui::Context, view: &mut Option<SourceView>) -> bool {
    let Some(current) = view.as_ref() else {
        return false;
    };
    let mut open = true;
    let mut save = false;

    egui::Window::new(format!("Source: {}", current.kind.source_file()))
        .open(&mut open)
        .default_size([640.0, 480.0])
        .show(ctx, |ui| match &current.text {
            None => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Fetching source...");
                });
            }
            Some(text) => {
                ui.horizontal(|ui| {
                    ui.weak("Reference implementation run by the analysis service");
                    if ui.button("Save As...").clicked() {
                        save = true;
                    }
                });
                ui.separator();
                egui::ScrollArea::both()
                    .id_source("source_scroll")
                    .show(ui, |ui| {
                        ui.add(egui::Label::new(egui::RichText::new(text).monospace()).wrap(false));
                    });
            }
        });

    if !open {
        *view = None;
    }
    save
}
