// src/ui/glossary.rs
use eframe::egui;

use crate::content::{lookup, terms};
use crate::state::AnalysisPage;

pub fn show_glossary_panel(ui: &mut egui::Ui, page: &mut AnalysisPage) {
    egui::SidePanel::right(egui::Id::new(("glossary", page.kind.slug())))
        .resizable(true)
        .default_width(260.0)
        .show_inside(ui, |ui| {
            ui.heading("Glossary");
            ui.add(egui::TextEdit::singleline(&mut page.glossary_filter).hint_text("Search terms"));
            ui.add_space(4.0);

            let filter = page.glossary_filter.trim().to_lowercase();
            let matching: Vec<&'static str> = terms(page.kind)
                .into_iter()
                .filter(|t| filter.is_empty() || t.to_lowercase().contains(&filter))
                .collect();

            egui::ScrollArea::vertical()
                .id_source("glossary_scroll")
                .show(ui, |ui| {
                    if matching.is_empty() {
                        ui.weak("No matching terms");
                    }
                    for term in matching {
                        let selected = page.selected_term == Some(term);
                        if ui.selectable_label(selected, term).clicked() {
                            page.selected_term = if selected { None } else { Some(term) };
                        }
                        if page.selected_term == Some(term) {
                            if let Some(definition) = lookup(page.kind, term) {
                                ui.indent(term, |ui| {
                                    ui.label(egui::RichText::new(definition).weak());
                                });
                            }
                        }
                    }
                });
        });
}
