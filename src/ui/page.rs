// src/ui/page.rs
use eframe::egui;

use super::{fields, glossary, report, PageAction};
use crate::content::guide;
use crate::state::AnalysisPage;
use crate::wizard::{Step, ValidationReport, Wizard};

pub fn show_analysis_page(ui: &mut egui::Ui, page: &mut AnalysisPage) -> Option<PageAction> {
    let mut action = None;

    glossary::show_glossary_panel(ui, page);

    ui.horizontal(|ui| {
        ui.heading(page.kind.title());
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("</> View Source").clicked() {
                action = Some(PageAction::ShowSource);
            }
        });
    });
    ui.separator();

    let AnalysisPage {
        kind,
        wizard,
        incompatible,
        report_region,
        document_pending,
        ..
    } = page;

    let Some(wizard) = wizard.as_mut() else {
        ui.centered_and_justified(|ui| {
            ui.label(incompatible.as_deref().unwrap_or("Load a dataset on the Data tab to begin"));
        });
        return action;
    };

    show_step_bar(ui, wizard);
    ui.add_space(4.0);
    let step = wizard.current_step();
    ui.label(egui::RichText::new(guide(*kind, step)).italics());
    ui.separator();

    // Navigation stays pinned to the bottom, the step body scrolls above it.
    egui::TopBottomPanel::bottom(egui::Id::new(("wizard_nav", kind.slug())))
        .show_inside(ui, |ui| {
            ui.add_space(4.0);
            if let Some(a) = show_navigation(ui, wizard) {
                action = Some(a);
            }
            ui.add_space(4.0);
        });

    egui::ScrollArea::vertical()
        .id_source(("step_body", kind.slug()))
        .show(ui, |ui| {
            let body_action = match step {
                Step::Variables => {
                    fields::show_variables(ui, wizard);
                    None
                }
                Step::Settings => {
                    fields::show_settings(ui, wizard);
                    ui.add_space(12.0);
                    show_preset_buttons(ui)
                }
                Step::Validation => {
                    show_validation(ui, wizard);
                    None
                }
                Step::Summary | Step::Reasoning | Step::Statistics => {
                    report::show_report(ui, step, wizard, report_region, *document_pending)
                }
            };
            if body_action.is_some() {
                action = body_action;
            }
        });

    action
}

fn show_step_bar(ui: &mut egui::Ui, wizard: &mut Wizard) {
    ui.horizontal(|ui| {
        for step in Step::ALL {
            let enabled = wizard.is_navigable(step) && !wizard.is_busy();
            let label = format!("{}. {}", step.number(), step.label());
            let selected = wizard.current_step() == step;
            if ui.add_enabled(enabled, egui::SelectableLabel::new(selected, label)).clicked() {
                wizard.go_to_step(step.number());
            }
            if step != Step::Statistics {
                ui.label("›");
            }
        }
    });
}

fn show_navigation(ui: &mut egui::Ui, wizard: &mut Wizard) -> Option<PageAction> {
    let mut action = None;
    let step = wizard.current_step();
    let busy = wizard.is_busy();

    ui.horizontal(|ui| {
        if ui.add_enabled(step.prev().is_some() && !busy, egui::Button::new("◀ Back")).clicked() {
            wizard.prev();
        }

        let (label, allowed) = match step {
            Step::Validation => ("Run Analysis ▶", wizard.report().all_passed()),
            _ => ("Next ▶", step.next().is_some()),
        };
        if ui.add_enabled(allowed && !busy, egui::Button::new(label)).clicked() {
            action = Some(PageAction::Next);
        }

        if busy {
            ui.spinner();
            ui.label("Running analysis...");
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Start Over").clicked() {
                wizard.reset();
            }
        });
    });
    action
}

fn show_preset_buttons(ui: &mut egui::Ui) -> Option<PageAction> {
    let mut action = None;
    ui.horizontal(|ui| {
        if ui.button("💾 Save Settings...").clicked() {
            action = Some(PageAction::SavePreset);
        }
        if ui.button("Load Settings...").clicked() {
            action = Some(PageAction::LoadPreset);
        }
    });
    action
}

fn show_validation(ui: &mut egui::Ui, wizard: &Wizard) {
    show_checks(ui, wizard.report());

    if let Some(err) = wizard.last_error() {
        ui.add_space(8.0);
        ui.group(|ui| {
            ui.colored_label(egui::Color32::from_rgb(200, 100, 100), "The last run failed");
            ui.label(err.message());
        });
    }
}

fn show_checks(ui: &mut egui::Ui, report: &ValidationReport) {
    let pass = egui::Color32::from_rgb(100, 200, 100);
    let fail = egui::Color32::from_rgb(200, 100, 100);
    let advisory = egui::Color32::from_rgb(220, 170, 60);

    egui::Grid::new("validation_checks")
        .num_columns(3)
        .spacing([16.0, 6.0])
        .striped(true)
        .show(ui, |ui| {
            for check in &report.checks {
                let (mark, color) = match (check.passed, check.gating) {
                    (true, _) => ("✔", pass),
                    (false, true) => ("✖", fail),
                    (false, false) => ("⚠", advisory),
                };
                ui.colored_label(color, mark);
                ui.label(&check.label);
                ui.weak(&check.detail);
                ui.end_row();
            }
        });

    ui.add_space(8.0);
    if report.all_passed() {
        ui.colored_label(pass, "All required checks passed. Run the analysis when ready.");
    } else {
        let failed = report.failures().filter(|c| c.gating).count();
        ui.colored_label(fail, format!("{} required check(s) failed. Go back and adjust the inputs.", failed));
    }
}
