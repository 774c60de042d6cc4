// src/state/page.rs
use std::sync::Arc;
use tracing::debug;

use crate::analysis::AnalysisKind;
use crate::dataset::Dataset;
use crate::export::CaptureRegion;
use crate::wizard::Wizard;

/// One analysis page. The wizard exists only while the loaded dataset is
/// compatible with the page's analysis.
#[derive(Debug)]
pub struct AnalysisPage {
    pub kind: AnalysisKind,
    pub wizard: Option<Wizard>,
    pub incompatible: Option<String>,
    pub glossary_filter: String,
    pub selected_term: Option<&'static str>,
    /// Where the report was drawn last frame, in points.
    pub report_region: Option<CaptureRegion>,
    pub awaiting_screenshot: bool,
    pub document_pending: bool,
}

impl AnalysisPage {
    pub fn new(kind: AnalysisKind) -> Self {
        Self {
            kind,
            wizard: None,
            incompatible: None,
            glossary_filter: String::new(),
            selected_term: None,
            report_region: None,
            awaiting_screenshot: false,
            document_pending: false,
        }
    }

    /// Brings the page in line with the loaded dataset.
    pub fn sync(&mut self, dataset: &Arc<Dataset>) {
        match self.kind.check_compatible(dataset) {
            Ok(()) => {
                self.incompatible = None;
                match &mut self.wizard {
                    Some(wizard) => {
                        wizard.sync_dataset(dataset);
                    }
                    None => {
                        debug!(kind = ?self.kind, "opening wizard");
                        self.wizard = Some(Wizard::new(self.kind, Arc::clone(dataset)));
                    }
                }
            }
            Err(reason) => {
                debug!(kind = ?self.kind, %reason, "dataset incompatible");
                self.wizard = None;
                self.incompatible = Some(reason);
            }
        }
        self.report_region = None;
        self.awaiting_screenshot = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{sample, test_dataset, Cell};
    use crate::wizard::{RunApplied, Step};

    #[test]
    fn compatible_dataset_opens_wizard() {
        let mut page = AnalysisPage::new(AnalysisKind::KMeans);
        page.sync(&Arc::new(sample::generate(30, 1)));
        assert!(page.wizard.is_some());
        assert!(page.incompatible.is_none());
    }

    #[test]
    fn incompatible_dataset_closes_wizard() {
        let mut page = AnalysisPage::new(AnalysisKind::SpatialAutoregressive);
        page.sync(&Arc::new(sample::generate(30, 1)));
        assert!(page.wizard.is_some());

        let narrow = test_dataset(&["a"], vec![vec![Cell::Number(1.0)]]);
        page.sync(&Arc::new(narrow));
        assert!(page.wizard.is_none());
        assert!(page.incompatible.as_deref().unwrap_or_default().contains("numeric columns"));
    }

    #[test]
    fn run_from_dropped_wizard_is_stale_after_rebuild() {
        let mut page = AnalysisPage::new(AnalysisKind::Dbscan);
        page.sync(&Arc::new(sample::generate(40, 1)));
        let wizard = page.wizard.as_mut().unwrap();
        wizard.next();
        wizard.next();
        let old_ticket = wizard.next().unwrap();

        let text_only = test_dataset(&["label"], vec![vec![Cell::Text("a".into())]]);
        page.sync(&Arc::new(text_only));
        assert!(page.wizard.is_none());

        page.sync(&Arc::new(sample::generate(40, 99)));
        let wizard = page.wizard.as_mut().unwrap();
        wizard.next();
        wizard.next();
        let fresh_ticket = wizard.next().unwrap();
        assert_ne!(old_ticket.generation, fresh_ticket.generation);

        let labels = vec![0; 40];
        let outcome = Ok(serde_json::json!({ "labels": labels, "n_clusters": 1 }));
        assert_eq!(wizard.finish_run(old_ticket.generation, outcome), RunApplied::Stale);
        assert!(wizard.is_busy());
        assert!(wizard.result().is_none());
        assert_eq!(wizard.current_step(), Step::Validation);
    }

    #[test]
    fn reloading_resets_progress() {
        let mut page = AnalysisPage::new(AnalysisKind::Dbscan);
        page.sync(&Arc::new(sample::generate(30, 1)));
        if let Some(wizard) = page.wizard.as_mut() {
            wizard.next();
            assert_eq!(wizard.current_step(), Step::Settings);
        }
        page.sync(&Arc::new(sample::generate(30, 2)));
        assert_eq!(page.wizard.as_ref().map(Wizard::current_step), Some(Step::Variables));
    }
}
