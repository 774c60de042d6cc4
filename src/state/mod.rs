// src/state/mod.rs
use anyhow::Result;
use chrono::NaiveDate;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::analysis::AnalysisKind;
use crate::config::Settings;
use crate::content::SourceFetcher;
use crate::dataset::{sample, Dataset};
use crate::export::{self, DocumentExporter, ExportArtifact, HttpDocumentExporter, ReportCapture};
use crate::file::{self, DatasetFileHandler, FileHandler, Preset, PresetFileHandler};
use crate::gateway::{AnalysisGateway, HttpGateway};
use crate::wizard::RunApplied;

pub mod notification;
pub mod page;
pub mod tasks;

pub use notification::{Level, Notifications};
pub use page::AnalysisPage;
pub use tasks::{TaskOutcome, TaskRunner};

pub const SAMPLE_ROWS: usize = 200;

// Screen/tab tracking
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Screen {
    Data,
    Analysis(AnalysisKind),
}

/// Python source shown in the viewer window.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceView {
    pub kind: AnalysisKind,
    pub text: Option<String>,
}

/// Services the state talks to; swapped for stubs in tests.
pub struct Services {
    pub gateway: Arc<dyn AnalysisGateway>,
    pub documents: Arc<dyn DocumentExporter>,
    pub sources: Option<Arc<SourceFetcher>>,
}

impl Services {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Ok(Self {
            gateway: Arc::new(HttpGateway::from_settings(settings)?),
            documents: Arc::new(HttpDocumentExporter::from_settings(settings)?),
            sources: Some(Arc::new(SourceFetcher::from_settings(settings)?)),
        })
    }
}

// Core application state
pub struct AppState {
    pub settings: Settings,
    pub dataset: Option<Arc<Dataset>>,
    pub pages: Vec<AnalysisPage>,
    pub current_screen: Screen,

    pub notifications: Notifications,
    pub error_message: Option<String>,
    pub source_view: Option<SourceView>,
    /// Finished export waiting for the user to pick a location.
    pub pending_save: Option<ExportArtifact>,

    pub tasks: TaskRunner,
    services: Services,
    dataset_handler: DatasetFileHandler,
    preset_handler: PresetFileHandler,
}

impl AppState {
    pub fn new(settings: Settings) -> Result<Self> {
        let services = Services::from_settings(&settings)?;
        Ok(Self::with_services(settings, services))
    }

    pub fn with_services(settings: Settings, services: Services) -> Self {
        Self {
            settings,
            dataset: None,
            pages: AnalysisKind::ALL.iter().map(|&k| AnalysisPage::new(k)).collect(),
            current_screen: Screen::Data,
            notifications: Notifications::default(),
            error_message: None,
            source_view: None,
            pending_save: None,
            tasks: TaskRunner::new(),
            services,
            dataset_handler: DatasetFileHandler::new(),
            preset_handler: PresetFileHandler::new(),
        }
    }

    pub fn page(&self, kind: AnalysisKind) -> Option<&AnalysisPage> {
        self.pages.iter().find(|p| p.kind == kind)
    }

    pub fn page_mut(&mut self, kind: AnalysisKind) -> Option<&mut AnalysisPage> {
        self.pages.iter_mut().find(|p| p.kind == kind)
    }

    pub fn set_dataset(&mut self, dataset: Dataset) {
        info!(name = %dataset.name, rows = dataset.row_count(), columns = dataset.columns.len(), "dataset ready");
        let dataset = Arc::new(dataset);
        for page in &mut self.pages {
            page.sync(&dataset);
        }
        self.dataset = Some(dataset);
    }

    /// Parse failures are blocking and go to the error modal.
    pub fn load_dataset(&mut self, path: &Path) {
        match self.dataset_handler.load(path) {
            Ok(dataset) => {
                self.notifications.success(format!("Loaded {} rows from {}", dataset.row_count(), dataset.name));
                self.set_dataset(dataset);
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "dataset load failed");
                self.error_message = Some(format!("Error loading dataset: {:#}", e));
            }
        }
    }

    pub fn load_sample(&mut self, seed: u64) {
        self.set_dataset(sample::generate(SAMPLE_ROWS, seed));
        self.notifications.info("Loaded sample data");
    }

    /// The page's Next button. At Validation this is the run transition and
    /// the request goes to a background thread; returns whether a run started.
    pub fn advance(&mut self, kind: AnalysisKind) -> bool {
        let gateway = Arc::clone(&self.services.gateway);
        let Some(wizard) = self.page_mut(kind).and_then(|p| p.wizard.as_mut()) else {
            return false;
        };
        match wizard.next() {
            Some(ticket) => {
                self.tasks.spawn_run(gateway, ticket);
                true
            }
            None => false,
        }
    }

    pub fn poll_tasks(&mut self) {
        for outcome in self.tasks.poll() {
            self.apply_outcome(outcome);
        }
    }

    pub fn apply_outcome(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Run { kind, generation, outcome } => {
                let applied = self.page_mut(kind)
                    .and_then(|p| p.wizard.as_mut())
                    .map(|w| w.finish_run(generation, outcome));
                match applied {
                    Some(RunApplied::Succeeded) => self.notifications.success(format!("{} finished", kind.title())),
                    Some(RunApplied::Failed(err)) => self.notifications.error(err.message()),
                    Some(RunApplied::Stale) | None => {}
                }
            }
            TaskOutcome::Document { kind, outcome } => {
                if let Some(page) = self.page_mut(kind) {
                    page.document_pending = false;
                }
                match outcome {
                    Ok(artifact) => self.pending_save = Some(artifact),
                    Err(e) => self.notifications.error(e.to_string()),
                }
            }
            TaskOutcome::Source { kind, outcome } => match outcome {
                Ok(text) => {
                    if self.source_view.as_ref().map_or(false, |v| v.kind == kind) {
                        self.source_view = Some(SourceView { kind, text: Some(text) });
                    }
                }
                Err(e) => {
                    self.source_view = None;
                    self.notifications.error(e.to_string());
                }
            },
        }
    }

    fn finished(&self, kind: AnalysisKind) -> Option<(&crate::analysis::AnalysisFields, &crate::analysis::AnalysisResult)> {
        let wizard = self.page(kind)?.wizard.as_ref()?;
        Some((wizard.fields(), wizard.result()?))
    }

    fn queue_export(&mut self, outcome: Result<ExportArtifact, export::ExportError>) {
        match outcome {
            Ok(artifact) => self.pending_save = Some(artifact),
            Err(e) => {
                warn!(error = %e, "export failed");
                self.notifications.error(e.to_string());
            }
        }
    }

    pub fn export_csv(&mut self, kind: AnalysisKind, date: NaiveDate) {
        let outcome = match self.finished(kind) {
            Some((_, result)) => export::csv_export(result, date),
            None => Err(export::ExportError::NoResult),
        };
        self.queue_export(outcome);
    }

    pub fn export_clusters(&mut self, kind: AnalysisKind, date: NaiveDate) {
        let outcome = match self.finished(kind) {
            Some((_, result)) => export::clusters_export(result, date),
            None => Err(export::ExportError::NoResult),
        };
        self.queue_export(outcome);
    }

    pub fn export_png(&mut self, kind: AnalysisKind, capture: &ReportCapture, date: NaiveDate) {
        let outcome = match self.finished(kind) {
            Some(_) => export::png_export(kind, capture, date),
            None => Err(export::ExportError::NoResult),
        };
        self.queue_export(outcome);
    }

    pub fn request_document(&mut self, kind: AnalysisKind, date: NaiveDate) {
        let Some((fields, result)) = self.finished(kind).map(|(f, r)| (f.clone(), r.clone())) else {
            self.notifications.error(export::ExportError::NoResult.to_string());
            return;
        };
        let exporter = Arc::clone(&self.services.documents);
        self.tasks.spawn_document(exporter, fields, result, date);
        if let Some(page) = self.page_mut(kind) {
            page.document_pending = true;
        }
    }

    pub fn save_artifact(&mut self, artifact: &ExportArtifact, path: &Path) {
        match file::write_artifact(artifact, path) {
            Ok(()) => self.notifications.success(format!("Saved {}", path.display())),
            Err(e) => self.notifications.error(format!("{:#}", e)),
        }
    }

    pub fn save_preset(&mut self, kind: AnalysisKind, path: &Path) {
        let Some(fields) = self.page(kind).and_then(|p| p.wizard.as_ref()).map(|w| w.fields().clone()) else {
            return;
        };
        match self.preset_handler.save(&Preset::new(fields), path) {
            Ok(()) => self.notifications.success("Settings saved"),
            Err(e) => self.notifications.error(format!("{:#}", e)),
        }
    }

    pub fn load_preset(&mut self, kind: AnalysisKind, path: &Path) {
        match self.preset_handler.load_for(kind, path) {
            Ok(fields) => {
                if let Some(wizard) = self.page_mut(kind).and_then(|p| p.wizard.as_mut()) {
                    wizard.set_fields(fields);
                    self.notifications.success("Settings loaded");
                }
            }
            Err(e) => self.notifications.error(format!("{:#}", e)),
        }
    }

    pub fn open_source(&mut self, kind: AnalysisKind) {
        let Some(fetcher) = self.services.sources.clone() else {
            self.notifications.error("No source location is configured");
            return;
        };
        self.source_view = Some(SourceView { kind, text: None });
        self.tasks.spawn_source(fetcher, kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisFields, AnalysisResult};
    use crate::export::ExportError;
    use crate::gateway::{AnalysisRequest, GatewayError};
    use crate::wizard::Step;
    use serde_json::{json, Value};
    use std::time::Duration;

    struct FixedGateway(Result<Value, GatewayError>);

    impl AnalysisGateway for FixedGateway {
        fn run(&self, _request: &AnalysisRequest) -> Result<Value, GatewayError> {
            self.0.clone()
        }
    }

    struct FailingDocuments;

    impl DocumentExporter for FailingDocuments {
        fn export(&self, _fields: &AnalysisFields, _result: &AnalysisResult) -> Result<Vec<u8>, ExportError> {
            Err(ExportError::Request("export service offline".into()))
        }
    }

    fn state_with(gateway: FixedGateway) -> AppState {
        let services = Services {
            gateway: Arc::new(gateway),
            documents: Arc::new(FailingDocuments),
            sources: None,
        };
        let mut state = AppState::with_services(Settings::default(), services);
        state.set_dataset(sample::generate(40, 3));
        state
    }

    fn walk_to_validation(state: &mut AppState, kind: AnalysisKind) {
        let wizard = state.page_mut(kind).and_then(|p| p.wizard.as_mut()).unwrap();
        wizard.next();
        wizard.next();
    }

    fn drain(state: &mut AppState) {
        let outcome = state.tasks.wait(Duration::from_secs(5)).unwrap();
        state.apply_outcome(outcome);
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
    }

    #[test]
    fn background_run_lands_on_summary() {
        let labels: Vec<i64> = (0..40).map(|i| i % 2).collect();
        let mut state = state_with(FixedGateway(Ok(json!({ "labels": labels, "n_clusters": 2 }))));
        walk_to_validation(&mut state, AnalysisKind::Dbscan);

        assert!(state.advance(AnalysisKind::Dbscan));
        drain(&mut state);

        let wizard = state.page(AnalysisKind::Dbscan).and_then(|p| p.wizard.as_ref()).unwrap();
        assert_eq!(wizard.current_step(), Step::Summary);
        assert!(state.notifications.last().unwrap().message.contains("finished"));

        state.export_clusters(AnalysisKind::Dbscan, date());
        let artifact = state.pending_save.take().unwrap();
        assert_eq!(artifact.file_name, "DBSCAN_Clusters_2024-02-29.csv");
    }

    #[test]
    fn failed_run_becomes_notification() {
        let err = GatewayError::Request { status: Some(500), message: "bad input".into() };
        let mut state = state_with(FixedGateway(Err(err)));
        walk_to_validation(&mut state, AnalysisKind::Dbscan);
        state.advance(AnalysisKind::Dbscan);
        drain(&mut state);

        let note = state.notifications.last().unwrap();
        assert_eq!(note.level, Level::Error);
        assert_eq!(note.message, "bad input");
        let wizard = state.page(AnalysisKind::Dbscan).and_then(|p| p.wizard.as_ref()).unwrap();
        assert_eq!(wizard.current_step(), Step::Validation);
        assert!(!wizard.is_busy());
    }

    #[test]
    fn run_started_before_reload_is_dropped() {
        let labels = vec![0; 40];
        let mut state = state_with(FixedGateway(Ok(json!({ "labels": labels, "n_clusters": 1 }))));
        walk_to_validation(&mut state, AnalysisKind::Dbscan);
        state.advance(AnalysisKind::Dbscan);
        state.set_dataset(sample::generate(40, 4));
        drain(&mut state);

        let wizard = state.page(AnalysisKind::Dbscan).and_then(|p| p.wizard.as_ref()).unwrap();
        assert!(wizard.result().is_none());
        assert_eq!(wizard.current_step(), Step::Variables);
    }

    #[test]
    fn export_without_result_is_notified() {
        let mut state = state_with(FixedGateway(Ok(json!({}))));
        state.export_csv(AnalysisKind::KMeans, date());
        assert!(state.pending_save.is_none());
        assert_eq!(state.notifications.last().unwrap().message, "There is no result to export yet");
    }

    #[test]
    fn document_failure_is_non_fatal() {
        let labels = vec![0; 40];
        let mut state = state_with(FixedGateway(Ok(json!({ "labels": labels, "n_clusters": 1 }))));
        walk_to_validation(&mut state, AnalysisKind::Dbscan);
        state.advance(AnalysisKind::Dbscan);
        drain(&mut state);

        state.request_document(AnalysisKind::Dbscan, date());
        assert!(state.page(AnalysisKind::Dbscan).unwrap().document_pending);
        drain(&mut state);
        assert!(!state.page(AnalysisKind::Dbscan).unwrap().document_pending);
        assert_eq!(state.notifications.last().unwrap().message, "Document export failed: export service offline");
        let wizard = state.page(AnalysisKind::Dbscan).and_then(|p| p.wizard.as_ref()).unwrap();
        assert_eq!(wizard.current_step(), Step::Summary);
    }

    #[test]
    fn bad_csv_goes_to_error_modal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.csv");
        std::fs::write(&path, "a,b\n1\n").unwrap();
        let mut state = state_with(FixedGateway(Ok(json!({}))));
        state.load_dataset(&path);
        assert!(state.error_message.as_deref().unwrap_or_default().starts_with("Error loading dataset"));
        assert_eq!(state.dataset.as_ref().map(|d| d.row_count()), Some(40));
    }
}
