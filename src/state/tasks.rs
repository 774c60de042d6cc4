// src/state/tasks.rs
//
// Background work for the UI thread. Each task runs on its own thread and
// reports back over one channel that the app drains every frame.
use chrono::NaiveDate;
use serde_json::Value;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::debug;

use crate::analysis::{AnalysisFields, AnalysisKind, AnalysisResult};
use crate::content::{SourceError, SourceFetcher};
use crate::export::{self, DocumentExporter, ExportArtifact, ExportError};
use crate::gateway::{AnalysisGateway, GatewayError};
use crate::wizard::RunTicket;

#[derive(Debug)]
pub enum TaskOutcome {
    Run {
        kind: AnalysisKind,
        generation: u64,
        outcome: Result<Value, GatewayError>,
    },
    Document {
        kind: AnalysisKind,
        outcome: Result<ExportArtifact, ExportError>,
    },
    Source {
        kind: AnalysisKind,
        outcome: Result<String, SourceError>,
    },
}

pub struct TaskRunner {
    tx: Sender<TaskOutcome>,
    rx: Receiver<TaskOutcome>,
    pending: usize,
}

impl Default for TaskRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRunner {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx, pending: 0 }
    }

    fn spawn<F>(&mut self, work: F)
    where
        F: FnOnce() -> TaskOutcome + Send + 'static,
    {
        let tx = self.tx.clone();
        self.pending += 1;
        thread::spawn(move || {
            // The app may have shut down; nothing to report to then.
            let _ = tx.send(work());
        });
    }

    pub fn spawn_run(&mut self, gateway: Arc<dyn AnalysisGateway>, ticket: RunTicket) {
        debug!(kind = ?ticket.request.kind, generation = ticket.generation, "spawning analysis run");
        self.spawn(move || TaskOutcome::Run {
            kind: ticket.request.kind,
            generation: ticket.generation,
            outcome: gateway.run(&ticket.request),
        });
    }

    pub fn spawn_document(
        &mut self,
        exporter: Arc<dyn DocumentExporter>,
        fields: AnalysisFields,
        result: AnalysisResult,
        date: NaiveDate,
    ) {
        let kind = fields.kind();
        self.spawn(move || TaskOutcome::Document {
            kind,
            outcome: export::docx_export(exporter.as_ref(), &fields, &result, date),
        });
    }

    pub fn spawn_source(&mut self, fetcher: Arc<SourceFetcher>, kind: AnalysisKind) {
        self.spawn(move || TaskOutcome::Source {
            kind,
            outcome: fetcher.fetch(kind),
        });
    }

    /// Everything finished since the last call, without blocking.
    pub fn poll(&mut self) -> Vec<TaskOutcome> {
        let done: Vec<TaskOutcome> = self.rx.try_iter().collect();
        self.pending = self.pending.saturating_sub(done.len());
        done
    }

    /// Blocks for the next outcome, up to `timeout`.
    pub fn wait(&mut self, timeout: Duration) -> Option<TaskOutcome> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => {
                self.pending = self.pending.saturating_sub(1);
                Some(outcome)
            }
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn pending(&self) -> usize {
        self.pending
    }
}
