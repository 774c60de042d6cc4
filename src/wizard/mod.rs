// src/wizard/mod.rs
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::analysis::{AnalysisFields, AnalysisKind, AnalysisResult};
use crate::dataset::Dataset;
use crate::gateway::{AnalysisGateway, AnalysisRequest, GatewayError};

pub mod navigation;
pub mod step;
pub mod validation;

// Re-export commonly used types
pub use navigation::{update, Action, Effect, WizardState};
pub use step::Step;
pub use validation::{ValidationCheck, ValidationReport};

static RUN_GENERATION: AtomicU64 = AtomicU64::new(0);

/// Generations are unique across every wizard in the process, so a page
/// that rebuilds its wizard never reuses a number an in-flight run carries.
fn next_generation() -> u64 {
    RUN_GENERATION.fetch_add(1, Ordering::Relaxed) + 1
}

/// Emitted by `next()` at the Validation step. The generation ties the
/// eventual outcome back to the run that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct RunTicket {
    pub generation: u64,
    pub request: AnalysisRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunApplied {
    Succeeded,
    Failed(GatewayError),
    /// The outcome belonged to a superseded run and was dropped.
    Stale,
}

/// One analysis page: navigation state, field state and result, bound to
/// the dataset it was derived from.
#[derive(Debug, Clone)]
pub struct Wizard {
    kind: AnalysisKind,
    state: WizardState,
    fields: AnalysisFields,
    report: ValidationReport,
    dataset: Arc<Dataset>,
    signature: String,
    result: Option<AnalysisResult>,
    generation: u64,
    last_error: Option<GatewayError>,
}

impl Wizard {
    pub fn new(kind: AnalysisKind, dataset: Arc<Dataset>) -> Self {
        let fields = AnalysisFields::from_dataset(kind, &dataset);
        let report = fields.validate(&dataset);
        Self {
            kind,
            state: WizardState::default(),
            fields,
            report,
            signature: dataset.column_signature(),
            dataset,
            result: None,
            generation: next_generation(),
            last_error: None,
        }
    }

    pub fn kind(&self) -> AnalysisKind {
        self.kind
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn current_step(&self) -> Step {
        self.state.current_step
    }

    pub fn fields(&self) -> &AnalysisFields {
        &self.fields
    }

    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn dataset(&self) -> &Arc<Dataset> {
        &self.dataset
    }

    pub fn result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn last_error(&self) -> Option<&GatewayError> {
        self.last_error.as_ref()
    }

    pub fn is_busy(&self) -> bool {
        self.state.busy
    }

    pub fn is_navigable(&self, step: Step) -> bool {
        self.state.is_navigable(step)
    }

    fn dispatch(&mut self, action: Action) -> Effect {
        let (next, effect) = update(self.state, action);
        if next != self.state {
            debug!(kind = ?self.kind, ?action, from = self.state.current_step.number(), to = next.current_step.number(), "wizard transition");
        }
        self.state = next;
        effect
    }

    /// Replaces the field state and recomputes validation. Fields of
    /// another kind are refused.
    pub fn set_fields(&mut self, fields: AnalysisFields) -> bool {
        if fields.kind() != self.kind {
            warn!(expected = ?self.kind, got = ?fields.kind(), "refusing fields of another analysis kind");
            return false;
        }
        self.report = fields.validate(&self.dataset);
        self.fields = fields;
        true
    }

    /// Jumps to step `n` when it is navigable. Out-of-range numbers are
    /// refused, as is any jump while a run is in flight.
    pub fn go_to_step(&mut self, n: u8) -> bool {
        let Some(step) = Step::from_number(n) else {
            return false;
        };
        self.dispatch(Action::GoTo(step));
        self.state.current_step == step && !self.state.busy
    }

    /// Advances one step. At Validation this is the run transition and
    /// yields a ticket the caller must execute.
    pub fn next(&mut self) -> Option<RunTicket> {
        let checks_passed = self.report.all_passed();
        match self.dispatch(Action::Next { checks_passed }) {
            Effect::StartRun => {
                self.generation = next_generation();
                self.last_error = None;
                info!(kind = ?self.kind, generation = self.generation, rows = self.dataset.row_count(), "starting analysis run");
                Some(RunTicket {
                    generation: self.generation,
                    request: AnalysisRequest::new(&self.fields, &self.dataset),
                })
            }
            Effect::None => None,
        }
    }

    pub fn prev(&mut self) {
        self.dispatch(Action::Prev);
    }

    /// Applies a run outcome if it belongs to the current run.
    pub fn finish_run(&mut self, generation: u64, outcome: Result<Value, GatewayError>) -> RunApplied {
        if generation != self.generation || !self.state.busy {
            warn!(kind = ?self.kind, generation, current = self.generation, "discarding stale analysis outcome");
            return RunApplied::Stale;
        }

        let decoded = outcome.and_then(|value| AnalysisResult::from_response(&self.fields, &self.dataset, value));
        match decoded {
            Ok(result) => {
                info!(kind = ?self.kind, generation, "analysis run succeeded");
                self.result = Some(result);
                self.last_error = None;
                self.dispatch(Action::RunSucceeded);
                RunApplied::Succeeded
            }
            Err(err) => {
                warn!(kind = ?self.kind, generation, error = %err, "analysis run failed");
                self.last_error = Some(err.clone());
                self.dispatch(Action::RunFailed);
                RunApplied::Failed(err)
            }
        }
    }

    /// `next()` followed by a synchronous gateway call. `None` when the
    /// run transition was refused.
    pub fn run_with(&mut self, gateway: &dyn AnalysisGateway) -> Option<RunApplied> {
        let ticket = self.next()?;
        let outcome = gateway.run(&ticket.request);
        Some(self.finish_run(ticket.generation, outcome))
    }

    /// Back to step 1 with fields re-derived from the current dataset.
    /// Any in-flight run becomes stale.
    pub fn reset(&mut self) {
        self.dispatch(Action::Reset);
        self.generation = next_generation();
        self.result = None;
        self.last_error = None;
        self.fields = AnalysisFields::from_dataset(self.kind, &self.dataset);
        self.report = self.fields.validate(&self.dataset);
    }

    pub fn reset_with(&mut self, dataset: Arc<Dataset>) {
        self.signature = dataset.column_signature();
        self.dataset = dataset;
        self.reset();
    }

    /// Resets when the dataset was reloaded or its columns changed.
    /// Returns whether a reset happened.
    pub fn sync_dataset(&mut self, dataset: &Arc<Dataset>) -> bool {
        if dataset.id == self.dataset.id && dataset.column_signature() == self.signature {
            return false;
        }
        debug!(kind = ?self.kind, dataset = %dataset.name, "dataset changed, resetting wizard");
        self.reset_with(Arc::clone(dataset));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{DbscanFields, KMeansFields, RddFields};
    use crate::dataset::sample;
    use crate::gateway::interpret_response;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StubGateway {
        status: u16,
        body: String,
        calls: AtomicUsize,
    }

    impl StubGateway {
        fn new(status: u16, body: Value) -> Self {
            Self { status, body: body.to_string(), calls: AtomicUsize::new(0) }
        }
    }

    impl AnalysisGateway for StubGateway {
        fn run(&self, _request: &AnalysisRequest) -> Result<Value, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            interpret_response(self.status, &self.body)
        }
    }

    fn dbscan_response(rows: usize) -> Value {
        json!({ "labels": vec![0; rows], "n_clusters": 1, "n_noise": 0 })
    }

    fn dbscan_wizard(rows: usize) -> Wizard {
        Wizard::new(AnalysisKind::Dbscan, Arc::new(sample::generate(rows, 11)))
    }

    fn walk_to_validation(wizard: &mut Wizard) {
        assert_eq!(wizard.next(), None);
        assert_eq!(wizard.next(), None);
        assert_eq!(wizard.current_step(), Step::Validation);
    }

    #[test]
    fn scenario_a_fresh_wizard_without_fields_cannot_run() {
        let mut wizard = Wizard::new(AnalysisKind::RegressionDiscontinuity, Arc::new(sample::generate(25, 2)));
        assert!(wizard.set_fields(AnalysisFields::RegressionDiscontinuity(RddFields::default())));
        assert_eq!(wizard.current_step(), Step::Variables);
        assert!(!wizard.report().all_passed());

        walk_to_validation(&mut wizard);
        assert_eq!(wizard.next(), None);
        assert_eq!(wizard.current_step(), Step::Validation);
        assert!(!wizard.is_busy());
    }

    #[test]
    fn scenario_b_valid_run_moves_to_summary() {
        let mut wizard = dbscan_wizard(25);
        assert!(wizard.report().all_passed());
        walk_to_validation(&mut wizard);

        let gateway = StubGateway::new(200, dbscan_response(25));
        assert_eq!(wizard.run_with(&gateway), Some(RunApplied::Succeeded));
        assert_eq!(wizard.current_step(), Step::Summary);
        assert_eq!(wizard.state().max_reached_step, Step::Summary);
        assert!(!wizard.is_busy());
        let annotated = wizard.result().and_then(AnalysisResult::annotated_dataset).unwrap();
        assert_eq!(annotated.columns.last().map(String::as_str), Some("cluster"));
    }

    #[test]
    fn scenario_c_zero_clusters_reports_failure() {
        let mut wizard = Wizard::new(AnalysisKind::KMeans, Arc::new(sample::generate(60, 2)));
        let fields = KMeansFields { n_clusters: 0, ..KMeansFields::from_dataset(wizard.dataset()) };
        wizard.set_fields(AnalysisFields::KMeans(fields));
        let check = wizard.report().get("Samples per cluster").unwrap();
        assert!(!check.passed);
        assert!(!wizard.report().all_passed());
    }

    #[test]
    fn scenario_d_cannot_jump_ahead_without_result() {
        let mut wizard = dbscan_wizard(25);
        assert!(!wizard.go_to_step(6));
        assert_eq!(wizard.current_step(), Step::Variables);
        assert_eq!(wizard.state().max_reached_step, Step::Variables);
    }

    #[test]
    fn scenario_e_server_error_keeps_validation_step() {
        let mut wizard = dbscan_wizard(25);
        walk_to_validation(&mut wizard);

        let gateway = StubGateway::new(500, json!({ "detail": "bad input" }));
        let applied = wizard.run_with(&gateway).unwrap();
        let RunApplied::Failed(err) = applied else {
            panic!("expected failure, got {:?}", applied);
        };
        assert_eq!(err.message(), "bad input");
        assert_eq!(wizard.last_error().map(GatewayError::message), Some("bad input".to_string()));
        assert!(!wizard.is_busy());
        assert_eq!(wizard.current_step(), Step::Validation);
        assert!(wizard.result().is_none());
    }

    #[test]
    fn busy_wizard_refuses_second_run() {
        let mut wizard = dbscan_wizard(25);
        walk_to_validation(&mut wizard);
        let ticket = wizard.next().unwrap();
        assert!(wizard.is_busy());
        assert_eq!(wizard.next(), None);
        assert!(!wizard.go_to_step(1));
        wizard.prev();
        assert_eq!(wizard.current_step(), Step::Validation);

        let gateway = StubGateway::new(200, dbscan_response(25));
        assert_eq!(wizard.run_with(&gateway), None);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);

        assert_eq!(wizard.finish_run(ticket.generation, Ok(dbscan_response(25))), RunApplied::Succeeded);
    }

    #[test]
    fn outcome_after_reset_is_discarded() {
        let mut wizard = dbscan_wizard(25);
        walk_to_validation(&mut wizard);
        let ticket = wizard.next().unwrap();
        wizard.reset();

        assert_eq!(wizard.finish_run(ticket.generation, Ok(dbscan_response(25))), RunApplied::Stale);
        assert!(wizard.result().is_none());
        assert_eq!(wizard.current_step(), Step::Variables);
        assert!(!wizard.is_busy());
    }

    #[test]
    fn outcome_for_older_ticket_is_discarded() {
        let mut wizard = dbscan_wizard(25);
        walk_to_validation(&mut wizard);
        let first = wizard.next().unwrap();
        wizard.finish_run(first.generation, Err(GatewayError::Transport("timeout".into())));
        let second = wizard.next().unwrap();
        assert!(second.generation > first.generation);

        assert_eq!(wizard.finish_run(first.generation, Ok(dbscan_response(25))), RunApplied::Stale);
        assert!(wizard.is_busy());
        assert_eq!(wizard.finish_run(second.generation, Ok(dbscan_response(25))), RunApplied::Succeeded);
    }

    #[test]
    fn label_mismatch_fails_the_run() {
        let mut wizard = dbscan_wizard(25);
        walk_to_validation(&mut wizard);
        let ticket = wizard.next().unwrap();
        let applied = wizard.finish_run(ticket.generation, Ok(dbscan_response(3)));
        assert!(matches!(applied, RunApplied::Failed(GatewayError::Decode(_))));
        assert_eq!(wizard.current_step(), Step::Validation);
    }

    #[test]
    fn result_opens_all_result_steps_and_reset_clears() {
        let mut wizard = dbscan_wizard(25);
        walk_to_validation(&mut wizard);
        wizard.run_with(&StubGateway::new(200, dbscan_response(25)));

        for n in [6, 5, 4, 1, 6] {
            assert!(wizard.go_to_step(n), "step {}", n);
        }
        wizard.reset();
        assert_eq!(wizard.state(), WizardState::default());
        assert!(wizard.result().is_none());
        assert!(!wizard.go_to_step(4));
    }

    #[test]
    fn fields_of_other_kind_are_refused() {
        let mut wizard = dbscan_wizard(25);
        let before = wizard.fields().clone();
        assert!(!wizard.set_fields(AnalysisFields::KMeans(KMeansFields::default())));
        assert_eq!(wizard.fields(), &before);
    }

    #[test]
    fn field_change_revalidates() {
        let mut wizard = dbscan_wizard(25);
        assert!(wizard.report().all_passed());
        wizard.set_fields(AnalysisFields::Dbscan(DbscanFields { eps: -1.0, ..DbscanFields::from_dataset(wizard.dataset()) }));
        assert!(!wizard.report().get("Epsilon positive").unwrap().passed);
    }

    #[test]
    fn new_dataset_resets_page() {
        let mut wizard = dbscan_wizard(25);
        walk_to_validation(&mut wizard);
        let same = Arc::clone(wizard.dataset());
        assert!(!wizard.sync_dataset(&same));
        assert_eq!(wizard.current_step(), Step::Validation);

        let reloaded = Arc::new(sample::generate(25, 11));
        assert!(wizard.sync_dataset(&reloaded));
        assert_eq!(wizard.state(), WizardState::default());
        assert_eq!(wizard.dataset().id, reloaded.id);
    }

    #[test]
    fn out_of_range_steps_are_refused() {
        let mut wizard = dbscan_wizard(25);
        assert!(!wizard.go_to_step(0));
        assert!(!wizard.go_to_step(7));
        assert_eq!(wizard.current_step(), Step::Variables);
    }

    #[derive(Debug, Clone)]
    enum Op {
        GoTo(u8),
        Next,
        Prev,
        Succeed,
        Fail,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u8..8).prop_map(Op::GoTo),
            Just(Op::Next),
            Just(Op::Prev),
            Just(Op::Succeed),
            Just(Op::Fail),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn navigation_invariants_hold(ops in prop::collection::vec(op(), 0..40)) {
            let mut wizard = dbscan_wizard(25);
            let mut pending: Option<RunTicket> = None;

            for op in ops {
                let before = wizard.state();
                match op {
                    Op::GoTo(n) => {
                        let navigable = !before.busy && Step::from_number(n).map_or(false, |s| before.is_navigable(s));
                        let moved = wizard.go_to_step(n);
                        prop_assert_eq!(moved, navigable);
                        if !navigable {
                            prop_assert_eq!(wizard.state(), before);
                        }
                    }
                    Op::Next => {
                        if let Some(ticket) = wizard.next() {
                            pending = Some(ticket);
                        }
                    }
                    Op::Prev => {
                        wizard.prev();
                        if before.busy {
                            prop_assert_eq!(wizard.state(), before);
                        }
                    }
                    Op::Succeed => {
                        if let Some(ticket) = pending.take() {
                            wizard.finish_run(ticket.generation, Ok(dbscan_response(25)));
                        }
                    }
                    Op::Fail => {
                        if let Some(ticket) = pending.take() {
                            wizard.finish_run(ticket.generation, Err(GatewayError::Transport("down".into())));
                        }
                    }
                }
                prop_assert!(wizard.state().max_reached_step >= before.max_reached_step);
                if wizard.result().is_some() {
                    for step in [Step::Summary, Step::Reasoning, Step::Statistics] {
                        prop_assert!(wizard.is_navigable(step));
                    }
                }
            }

            wizard.reset();
            prop_assert_eq!(wizard.state(), WizardState::default());
            prop_assert!(wizard.result().is_none());
        }
    }
}
