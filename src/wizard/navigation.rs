// src/wizard/navigation.rs
//
// Pure navigation state. Every change goes through `update`, so the
// reachability and high-water-mark invariants can be checked in isolation.
use super::step::Step;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WizardState {
    pub current_step: Step,
    pub max_reached_step: Step,
    pub has_result: bool,
    pub busy: bool,
}

impl Default for WizardState {
    fn default() -> Self {
        Self {
            current_step: Step::Variables,
            max_reached_step: Step::Variables,
            has_result: false,
            busy: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    GoTo(Step),
    /// `checks_passed` is the gating AND of the validation report.
    Next { checks_passed: bool },
    Prev,
    RunSucceeded,
    RunFailed,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    /// The run transition fired; the caller must dispatch the request.
    StartRun,
}

impl WizardState {
    pub fn is_navigable(&self, step: Step) -> bool {
        step <= self.max_reached_step || (step.is_result_bearing() && self.has_result)
    }

    pub fn can_run(&self, checks_passed: bool) -> bool {
        self.current_step == Step::Validation && checks_passed && !self.busy
    }

    // Unchecked move; callers decide whether the target is allowed.
    fn go_to(self, step: Step) -> Self {
        Self {
            current_step: step,
            max_reached_step: self.max_reached_step.max(step),
            ..self
        }
    }
}

/// Applies one action. Rejected actions return the state unchanged.
/// While a run is in flight only its outcome or a reset is accepted.
pub fn update(state: WizardState, action: Action) -> (WizardState, Effect) {
    match action {
        Action::GoTo(_) | Action::Prev if state.busy => (state, Effect::None),
        Action::GoTo(step) => {
            if state.is_navigable(step) {
                (state.go_to(step), Effect::None)
            } else {
                (state, Effect::None)
            }
        }
        Action::Next { checks_passed } => match state.current_step {
            Step::Validation => {
                if state.can_run(checks_passed) {
                    (WizardState { busy: true, ..state }, Effect::StartRun)
                } else {
                    (state, Effect::None)
                }
            }
            current => match current.next() {
                Some(next) => (state.go_to(next), Effect::None),
                None => (state, Effect::None),
            },
        },
        Action::Prev => match state.current_step.prev() {
            Some(prev) => (state.go_to(prev), Effect::None),
            None => (state, Effect::None),
        },
        Action::RunSucceeded => {
            let done = WizardState { busy: false, has_result: true, ..state };
            (done.go_to(Step::Summary), Effect::None)
        }
        Action::RunFailed => (WizardState { busy: false, ..state }, Effect::None),
        Action::Reset => (WizardState::default(), Effect::None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn at(current: u8, max: u8, has_result: bool) -> WizardState {
        WizardState {
            current_step: Step::from_number(current).unwrap(),
            max_reached_step: Step::from_number(max).unwrap(),
            has_result,
            busy: false,
        }
    }

    #[test]
    fn next_walks_to_validation_then_requests_run() {
        let mut state = WizardState::default();
        for expected in [2, 3] {
            state = update(state, Action::Next { checks_passed: false }).0;
            assert_eq!(state.current_step.number(), expected);
        }
        let (refused, effect) = update(state, Action::Next { checks_passed: false });
        assert_eq!(refused, state);
        assert_eq!(effect, Effect::None);

        let (running, effect) = update(state, Action::Next { checks_passed: true });
        assert_eq!(effect, Effect::StartRun);
        assert!(running.busy);
        assert_eq!(running.current_step, Step::Validation);

        let (again, effect) = update(running, Action::Next { checks_passed: true });
        assert_eq!(again, running);
        assert_eq!(effect, Effect::None);
    }

    #[test]
    fn run_outcomes() {
        let running = WizardState { busy: true, ..at(3, 3, false) };
        let ok = update(running, Action::RunSucceeded).0;
        assert_eq!(ok, WizardState {
            current_step: Step::Summary,
            max_reached_step: Step::Summary,
            has_result: true,
            busy: false,
        });

        let failed = update(running, Action::RunFailed).0;
        assert_eq!(failed.current_step, Step::Validation);
        assert!(!failed.busy);
        assert!(!failed.has_result);
    }

    #[test]
    fn result_opens_later_steps() {
        let state = at(2, 3, true);
        let jumped = update(state, Action::GoTo(Step::Statistics)).0;
        assert_eq!(jumped.current_step, Step::Statistics);
        assert_eq!(jumped.max_reached_step, Step::Statistics);

        let state = at(1, 1, false);
        assert_eq!(update(state, Action::GoTo(Step::Statistics)).0, state);
    }

    #[test]
    fn next_and_prev_at_the_edges() {
        let last = at(6, 6, true);
        assert_eq!(update(last, Action::Next { checks_passed: true }).0, last);
        let first = at(1, 4, true);
        assert_eq!(update(first, Action::Prev).0, first);
        assert_eq!(update(at(5, 5, true), Action::Prev).0.current_step, Step::Summary);
    }

    #[test]
    fn navigation_is_refused_while_running() {
        let running = WizardState { busy: true, ..at(3, 5, true) };
        assert_eq!(update(running, Action::GoTo(Step::Variables)), (running, Effect::None));
        assert_eq!(update(running, Action::GoTo(Step::Summary)), (running, Effect::None));
        assert_eq!(update(running, Action::Prev), (running, Effect::None));
        assert_eq!(update(running, Action::Reset).0, WizardState::default());
    }

    fn step_strategy() -> impl Strategy<Value = Step> {
        (1u8..=6).prop_map(|n| Step::from_number(n).unwrap())
    }

    fn action_strategy() -> impl Strategy<Value = Action> {
        prop_oneof![
            step_strategy().prop_map(Action::GoTo),
            any::<bool>().prop_map(|checks_passed| Action::Next { checks_passed }),
            Just(Action::Prev),
            Just(Action::RunSucceeded),
            Just(Action::RunFailed),
        ]
    }

    proptest! {
        #[test]
        fn go_to_applies_iff_navigable(actions in prop::collection::vec(action_strategy(), 0..30), target in step_strategy()) {
            let state = actions.into_iter().fold(WizardState::default(), |s, a| update(s, a).0);
            let navigable = state.is_navigable(target) && !state.busy;
            let (after, _) = update(state, Action::GoTo(target));
            if navigable {
                prop_assert_eq!(after.current_step, target);
            } else {
                prop_assert_eq!(after, state);
            }
        }

        #[test]
        fn high_water_mark_never_drops(actions in prop::collection::vec(action_strategy(), 0..40)) {
            let mut state = WizardState::default();
            for action in actions {
                let (next, _) = update(state, action);
                prop_assert!(next.max_reached_step >= state.max_reached_step);
                prop_assert!(next.is_navigable(next.current_step));
                if state.busy && matches!(action, Action::GoTo(_) | Action::Prev) {
                    prop_assert_eq!(next, state);
                }
                state = next;
            }
        }

        #[test]
        fn reset_returns_to_start(actions in prop::collection::vec(action_strategy(), 0..30)) {
            let state = actions.into_iter().fold(WizardState::default(), |s, a| update(s, a).0);
            let (reset, _) = update(state, Action::Reset);
            prop_assert_eq!(reset, WizardState::default());
        }
    }
}
