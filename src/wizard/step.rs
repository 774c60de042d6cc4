// src/wizard/step.rs
use serde::{Serialize, Deserialize};

pub const FIRST_STEP: u8 = 1;
pub const LAST_STEP: u8 = 6;

/// The six steps every analysis page walks through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Step {
    Variables,
    Settings,
    Validation,
    Summary,
    Reasoning,
    Statistics,
}

impl Step {
    pub const ALL: [Step; 6] = [
        Step::Variables,
        Step::Settings,
        Step::Validation,
        Step::Summary,
        Step::Reasoning,
        Step::Statistics,
    ];

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Step::Variables),
            2 => Some(Step::Settings),
            3 => Some(Step::Validation),
            4 => Some(Step::Summary),
            5 => Some(Step::Reasoning),
            6 => Some(Step::Statistics),
            _ => None,
        }
    }

    pub fn number(self) -> u8 {
        match self {
            Step::Variables => 1,
            Step::Settings => 2,
            Step::Validation => 3,
            Step::Summary => 4,
            Step::Reasoning => 5,
            Step::Statistics => 6,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::Variables => "Variables",
            Step::Settings => "Settings",
            Step::Validation => "Validation",
            Step::Summary => "Summary",
            Step::Reasoning => "Reasoning",
            Step::Statistics => "Statistics",
        }
    }

    /// Steps 4-6 display a result and open up once one exists.
    pub fn is_result_bearing(self) -> bool {
        self.number() >= 4
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.number() + 1)
    }

    pub fn prev(self) -> Option<Self> {
        self.number().checked_sub(1).and_then(Self::from_number)
    }
}

impl Default for Step {
    fn default() -> Self {
        Step::Variables
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_round_trip_and_bounds() {
        for step in Step::ALL {
            assert_eq!(Step::from_number(step.number()), Some(step));
        }
        assert_eq!(Step::from_number(0), None);
        assert_eq!(Step::from_number(7), None);
        assert_eq!(Step::Statistics.next(), None);
        assert_eq!(Step::Variables.prev(), None);
        assert_eq!(Step::Validation.next(), Some(Step::Summary));
    }

    #[test]
    fn result_bearing_steps() {
        let bearing: Vec<u8> = Step::ALL.iter()
            .filter(|s| s.is_result_bearing())
            .map(|s| s.number())
            .collect();
        assert_eq!(bearing, vec![4, 5, 6]);
    }
}
