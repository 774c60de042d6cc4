// src/analysis/rdd.rs

use serde::{Serialize, Deserialize};
use serde_json::{json, Value};

use crate::dataset::{pick_column, Dataset};
use crate::export::CsvTable;
use crate::utils::{fmt_num, fmt_p, significance_phrase};
use crate::wizard::validation::{column_selected, min_rows, ValidationReport};

pub const MIN_ROWS: usize = 20;
pub const RECOMMENDED_ROWS: usize = 100;
pub const MIN_PER_SIDE: usize = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Kernel {
    Triangular,
    Uniform,
    Epanechnikov,
}

impl Default for Kernel {
    fn default() -> Self {
        Kernel::Triangular
    }
}

impl Kernel {
    pub const ALL: [Kernel; 3] = [Kernel::Triangular, Kernel::Uniform, Kernel::Epanechnikov];

    pub fn as_str(self) -> &'static str {
        match self {
            Kernel::Triangular => "triangular",
            Kernel::Uniform => "uniform",
            Kernel::Epanechnikov => "epanechnikov",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RddFields {
    pub outcome_col: Option<String>,
    pub running_col: Option<String>,
    pub cutoff: f64,
    pub bandwidth: Option<f64>,  // None lets the service pick an optimal bandwidth
    pub polynomial_order: u8,
    pub kernel: Kernel,
}

impl Default for RddFields {
    fn default() -> Self {
        Self {
            outcome_col: None,
            running_col: None,
            cutoff: 0.0,
            bandwidth: None,
            polynomial_order: 1,
            kernel: Kernel::default(),
        }
    }
}

impl RddFields {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let numeric = dataset.numeric_columns();
        let running_col = pick_column(&numeric, &["running", "margin", "distance", "assignment"], &[]);
        let taken: Vec<&str> = running_col.iter().map(String::as_str).collect();
        let outcome_col = pick_column(&numeric, &["outcome", "score", "result", "y"], &taken);

        let cutoff = running_col.as_deref()
            .and_then(|c| dataset.column_stats(c))
            .and_then(|s| s.median)
            .unwrap_or(0.0);

        Self {
            outcome_col,
            running_col,
            cutoff,
            ..Self::default()
        }
    }

    /// Rows where both selected columns are numbers, as (running, outcome).
    fn usable_pairs(&self, dataset: &Dataset) -> Vec<(f64, f64)> {
        match (&self.running_col, &self.outcome_col) {
            (Some(running), Some(outcome)) => dataset
                .complete_numeric_rows(&[running.as_str(), outcome.as_str()])
                .into_iter()
                .map(|r| (r[0], r[1]))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn validate(&self, dataset: &Dataset) -> ValidationReport {
        let mut report = ValidationReport::new();

        let (ok, detail) = column_selected(&self.outcome_col, "Select an outcome variable");
        report.check("Outcome variable selected", ok, detail);
        let (ok, detail) = column_selected(&self.running_col, "Select a running variable");
        report.check("Running variable selected", ok, detail);

        let distinct = match (&self.outcome_col, &self.running_col) {
            (Some(o), Some(r)) if o == r => (false, "Outcome and running variable must differ".to_string()),
            (Some(_), Some(_)) => (true, "Outcome and running variable differ".to_string()),
            _ => (false, "Select both variables".to_string()),
        };
        report.check("Distinct variables", distinct.0, distinct.1);

        let range = self.running_col.as_deref().and_then(|c| dataset.column_stats(c));
        let cutoff_check = match range.as_ref().and_then(|s| s.min.zip(s.max)) {
            Some((min, max)) => (
                self.cutoff > min && self.cutoff < max,
                format!("Cutoff {} within ({}, {})", fmt_num(self.cutoff, 3), fmt_num(min, 3), fmt_num(max, 3)),
            ),
            None => (false, "Select a numeric running variable".to_string()),
        };
        report.check("Cutoff within range", cutoff_check.0, cutoff_check.1);

        let pairs = self.usable_pairs(dataset);
        let (ok, detail) = min_rows(dataset, pairs.len(), MIN_ROWS);
        report.check("Sample size", ok, detail);

        let left = pairs.iter().filter(|(x, _)| *x < self.cutoff).count();
        let right = pairs.len() - left;
        report.check(
            "Observations on both sides",
            left >= MIN_PER_SIDE && right >= MIN_PER_SIDE,
            format!("{} below, {} at or above the cutoff (minimum {} each)", left, right, MIN_PER_SIDE),
        );

        if let Some(bandwidth) = self.bandwidth {
            report.check(
                "Bandwidth positive",
                bandwidth > 0.0,
                format!("Bandwidth {}", fmt_num(bandwidth, 3)),
            );
        }

        report.check(
            "Polynomial order",
            matches!(self.polynomial_order, 1 | 2),
            format!("Order {} (1 or 2)", self.polynomial_order),
        );

        report.advise(
            "Recommended sample size",
            pairs.len() >= RECOMMENDED_ROWS,
            format!("{} rows (recommended {})", pairs.len(), RECOMMENDED_ROWS),
        );

        report
    }

    pub fn parameters(&self) -> Value {
        json!({
            "outcome_col": self.outcome_col,
            "running_col": self.running_col,
            "cutoff": self.cutoff,
            "bandwidth": self.bandwidth,
            "polynomial_order": self.polynomial_order,
            "kernel": self.kernel.as_str(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RddEstimate {
    pub effect: f64,
    pub std_error: f64,
    pub p_value: f64,
    pub ci_lower: f64,
    pub ci_upper: f64,
    pub bandwidth: f64,
    #[serde(default)]
    pub n_left: usize,
    #[serde(default)]
    pub n_right: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobustnessCheck {
    pub bandwidth: f64,
    pub effect: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManipulationTest {
    pub statistic: f64,
    pub p_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RddResult {
    pub estimate: RddEstimate,
    #[serde(default)]
    pub robustness: Vec<RobustnessCheck>,
    #[serde(default)]
    pub manipulation_test: Option<ManipulationTest>,
}

impl RddResult {
    pub fn summary(&self, fields: &RddFields) -> Vec<String> {
        let est = &self.estimate;
        let outcome = fields.outcome_col.as_deref().unwrap_or("the outcome");
        let running = fields.running_col.as_deref().unwrap_or("the running variable");
        let direction = if est.effect >= 0.0 { "increases" } else { "decreases" };

        let mut lines = vec![
            format!(
                "Crossing the cutoff of {} on {} {} {} by {} on average.",
                fmt_num(fields.cutoff, 3), running, direction, outcome, fmt_num(est.effect.abs(), 3)
            ),
            format!(
                "The jump is {} (p = {}), with a 95% confidence interval from {} to {}.",
                significance_phrase(est.p_value, 0.05), fmt_p(est.p_value),
                fmt_num(est.ci_lower, 3), fmt_num(est.ci_upper, 3)
            ),
        ];

        if let Some(test) = &self.manipulation_test {
            lines.push(if test.p_value < 0.05 {
                "Observations bunch up around the cutoff, which suggests the running variable may have been manipulated.".to_string()
            } else {
                "There is no sign that units sorted themselves around the cutoff.".to_string()
            });
        }
        lines
    }

    pub fn reasoning(&self, fields: &RddFields) -> Vec<String> {
        let est = &self.estimate;
        let mut lines = vec![
            "Units just below and just above the cutoff are assumed comparable, so the difference in outcomes at the cutoff is attributed to crossing it.".to_string(),
            format!(
                "Local {} regressions were fitted on each side within a bandwidth of {} using a {} kernel, with {} observations below and {} above.",
                if fields.polynomial_order == 2 { "quadratic" } else { "linear" },
                fmt_num(est.bandwidth, 3), fields.kernel.as_str(), est.n_left, est.n_right
            ),
        ];

        if !self.robustness.is_empty() {
            let agreeing = self.robustness.iter()
                .filter(|r| r.effect.signum() == est.effect.signum())
                .count();
            lines.push(format!(
                "{} of {} alternative bandwidths give an effect in the same direction.",
                agreeing, self.robustness.len()
            ));
        }

        if let Some(test) = &self.manipulation_test {
            lines.push(format!(
                "The density test at the cutoff gives a statistic of {} (p = {}).",
                fmt_num(test.statistic, 3), fmt_p(test.p_value)
            ));
        }
        lines
    }

    pub fn statistics(&self) -> Vec<(String, String)> {
        let est = &self.estimate;
        let mut rows = vec![
            ("Effect".to_string(), fmt_num(est.effect, 4)),
            ("Std. error".to_string(), fmt_num(est.std_error, 4)),
            ("p-value".to_string(), fmt_p(est.p_value)),
            ("95% CI".to_string(), format!("[{}, {}]", fmt_num(est.ci_lower, 4), fmt_num(est.ci_upper, 4))),
            ("Bandwidth".to_string(), fmt_num(est.bandwidth, 4)),
            ("N below / above".to_string(), format!("{} / {}", est.n_left, est.n_right)),
        ];
        if let Some(test) = &self.manipulation_test {
            rows.push(("Manipulation test".to_string(), format!("{} (p = {})", fmt_num(test.statistic, 3), fmt_p(test.p_value))));
        }
        for check in &self.robustness {
            rows.push((
                format!("Bandwidth {}", fmt_num(check.bandwidth, 3)),
                format!("{} (p = {})", fmt_num(check.effect, 4), fmt_p(check.p_value)),
            ));
        }
        rows
    }

    pub fn csv_table(&self) -> CsvTable {
        let est = &self.estimate;
        let mut table = CsvTable::new(&["section", "bandwidth", "effect", "std_error", "p_value", "ci_lower", "ci_upper"]);
        table.push([
            "estimate".to_string(),
            est.bandwidth.to_string(),
            est.effect.to_string(),
            est.std_error.to_string(),
            est.p_value.to_string(),
            est.ci_lower.to_string(),
            est.ci_upper.to_string(),
        ]);
        for check in &self.robustness {
            table.push([
                "robustness".to_string(),
                check.bandwidth.to_string(),
                check.effect.to_string(),
                String::new(),
                check.p_value.to_string(),
                String::new(),
                String::new(),
            ]);
        }
        if let Some(test) = &self.manipulation_test {
            table.push([
                "manipulation_test".to_string(),
                String::new(),
                test.statistic.to_string(),
                String::new(),
                test.p_value.to_string(),
                String::new(),
                String::new(),
            ]);
        }
        table
    }
}
