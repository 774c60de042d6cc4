// src/wizard/validation.rs
use serde::Serialize;

use crate::dataset::Dataset;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationCheck {
    pub label: String,
    pub passed: bool,
    pub detail: String,
    /// Advisory checks are shown but left out of `all_passed`.
    pub gating: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub checks: Vec<ValidationCheck>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, label: &str, passed: bool, detail: impl Into<String>) -> &mut Self {
        self.checks.push(ValidationCheck {
            label: label.to_string(),
            passed,
            detail: detail.into(),
            gating: true,
        });
        self
    }

    pub fn advise(&mut self, label: &str, passed: bool, detail: impl Into<String>) -> &mut Self {
        self.checks.push(ValidationCheck {
            label: label.to_string(),
            passed,
            detail: detail.into(),
            gating: false,
        });
        self
    }

    pub fn all_passed(&self) -> bool {
        self.checks.iter().filter(|c| c.gating).all(|c| c.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ValidationCheck> {
        self.checks.iter().filter(|c| !c.passed)
    }

    pub fn get(&self, label: &str) -> Option<&ValidationCheck> {
        self.checks.iter().find(|c| c.label == label)
    }
}

// Rule helpers shared by the analysis pages. Each returns (passed, detail).

pub fn column_selected(selection: &Option<String>, prompt: &str) -> (bool, String) {
    match selection {
        Some(column) => (true, column.clone()),
        None => (false, prompt.to_string()),
    }
}

pub fn min_rows(dataset: &Dataset, usable: usize, minimum: usize) -> (bool, String) {
    let total = dataset.row_count();
    let detail = if usable == total {
        format!("{} rows (minimum {})", total, minimum)
    } else {
        format!("{} usable of {} rows (minimum {})", usable, total, minimum)
    };
    (usable >= minimum, detail)
}

pub fn selection_count(selected: &[String], minimum: usize) -> (bool, String) {
    let noun = if selected.len() == 1 { "variable" } else { "variables" };
    (selected.len() >= minimum, format!("{} {} selected (minimum {})", selected.len(), noun, minimum))
}

pub fn all_numeric(dataset: &Dataset, selected: &[String]) -> (bool, String) {
    let non_numeric: Vec<&str> = selected.iter()
        .filter(|c| !dataset.is_numeric_column(c))
        .map(String::as_str)
        .collect();
    if selected.is_empty() {
        (false, "Select numeric variables".to_string())
    } else if non_numeric.is_empty() {
        (true, "All selected variables are numeric".to_string())
    } else {
        (false, format!("Not numeric: {}", non_numeric.join(", ")))
    }
}

/// Rows per cluster, guarding the user-controlled divisor.
pub fn samples_per_cluster(rows: usize, n_clusters: i64) -> Option<f64> {
    if n_clusters <= 0 {
        None
    } else {
        Some(rows as f64 / n_clusters as f64)
    }
}
