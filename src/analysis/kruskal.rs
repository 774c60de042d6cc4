// src/analysis/kruskal.rs

use serde::{Serialize, Deserialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::dataset::{pick_column, Cell, Dataset};
use crate::export::CsvTable;
use crate::utils::{fmt_num, fmt_opt, fmt_p, significance_phrase};
use crate::wizard::validation::{column_selected, min_rows, ValidationReport};

pub const MIN_ROWS: usize = 20;
pub const MIN_GROUPS: usize = 2;
pub const RECOMMENDED_PER_GROUP: usize = 5;
const MAX_GROUP_LEVELS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KruskalFields {
    pub group_col: Option<String>,
    pub value_col: Option<String>,
    pub post_hoc: bool,
}

impl Default for KruskalFields {
    fn default() -> Self {
        Self {
            group_col: None,
            value_col: None,
            post_hoc: true,
        }
    }
}

impl KruskalFields {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let categorical = dataset.categorical_columns(MAX_GROUP_LEVELS);
        let group_col = pick_column(&categorical, &["group", "treatment", "category", "region", "type"], &[]);
        let taken: Vec<&str> = group_col.iter().map(String::as_str).collect();
        let numeric: Vec<String> = dataset.numeric_columns()
            .into_iter()
            .filter(|c| !c.eq_ignore_ascii_case("id"))
            .collect();
        let value_col = pick_column(&numeric, &["score", "value", "outcome", "response"], &taken);

        Self {
            group_col,
            value_col,
            ..Self::default()
        }
    }

    /// Observation count per group, over rows where the value is numeric.
    pub fn group_sizes(&self, dataset: &Dataset) -> BTreeMap<String, usize> {
        let mut sizes = BTreeMap::new();
        let (Some(group), Some(value)) = (&self.group_col, &self.value_col) else {
            return sizes;
        };
        let (Some(gi), Some(vi)) = (dataset.column_index(group), dataset.column_index(value)) else {
            return sizes;
        };

        for row in &dataset.rows {
            let key = row.get(gi).and_then(Cell::distinct_key);
            let numeric = row.get(vi).and_then(Cell::as_f64).is_some();
            if let (Some(key), true) = (key, numeric) {
                *sizes.entry(key).or_insert(0) += 1;
            }
        }
        sizes
    }

    pub fn validate(&self, dataset: &Dataset) -> ValidationReport {
        let mut report = ValidationReport::new();

        let (ok, detail) = column_selected(&self.group_col, "Select a grouping variable");
        report.check("Group variable selected", ok, detail);
        let (ok, detail) = column_selected(&self.value_col, "Select a value variable");
        report.check("Value variable selected", ok, detail);

        let distinct = match (&self.group_col, &self.value_col) {
            (Some(g), Some(v)) if g == v => (false, "Group and value variable must differ".to_string()),
            (Some(_), Some(_)) => (true, "Group and value variable differ".to_string()),
            _ => (false, "Select both variables".to_string()),
        };
        report.check("Distinct variables", distinct.0, distinct.1);

        let numeric = match &self.value_col {
            Some(col) if dataset.is_numeric_column(col) => (true, format!("{} is numeric", col)),
            Some(col) => (false, format!("{} is not numeric", col)),
            None => (false, "Select a value variable".to_string()),
        };
        report.check("Numeric value variable", numeric.0, numeric.1);

        let sizes = self.group_sizes(dataset);
        report.check(
            "Number of groups",
            sizes.len() >= MIN_GROUPS,
            format!("{} groups (minimum {})", sizes.len(), MIN_GROUPS),
        );

        let usable: usize = sizes.values().sum();
        let (ok, detail) = min_rows(dataset, usable, MIN_ROWS);
        report.check("Sample size", ok, detail);

        let small: Vec<String> = sizes.iter()
            .filter(|(_, &n)| n < RECOMMENDED_PER_GROUP)
            .map(|(g, n)| format!("{} ({})", g, n))
            .collect();
        report.advise(
            "Observations per group",
            !sizes.is_empty() && small.is_empty(),
            if sizes.is_empty() {
                "No groups yet".to_string()
            } else if small.is_empty() {
                format!("Every group has at least {} observations", RECOMMENDED_PER_GROUP)
            } else {
                format!("Small groups: {}", small.join(", "))
            },
        );

        report
    }

    pub fn parameters(&self) -> Value {
        json!({
            "group_col": self.group_col,
            "value_col": self.value_col,
            "post_hoc": self.post_hoc,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupStat {
    pub group: String,
    pub n: usize,
    pub median: f64,
    #[serde(default)]
    pub mean_rank: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairwiseComparison {
    pub group_a: String,
    pub group_b: String,
    pub p_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KruskalResult {
    pub h_statistic: f64,
    pub p_value: f64,
    pub df: u32,
    #[serde(default)]
    pub effect_size: Option<f64>,  // epsilon squared
    #[serde(default)]
    pub group_stats: Vec<GroupStat>,
    #[serde(default)]
    pub post_hoc: Vec<PairwiseComparison>,
}

impl KruskalResult {
    pub fn significant_pairs(&self, alpha: f64) -> Vec<&PairwiseComparison> {
        self.post_hoc.iter().filter(|c| c.p_value < alpha).collect()
    }

    pub fn summary(&self, fields: &KruskalFields) -> Vec<String> {
        let value = fields.value_col.as_deref().unwrap_or("the value");
        let group = fields.group_col.as_deref().unwrap_or("group");
        let mut lines = vec![format!(
            "Differences in {} across the {} groups of {} are {} (H = {}, p = {}).",
            value,
            self.group_stats.len().max(self.df as usize + 1),
            group,
            significance_phrase(self.p_value, 0.05),
            fmt_num(self.h_statistic, 3),
            fmt_p(self.p_value)
        )];

        if let Some(top) = self.group_stats.iter().max_by(|a, b| a.median.total_cmp(&b.median)) {
            lines.push(format!("{} has the highest median {} ({}).", top.group, value, fmt_num(top.median, 3)));
        }

        let pairs = self.significant_pairs(0.05);
        if !pairs.is_empty() {
            let described = pairs.iter()
                .map(|p| format!("{} vs {}", p.group_a, p.group_b))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!("Pairs that differ: {}.", described));
        }
        lines
    }

    pub fn reasoning(&self, fields: &KruskalFields) -> Vec<String> {
        let mut lines = vec![
            "The Kruskal-Wallis test ranks all observations together and checks whether the average rank differs between groups, so it does not assume normally distributed values.".to_string(),
            format!("The H statistic is compared with a chi-squared distribution with {} degrees of freedom.", self.df),
        ];
        if let Some(effect) = self.effect_size {
            let size = if effect >= 0.26 { "large" } else if effect >= 0.08 { "moderate" } else { "small" };
            lines.push(format!("The effect size (epsilon squared = {}) is {}.", fmt_num(effect, 3), size));
        }
        if fields.post_hoc {
            lines.push("Dunn's post-hoc test compares each pair of groups with adjusted p-values.".to_string());
        }
        lines
    }

    pub fn statistics(&self) -> Vec<(String, String)> {
        let mut rows = vec![
            ("H statistic".to_string(), fmt_num(self.h_statistic, 4)),
            ("Degrees of freedom".to_string(), self.df.to_string()),
            ("p-value".to_string(), fmt_p(self.p_value)),
            ("Epsilon squared".to_string(), fmt_opt(self.effect_size, 4)),
        ];
        for g in &self.group_stats {
            rows.push((
                format!("Group {}", g.group),
                format!("n = {}, median = {}, mean rank = {}", g.n, fmt_num(g.median, 3), fmt_opt(g.mean_rank, 2)),
            ));
        }
        for c in &self.post_hoc {
            rows.push((format!("{} vs {}", c.group_a, c.group_b), format!("p = {}", fmt_p(c.p_value))));
        }
        rows
    }

    pub fn csv_table(&self) -> CsvTable {
        let mut table = CsvTable::new(&["group", "n", "median", "mean_rank", "h_statistic", "p_value"]);
        for g in &self.group_stats {
            table.push([
                g.group.clone(),
                g.n.to_string(),
                g.median.to_string(),
                g.mean_rank.map(|r| r.to_string()).unwrap_or_default(),
                self.h_statistic.to_string(),
                self.p_value.to_string(),
            ]);
        }
        table
    }
}
