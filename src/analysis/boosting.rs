// src/analysis/boosting.rs

use serde::{Serialize, Deserialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::dataset::{pick_column, Cell, Dataset};
use crate::export::CsvTable;
use crate::utils::fmt_num;
use crate::wizard::validation::{column_selected, min_rows, selection_count, ValidationReport};

pub const MIN_ROWS: usize = 20;
pub const RECOMMENDED_TRAINING_ROWS: usize = 50;
pub const MAX_DEPTH_LIMIT: u32 = 20;
pub const MAX_TEST_SIZE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoostingTask {
    Regression,
    Classification,
}

impl BoostingTask {
    pub const ALL: [BoostingTask; 2] = [BoostingTask::Regression, BoostingTask::Classification];

    pub fn as_str(self) -> &'static str {
        match self {
            BoostingTask::Regression => "regression",
            BoostingTask::Classification => "classification",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostingFields {
    pub target_col: Option<String>,
    pub feature_cols: Vec<String>,
    pub task: BoostingTask,
    pub n_estimators: u32,
    pub learning_rate: f64,
    pub max_depth: u32,
    pub test_size: f64,
}

impl Default for BoostingFields {
    fn default() -> Self {
        Self {
            target_col: None,
            feature_cols: Vec::new(),
            task: BoostingTask::Regression,
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            test_size: 0.2,
        }
    }
}

impl BoostingFields {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let numeric: Vec<String> = dataset.numeric_columns()
            .into_iter()
            .filter(|c| !c.eq_ignore_ascii_case("id"))
            .collect();
        let target_col = pick_column(&numeric, &["target", "price", "outcome", "label"], &[]);
        let feature_cols = numeric.into_iter()
            .filter(|c| Some(c) != target_col.as_ref())
            .collect();

        Self {
            target_col,
            feature_cols,
            ..Self::default()
        }
    }

    fn training_rows(&self, usable: usize) -> usize {
        ((usable as f64) * (1.0 - self.test_size)).floor().max(0.0) as usize
    }

    pub fn validate(&self, dataset: &Dataset) -> ValidationReport {
        let mut report = ValidationReport::new();

        let (ok, detail) = column_selected(&self.target_col, "Select a target variable");
        report.check("Target variable selected", ok, detail);
        let (ok, detail) = selection_count(&self.feature_cols, 1);
        report.check("Features selected", ok, detail);

        let overlap = self.target_col.as_ref().map_or(false, |t| self.feature_cols.contains(t));
        report.check(
            "Target not a feature",
            !overlap,
            if overlap { "Remove the target from the features" } else { "Target and features are separate" },
        );

        report.check(
            "Number of estimators",
            self.n_estimators >= 1,
            format!("{} estimators (minimum 1)", self.n_estimators),
        );
        report.check(
            "Learning rate",
            self.learning_rate > 0.0 && self.learning_rate <= 1.0,
            format!("learning rate {} (must be in (0, 1])", fmt_num(self.learning_rate, 3)),
        );
        report.check(
            "Maximum depth",
            (1..=MAX_DEPTH_LIMIT).contains(&self.max_depth),
            format!("depth {} (between 1 and {})", self.max_depth, MAX_DEPTH_LIMIT),
        );
        report.check(
            "Test size",
            self.test_size > 0.0 && self.test_size <= MAX_TEST_SIZE,
            format!("test share {} (must be in (0, {}])", fmt_num(self.test_size, 2), MAX_TEST_SIZE),
        );

        let usable = self.usable_rows(dataset);
        let (ok, detail) = min_rows(dataset, usable, MIN_ROWS);
        report.check("Sample size", ok, detail);

        if self.task == BoostingTask::Classification {
            let classes = self.target_col.as_ref().map_or(0, |t| dataset.distinct_count(t));
            report.check(
                "Target classes",
                classes >= 2,
                format!("{} classes (minimum 2)", classes),
            );
        }

        let training = self.training_rows(usable);
        report.advise(
            "Recommended training size",
            training >= RECOMMENDED_TRAINING_ROWS,
            format!("{} training rows (recommended {})", training, RECOMMENDED_TRAINING_ROWS),
        );

        report
    }

    /// Rows with numeric features and a usable target: numeric for
    /// regression, any non-missing label for classification.
    fn usable_rows(&self, dataset: &Dataset) -> usize {
        let Some(target) = self.target_col.as_deref().and_then(|t| dataset.column_index(t)) else {
            return 0;
        };
        let features: Option<Vec<usize>> = self.feature_cols.iter().map(|c| dataset.column_index(c)).collect();
        let Some(features) = features.filter(|f| !f.is_empty()) else {
            return 0;
        };

        dataset.rows.iter()
            .filter(|row| features.iter().all(|&i| row.get(i).and_then(Cell::as_f64).is_some()))
            .filter(|row| match (self.task, row.get(target)) {
                (BoostingTask::Regression, Some(cell)) => cell.as_f64().is_some(),
                (BoostingTask::Classification, Some(cell)) => !cell.is_missing(),
                (_, None) => false,
            })
            .count()
    }

    pub fn parameters(&self) -> Value {
        json!({
            "target_col": self.target_col,
            "feature_cols": self.feature_cols,
            "task": self.task.as_str(),
            "n_estimators": self.n_estimators,
            "learning_rate": self.learning_rate,
            "max_depth": self.max_depth,
            "test_size": self.test_size,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostingResult {
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
    #[serde(default)]
    pub feature_importance: Vec<FeatureImportance>,
    #[serde(default)]
    pub n_train: Option<usize>,
    #[serde(default)]
    pub n_test: Option<usize>,
}

impl BoostingResult {
    /// Features ordered from most to least important.
    pub fn ranked_features(&self) -> Vec<&FeatureImportance> {
        let mut ranked: Vec<&FeatureImportance> = self.feature_importance.iter().collect();
        ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
        ranked
    }

    fn headline_metric(&self, task: BoostingTask) -> Option<(&'static str, f64)> {
        let keys: &[(&str, &'static str)] = match task {
            BoostingTask::Regression => &[("r2", "R²"), ("test_r2", "R²"), ("rmse", "RMSE")],
            BoostingTask::Classification => &[("accuracy", "accuracy"), ("test_accuracy", "accuracy"), ("f1", "F1")],
        };
        keys.iter().find_map(|(key, label)| self.metrics.get(*key).map(|v| (*label, *v)))
    }

    pub fn summary(&self, fields: &BoostingFields) -> Vec<String> {
        let target = fields.target_col.as_deref().unwrap_or("the target");
        let mut lines = vec![format!(
            "A gradient boosting {} model predicting {} was trained on {} feature{}.",
            fields.task.as_str(),
            target,
            fields.feature_cols.len(),
            if fields.feature_cols.len() == 1 { "" } else { "s" }
        )];

        if let Some((label, value)) = self.headline_metric(fields.task) {
            lines.push(format!("On the held-out test set the model reached {} = {}.", label, fmt_num(value, 3)));
        }

        let ranked = self.ranked_features();
        if !ranked.is_empty() {
            let top = ranked.iter()
                .take(3)
                .map(|f| f.feature.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(format!("The most influential features were {}.", top));
        }
        lines
    }

    pub fn reasoning(&self, fields: &BoostingFields) -> Vec<String> {
        let mut lines = vec![
            format!(
                "Gradient boosting fits {} shallow trees (depth {}) in sequence, each correcting the errors of the ones before it, scaled by a learning rate of {}.",
                fields.n_estimators, fields.max_depth, fmt_num(fields.learning_rate, 3)
            ),
            format!(
                "{}% of the rows were held out to measure how well the model generalizes.",
                fmt_num(fields.test_size * 100.0, 0)
            ),
            "Feature importance reflects how much each feature reduced the loss across all trees; it does not indicate the direction of the effect.".to_string(),
        ];
        if let (Some(train), Some(test)) = (self.n_train, self.n_test) {
            lines.push(format!("The model used {} training rows and {} test rows.", train, test));
        }
        lines
    }

    pub fn statistics(&self) -> Vec<(String, String)> {
        let mut rows: Vec<(String, String)> = self.metrics.iter()
            .map(|(k, v)| (k.clone(), fmt_num(*v, 4)))
            .collect();
        if let Some(n) = self.n_train {
            rows.push(("Training rows".to_string(), n.to_string()));
        }
        if let Some(n) = self.n_test {
            rows.push(("Test rows".to_string(), n.to_string()));
        }
        for f in self.ranked_features() {
            rows.push((format!("Importance of {}", f.feature), fmt_num(f.importance, 4)));
        }
        rows
    }

    pub fn csv_table(&self) -> CsvTable {
        let mut table = CsvTable::new(&["feature", "importance"]);
        for f in self.ranked_features() {
            table.push([f.feature.clone(), f.importance.to_string()]);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::sample;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_use_price_as_target() {
        let data = sample::generate(80, 2);
        let fields = BoostingFields::from_dataset(&data);
        assert_eq!(fields.target_col.as_deref(), Some("house_price"));
        assert!(!fields.feature_cols.contains(&"house_price".to_string()));
        assert!(!fields.feature_cols.contains(&"id".to_string()));
        assert!(fields.validate(&data).all_passed());
    }

    #[test]
    fn target_among_features_fails() {
        let data = sample::generate(80, 2);
        let mut fields = BoostingFields::from_dataset(&data);
        fields.feature_cols.push("house_price".into());
        let report = fields.validate(&data);
        assert!(!report.get("Target not a feature").unwrap().passed);
    }

    #[test]
    fn hyperparameter_bounds() {
        let data = sample::generate(80, 2);
        let fields = BoostingFields {
            n_estimators: 0,
            learning_rate: 1.5,
            max_depth: 21,
            test_size: 0.6,
            ..BoostingFields::from_dataset(&data)
        };
        let report = fields.validate(&data);
        for label in ["Number of estimators", "Learning rate", "Maximum depth", "Test size"] {
            assert!(!report.get(label).unwrap().passed, "{}", label);
        }
    }

    #[test]
    fn small_training_set_is_advisory() {
        let data = sample::generate(30, 2);
        let report = BoostingFields::from_dataset(&data).validate(&data);
        assert!(!report.get("Recommended training size").unwrap().passed);
        assert!(report.all_passed());
    }

    #[test]
    fn classification_needs_two_classes() {
        let data = sample::generate(40, 2);
        let fields = BoostingFields {
            target_col: Some("region".into()),
            feature_cols: vec!["income".into(), "spending".into()],
            task: BoostingTask::Classification,
            ..BoostingFields::default()
        };
        let report = fields.validate(&data);
        assert!(report.get("Target classes").unwrap().passed);
        assert!(report.get("Sample size").unwrap().passed);
    }

    #[test]
    fn features_ranked_by_importance() {
        let result = BoostingResult {
            metrics: BTreeMap::from([("r2".to_string(), 0.82), ("rmse".to_string(), 3.1)]),
            feature_importance: vec![
                FeatureImportance { feature: "a".into(), importance: 0.1 },
                FeatureImportance { feature: "b".into(), importance: 0.7 },
                FeatureImportance { feature: "c".into(), importance: 0.2 },
            ],
            n_train: Some(64),
            n_test: Some(16),
        };
        let fields = BoostingFields { target_col: Some("y".into()), ..BoostingFields::default() };
        let lines = result.summary(&fields);
        assert_eq!(lines[1], "On the held-out test set the model reached R² = 0.820.");
        assert_eq!(lines[2], "The most influential features were b, c, a.");
        assert_eq!(result.csv_table().rows[0], vec!["b", "0.7"]);
    }
}
