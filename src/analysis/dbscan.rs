// src/analysis/dbscan.rs

use serde::{Serialize, Deserialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::dataset::Dataset;
use crate::export::CsvTable;
use crate::gateway::GatewayError;
use crate::utils::{fmt_num, fmt_opt};
use crate::wizard::validation::{all_numeric, min_rows, selection_count, ValidationReport};
use super::annotate_with_labels;

pub const MIN_ROWS: usize = 20;
pub const RECOMMENDED_ROWS: usize = 100;
pub const NOISE_LABEL: i64 = -1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbscanFields {
    pub eps: f64,
    pub min_samples: usize,
    pub selected_items: Vec<String>,
    pub standardize: bool,
}

impl Default for DbscanFields {
    fn default() -> Self {
        Self {
            eps: 0.5,
            min_samples: 5,
            selected_items: Vec::new(),
            standardize: true,
        }
    }
}

impl DbscanFields {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let selected_items = dataset.numeric_columns()
            .into_iter()
            .filter(|c| !c.eq_ignore_ascii_case("id"))
            .take(2)
            .collect();

        Self {
            selected_items,
            ..Self::default()
        }
    }

    pub fn validate(&self, dataset: &Dataset) -> ValidationReport {
        let mut report = ValidationReport::new();

        let (ok, detail) = selection_count(&self.selected_items, 2);
        report.check("Variables selected", ok, detail);
        let (ok, detail) = all_numeric(dataset, &self.selected_items);
        report.check("Numeric variables", ok, detail);

        report.check("Epsilon positive", self.eps > 0.0, format!("eps = {}", fmt_num(self.eps, 3)));
        report.check(
            "Minimum samples",
            self.min_samples >= 2,
            format!("min_samples = {} (minimum 2)", self.min_samples),
        );

        let names: Vec<&str> = self.selected_items.iter().map(String::as_str).collect();
        let usable = if names.is_empty() { 0 } else { dataset.complete_numeric_rows(&names).len() };
        let (ok, detail) = min_rows(dataset, usable, MIN_ROWS);
        report.check("Sample size", ok, detail);

        report.check(
            "Minimum samples within rows",
            self.min_samples <= usable,
            format!("min_samples {} of {} usable rows", self.min_samples, usable),
        );

        report.advise(
            "Recommended sample size",
            usable >= RECOMMENDED_ROWS,
            format!("{} rows (recommended {})", usable, RECOMMENDED_ROWS),
        );

        report
    }

    pub fn parameters(&self) -> Value {
        json!({
            "eps": self.eps,
            "min_samples": self.min_samples,
            "selected_items": self.selected_items,
            "standardize": self.standardize,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterProfile {
    pub cluster: i64,
    pub size: usize,
    #[serde(default)]
    pub means: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbscanResult {
    pub labels: Vec<i64>,
    pub n_clusters: usize,
    #[serde(default)]
    pub n_noise: usize,
    #[serde(default)]
    pub silhouette: Option<f64>,
    #[serde(default)]
    pub cluster_profiles: Vec<ClusterProfile>,
    #[serde(skip)]
    pub annotated: Option<Dataset>,
}

impl DbscanResult {
    pub fn annotate(mut self, dataset: &Dataset) -> Result<Self, GatewayError> {
        self.annotated = Some(annotate_with_labels(dataset, &self.labels)?);
        Ok(self)
    }

    fn noise_share(&self) -> f64 {
        if self.labels.is_empty() {
            0.0
        } else {
            self.n_noise as f64 / self.labels.len() as f64
        }
    }

    pub fn summary(&self, fields: &DbscanFields) -> Vec<String> {
        let mut lines = vec![format!(
            "DBSCAN found {} cluster{} in {} using {}.",
            self.n_clusters,
            if self.n_clusters == 1 { "" } else { "s" },
            if self.labels.len() == 1 { "1 row".to_string() } else { format!("{} rows", self.labels.len()) },
            fields.selected_items.join(", ")
        )];
        lines.push(format!(
            "{} point{} ({}%) did not belong to any dense region and were marked as noise.",
            self.n_noise,
            if self.n_noise == 1 { "" } else { "s" },
            fmt_num(self.noise_share() * 100.0, 1)
        ));
        if let Some(largest) = self.cluster_profiles.iter().filter(|p| p.cluster != NOISE_LABEL).max_by_key(|p| p.size) {
            lines.push(format!("The largest cluster is cluster {} with {} points.", largest.cluster, largest.size));
        }
        lines
    }

    pub fn reasoning(&self, fields: &DbscanFields) -> Vec<String> {
        let mut lines = vec![
            format!(
                "A point is a core point when at least {} points lie within distance {} of it; clusters grow from connected core points.",
                fields.min_samples, fmt_num(fields.eps, 3)
            ),
            if fields.standardize {
                "Variables were standardized first so each contributes equally to the distance.".to_string()
            } else {
                "Variables were used on their original scales, so variables with larger ranges dominate the distance.".to_string()
            },
        ];
        if self.noise_share() > 0.3 {
            lines.push("More than 30% of points are noise; a larger eps or a smaller min_samples may be more appropriate.".to_string());
        }
        if self.n_clusters <= 1 {
            lines.push("At most one cluster was found; try a smaller eps to separate dense regions.".to_string());
        }
        lines
    }

    pub fn statistics(&self) -> Vec<(String, String)> {
        let mut rows = vec![
            ("Clusters".to_string(), self.n_clusters.to_string()),
            ("Noise points".to_string(), self.n_noise.to_string()),
            ("Silhouette".to_string(), fmt_opt(self.silhouette, 3)),
        ];
        for profile in &self.cluster_profiles {
            let means = profile.means.iter()
                .map(|(k, v)| format!("{} = {}", k, fmt_num(*v, 3)))
                .collect::<Vec<_>>()
                .join(", ");
            rows.push((format!("Cluster {}", profile.cluster), format!("{} points; {}", profile.size, means)));
        }
        rows
    }

    pub fn csv_table(&self) -> CsvTable {
        let variables: Vec<String> = self.cluster_profiles.iter()
            .flat_map(|p| p.means.keys().cloned())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut headers = vec!["cluster".to_string(), "size".to_string()];
        headers.extend(variables.iter().map(|v| format!("mean_{}", v)));
        let mut table = CsvTable { headers, rows: Vec::new() };

        for profile in &self.cluster_profiles {
            let mut row = vec![profile.cluster.to_string(), profile.size.to_string()];
            row.extend(variables.iter().map(|v| profile.means.get(v).map(|m| m.to_string()).unwrap_or_default()));
            table.push(row);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::sample;

    #[test]
    fn defaults_skip_id_column() {
        let data = sample::generate(30, 5);
        let fields = DbscanFields::from_dataset(&data);
        assert_eq!(fields.selected_items, vec!["margin".to_string(), "test_score".to_string()]);
        assert!(fields.validate(&data).all_passed());
    }

    #[test]
    fn needs_two_numeric_variables() {
        let data = sample::generate(30, 5);
        let fields = DbscanFields { selected_items: vec!["income".into(), "region".into()], ..DbscanFields::default() };
        let report = fields.validate(&data);
        assert!(report.get("Variables selected").unwrap().passed);
        assert!(!report.get("Numeric variables").unwrap().passed);
        assert!(!report.all_passed());
    }

    #[test]
    fn invalid_hyperparameters() {
        let data = sample::generate(30, 5);
        let mut fields = DbscanFields::from_dataset(&data);
        fields.eps = 0.0;
        fields.min_samples = 1;
        let report = fields.validate(&data);
        assert!(!report.get("Epsilon positive").unwrap().passed);
        assert!(!report.get("Minimum samples").unwrap().passed);
    }

    #[test]
    fn annotate_adds_cluster_column() {
        let data = sample::generate(3, 5);
        let result = DbscanResult {
            labels: vec![0, 0, -1],
            n_clusters: 1,
            n_noise: 1,
            silhouette: None,
            cluster_profiles: vec![ClusterProfile { cluster: 0, size: 2, means: BTreeMap::from([("income".to_string(), 20.0)]) }],
            annotated: None,
        }
        .annotate(&data)
        .unwrap();
        let annotated = result.annotated.as_ref().unwrap();
        assert_eq!(annotated.numeric_values("cluster"), vec![0.0, 0.0, -1.0]);
        assert_eq!(result.csv_table().headers, vec!["cluster", "size", "mean_income"]);
        assert!(result.summary(&DbscanFields::default())[1].starts_with("1 point (33.3%)"));
    }
}
