// src/analysis/kmeans.rs

use serde::{Serialize, Deserialize};
use serde_json::{json, Value};

use crate::dataset::Dataset;
use crate::export::CsvTable;
use crate::gateway::GatewayError;
use crate::utils::{fmt_num, fmt_opt};
use crate::wizard::validation::{all_numeric, min_rows, samples_per_cluster, selection_count, ValidationReport};
use super::annotate_with_labels;

pub const MIN_ROWS: usize = 20;
pub const MIN_SAMPLES_PER_CLUSTER: f64 = 10.0;
pub const MIN_ITERATIONS: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeansFields {
    pub n_clusters: i64,
    pub selected_items: Vec<String>,
    pub max_iter: u32,
    pub standardize: bool,
}

impl Default for KMeansFields {
    fn default() -> Self {
        Self {
            n_clusters: 3,
            selected_items: Vec::new(),
            max_iter: 300,
            standardize: true,
        }
    }
}

impl KMeansFields {
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

    fn usable_rows(&self, dataset: &Dataset) -> usize {
        let names: Vec<&str> = self.selected_items.iter().map(String::as_str).collect();
        if names.is_empty() {
            0
        } else {
            dataset.complete_numeric_rows(&names).len()
        }
    }

    pub fn validate(&self, dataset: &Dataset) -> ValidationReport {
        let mut report = ValidationReport::new();
        let usable = self.usable_rows(dataset);

        let (ok, detail) = selection_count(&self.selected_items, 2);
        report.check("Variables selected", ok, detail);
        let (ok, detail) = all_numeric(dataset, &self.selected_items);
        report.check("Numeric variables", ok, detail);

        report.check(
            "Number of clusters",
            self.n_clusters >= 2,
            format!("k = {} (minimum 2)", self.n_clusters),
        );
        report.check(
            "Clusters fewer than rows",
            self.n_clusters > 0 && (self.n_clusters as usize) < usable,
            format!("k = {} with {} usable rows", self.n_clusters, usable),
        );

        let (ok, detail) = min_rows(dataset, usable, MIN_ROWS);
        report.check("Sample size", ok, detail);

        let per_cluster = match samples_per_cluster(usable, self.n_clusters) {
            Some(per) => (
                per >= MIN_SAMPLES_PER_CLUSTER,
                format!("{} samples per cluster (minimum {})", fmt_num(per, 1), MIN_SAMPLES_PER_CLUSTER),
            ),
            None => (false, "Choose a positive number of clusters".to_string()),
        };
        report.check("Samples per cluster", per_cluster.0, per_cluster.1);

        report.check(
            "Maximum iterations",
            self.max_iter >= MIN_ITERATIONS,
            format!("{} iterations (minimum {})", self.max_iter, MIN_ITERATIONS),
        );

        report
    }

    pub fn parameters(&self) -> Value {
        json!({
            "n_clusters": self.n_clusters,
            "selected_items": self.selected_items,
            "max_iter": self.max_iter,
            "standardize": self.standardize,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Centroid {
    pub cluster: i64,
    pub size: usize,
    pub center: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeansResult {
    pub labels: Vec<i64>,
    pub n_clusters: usize,
    #[serde(default)]
    pub inertia: Option<f64>,
    #[serde(default)]
    pub silhouette: Option<f64>,
    #[serde(default)]
    pub centroids: Vec<Centroid>,
    #[serde(default)]
    pub iterations: Option<u32>,
    #[serde(skip)]
    pub annotated: Option<Dataset>,
}

impl KMeansResult {
    pub fn annotate(mut self, dataset: &Dataset) -> Result<Self, GatewayError> {
        self.annotated = Some(annotate_with_labels(dataset, &self.labels)?);
        Ok(self)
    }

    fn silhouette_phrase(&self) -> &'static str {
        match self.silhouette {
            Some(s) if s >= 0.5 => "well separated",
            Some(s) if s >= 0.25 => "moderately separated",
            Some(_) => "weakly separated",
            None => "of unknown separation",
        }
    }

    pub fn summary(&self, fields: &KMeansFields) -> Vec<String> {
        let mut lines = vec![format!(
            "The {} rows were split into {} clusters using {}.",
            self.labels.len(), self.n_clusters, fields.selected_items.join(", ")
        )];
        lines.push(format!(
            "The clusters are {} (silhouette {}).",
            self.silhouette_phrase(), fmt_opt(self.silhouette, 3)
        ));
        if let (Some(small), Some(large)) = (
            self.centroids.iter().min_by_key(|c| c.size),
            self.centroids.iter().max_by_key(|c| c.size),
        ) {
            lines.push(format!(
                "Cluster sizes range from {} (cluster {}) to {} (cluster {}).",
                small.size, small.cluster, large.size, large.cluster
            ));
        }
        lines
    }

    pub fn reasoning(&self, fields: &KMeansFields) -> Vec<String> {
        let mut lines = vec![
            format!(
                "K-Means places {} centers and assigns every row to the nearest one, moving the centers until assignments stop changing (at most {} iterations).",
                fields.n_clusters, fields.max_iter
            ),
            "The method favours round clusters of similar size; elongated or nested groups may be split or merged.".to_string(),
        ];
        if fields.standardize {
            lines.push("Variables were standardized so that each contributes equally to the distance.".to_string());
        }
        if let Some(iterations) = self.iterations {
            lines.push(format!("The algorithm converged after {} iterations.", iterations));
        }
        lines
    }

    pub fn statistics(&self) -> Vec<(String, String)> {
        let mut rows = vec![
            ("Clusters".to_string(), self.n_clusters.to_string()),
            ("Inertia".to_string(), fmt_opt(self.inertia, 3)),
            ("Silhouette".to_string(), fmt_opt(self.silhouette, 3)),
        ];
        for centroid in &self.centroids {
            let center = centroid.center.iter().map(|v| fmt_num(*v, 3)).collect::<Vec<_>>().join(", ");
            rows.push((format!("Cluster {}", centroid.cluster), format!("{} points; center ({})", centroid.size, center)));
        }
        rows
    }

    pub fn csv_table(&self) -> CsvTable {
        let dims = self.centroids.iter().map(|c| c.center.len()).max().unwrap_or(0);
        let mut headers = vec!["cluster".to_string(), "size".to_string()];
        headers.extend((0..dims).map(|i| format!("center_{}", i + 1)));
        let mut table = CsvTable { headers, rows: Vec::new() };

        for centroid in &self.centroids {
            let mut row = vec![centroid.cluster.to_string(), centroid.size.to_string()];
            row.extend((0..dims).map(|i| centroid.center.get(i).map(|v| v.to_string()).unwrap_or_default()));
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
    fn zero_clusters_does_not_divide() {
        let data = sample::generate(40, 9);
        let fields = KMeansFields { n_clusters: 0, ..KMeansFields::from_dataset(&data) };
        let report = fields.validate(&data);
        let check = report.get("Samples per cluster").unwrap();
        assert!(!check.passed);
        assert_eq!(check.detail, "Choose a positive number of clusters");
        assert!(!report.all_passed());
    }

    #[test]
    fn negative_clusters_fail() {
        let data = sample::generate(40, 9);
        let fields = KMeansFields { n_clusters: -2, ..KMeansFields::from_dataset(&data) };
        let report = fields.validate(&data);
        assert!(!report.get("Samples per cluster").unwrap().passed);
        assert!(!report.get("Clusters fewer than rows").unwrap().passed);
    }

    #[test]
    fn too_many_clusters_for_rows() {
        let data = sample::generate(40, 9);
        let fields = KMeansFields { n_clusters: 5, ..KMeansFields::from_dataset(&data) };
        let report = fields.validate(&data);
        assert!(!report.get("Samples per cluster").unwrap().passed);
        assert_eq!(report.get("Samples per cluster").unwrap().detail, "8.0 samples per cluster (minimum 10)");

        let fields = KMeansFields { n_clusters: 4, ..fields };
        assert!(fields.validate(&data).all_passed());
    }

    #[test]
    fn result_tables() {
        let result = KMeansResult {
            labels: vec![0, 1, 1],
            n_clusters: 2,
            inertia: Some(12.5),
            silhouette: Some(0.61),
            centroids: vec![
                Centroid { cluster: 0, size: 1, center: vec![1.0, 2.0] },
                Centroid { cluster: 1, size: 2, center: vec![5.0, 6.0] },
            ],
            iterations: Some(7),
            annotated: None,
        };
        assert_eq!(result.csv_table().headers, vec!["cluster", "size", "center_1", "center_2"]);
        assert_eq!(result.csv_table().rows[1], vec!["1", "2", "5", "6"]);
        assert!(result.summary(&KMeansFields::default())[1].contains("well separated"));
    }
}
