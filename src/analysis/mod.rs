// src/analysis/mod.rs
use serde::{Serialize, Deserialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

use crate::dataset::Dataset;
use crate::export::CsvTable;
use crate::gateway::GatewayError;
use crate::wizard::ValidationReport;

pub mod rdd;
pub mod dbscan;
pub mod kmeans;
pub mod kruskal;
pub mod boosting;
pub mod spatial;

// Re-export commonly used types
pub use rdd::{RddFields, RddResult, Kernel};
pub use dbscan::{DbscanFields, DbscanResult};
pub use kmeans::{KMeansFields, KMeansResult};
pub use kruskal::{KruskalFields, KruskalResult};
pub use boosting::{BoostingFields, BoostingResult, BoostingTask};
pub use spatial::{SpatialFields, SpatialResult, SpatialModel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnalysisKind {
    RegressionDiscontinuity,
    Dbscan,
    KMeans,
    KruskalWallis,
    GradientBoosting,
    SpatialAutoregressive,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 6] = [
        AnalysisKind::RegressionDiscontinuity,
        AnalysisKind::Dbscan,
        AnalysisKind::KMeans,
        AnalysisKind::KruskalWallis,
        AnalysisKind::GradientBoosting,
        AnalysisKind::SpatialAutoregressive,
    ];

    pub fn title(self) -> &'static str {
        match self {
            AnalysisKind::RegressionDiscontinuity => "Regression Discontinuity",
            AnalysisKind::Dbscan => "DBSCAN Clustering",
            AnalysisKind::KMeans => "K-Means Clustering",
            AnalysisKind::KruskalWallis => "Kruskal-Wallis Test",
            AnalysisKind::GradientBoosting => "Gradient Boosting",
            AnalysisKind::SpatialAutoregressive => "Spatial Autoregressive Model",
        }
    }

    /// Prefix of exported file names.
    pub fn export_name(self) -> &'static str {
        match self {
            AnalysisKind::RegressionDiscontinuity => "RDD",
            AnalysisKind::Dbscan => "DBSCAN",
            AnalysisKind::KMeans => "KMeans",
            AnalysisKind::KruskalWallis => "KruskalWallis",
            AnalysisKind::GradientBoosting => "GradientBoosting",
            AnalysisKind::SpatialAutoregressive => "SpatialAutoregressive",
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            AnalysisKind::RegressionDiscontinuity => "regression-discontinuity",
            AnalysisKind::Dbscan => "dbscan",
            AnalysisKind::KMeans => "kmeans",
            AnalysisKind::KruskalWallis => "kruskal-wallis",
            AnalysisKind::GradientBoosting => "gradient-boosting",
            AnalysisKind::SpatialAutoregressive => "spatial-autoregressive",
        }
    }

    /// Python implementation shown in the source viewer.
    pub fn source_file(self) -> &'static str {
        match self {
            AnalysisKind::RegressionDiscontinuity => "regression_discontinuity.py",
            AnalysisKind::Dbscan => "dbscan.py",
            AnalysisKind::KMeans => "kmeans.py",
            AnalysisKind::KruskalWallis => "kruskal_wallis.py",
            AnalysisKind::GradientBoosting => "gradient_boosting.py",
            AnalysisKind::SpatialAutoregressive => "spatial_autoregressive.py",
        }
    }

    fn min_numeric_columns(self) -> usize {
        match self {
            AnalysisKind::RegressionDiscontinuity => 2,
            AnalysisKind::Dbscan | AnalysisKind::KMeans => 2,
            AnalysisKind::KruskalWallis => 1,
            AnalysisKind::GradientBoosting => 1,
            AnalysisKind::SpatialAutoregressive => 4,
        }
    }

    /// Whether the page can open a wizard for this dataset; `Err` explains why not.
    pub fn check_compatible(self, dataset: &Dataset) -> Result<(), String> {
        if dataset.row_count() == 0 {
            return Err("The dataset has no rows".to_string());
        }
        let numeric = dataset.numeric_columns().len();
        let needed = self.min_numeric_columns();
        if numeric < needed {
            return Err(format!(
                "{} needs at least {} numeric columns, the dataset has {}",
                self.title(), needed, numeric
            ));
        }
        match self {
            AnalysisKind::KruskalWallis if dataset.columns.len() < 2 => {
                Err("Kruskal-Wallis needs a grouping column and a value column".to_string())
            }
            AnalysisKind::GradientBoosting if dataset.columns.len() < 2 => {
                Err("Gradient Boosting needs a target and at least one feature".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// Field state of one page, one variant per analysis kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AnalysisFields {
    RegressionDiscontinuity(RddFields),
    Dbscan(DbscanFields),
    KMeans(KMeansFields),
    KruskalWallis(KruskalFields),
    GradientBoosting(BoostingFields),
    SpatialAutoregressive(SpatialFields),
}

impl AnalysisFields {
    /// Defaults derived from the dataset's columns and statistics.
    pub fn from_dataset(kind: AnalysisKind, dataset: &Dataset) -> Self {
        match kind {
            AnalysisKind::RegressionDiscontinuity => Self::RegressionDiscontinuity(RddFields::from_dataset(dataset)),
            AnalysisKind::Dbscan => Self::Dbscan(DbscanFields::from_dataset(dataset)),
            AnalysisKind::KMeans => Self::KMeans(KMeansFields::from_dataset(dataset)),
            AnalysisKind::KruskalWallis => Self::KruskalWallis(KruskalFields::from_dataset(dataset)),
            AnalysisKind::GradientBoosting => Self::GradientBoosting(BoostingFields::from_dataset(dataset)),
            AnalysisKind::SpatialAutoregressive => Self::SpatialAutoregressive(SpatialFields::from_dataset(dataset)),
        }
    }

    pub fn kind(&self) -> AnalysisKind {
        match self {
            Self::RegressionDiscontinuity(_) => AnalysisKind::RegressionDiscontinuity,
            Self::Dbscan(_) => AnalysisKind::Dbscan,
            Self::KMeans(_) => AnalysisKind::KMeans,
            Self::KruskalWallis(_) => AnalysisKind::KruskalWallis,
            Self::GradientBoosting(_) => AnalysisKind::GradientBoosting,
            Self::SpatialAutoregressive(_) => AnalysisKind::SpatialAutoregressive,
        }
    }

    pub fn validate(&self, dataset: &Dataset) -> ValidationReport {
        match self {
            Self::RegressionDiscontinuity(f) => f.validate(dataset),
            Self::Dbscan(f) => f.validate(dataset),
            Self::KMeans(f) => f.validate(dataset),
            Self::KruskalWallis(f) => f.validate(dataset),
            Self::GradientBoosting(f) => f.validate(dataset),
            Self::SpatialAutoregressive(f) => f.validate(dataset),
        }
    }

    /// Analysis-specific parameters, without the data rows.
    pub fn parameters(&self) -> Map<String, Value> {
        let value = match self {
            Self::RegressionDiscontinuity(f) => f.parameters(),
            Self::Dbscan(f) => f.parameters(),
            Self::KMeans(f) => f.parameters(),
            Self::KruskalWallis(f) => f.parameters(),
            Self::GradientBoosting(f) => f.parameters(),
            Self::SpatialAutoregressive(f) => f.parameters(),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    /// Rows sent to the service. Clustering drops rows with a missing value
    /// in a selected variable so the returned labels line up row for row.
    pub fn request_dataset<'a>(&self, dataset: &'a Dataset) -> Cow<'a, Dataset> {
        let selected = match self {
            Self::Dbscan(f) => &f.selected_items,
            Self::KMeans(f) => &f.selected_items,
            _ => return Cow::Borrowed(dataset),
        };
        let names: Vec<&str> = selected.iter().map(String::as_str).collect();
        Cow::Owned(dataset.complete_rows(&names))
    }

    /// Request body: the dataset rows as records plus the parameters.
    pub fn request_body(&self, dataset: &Dataset) -> Value {
        let mut body = Map::new();
        body.insert("data".to_string(), Value::Array(self.request_dataset(dataset).to_records()));
        body.extend(self.parameters());
        Value::Object(body)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisResult {
    RegressionDiscontinuity(RddResult),
    Dbscan(DbscanResult),
    KMeans(KMeansResult),
    KruskalWallis(KruskalResult),
    GradientBoosting(BoostingResult),
    SpatialAutoregressive(SpatialResult),
}

fn decode<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T, GatewayError> {
    serde_json::from_value(value).map_err(|e| GatewayError::Decode(e.to_string()))
}

impl AnalysisResult {
    /// Decodes the service response for the page's kind and runs the local
    /// post-processing (cluster labels zipped back onto the rows that were sent).
    pub fn from_response(fields: &AnalysisFields, dataset: &Dataset, value: Value) -> Result<Self, GatewayError> {
        match fields {
            AnalysisFields::RegressionDiscontinuity(_) => Ok(Self::RegressionDiscontinuity(decode(value)?)),
            AnalysisFields::Dbscan(_) => {
                let result: DbscanResult = decode(value)?;
                Ok(Self::Dbscan(result.annotate(&fields.request_dataset(dataset))?))
            }
            AnalysisFields::KMeans(_) => {
                let result: KMeansResult = decode(value)?;
                Ok(Self::KMeans(result.annotate(&fields.request_dataset(dataset))?))
            }
            AnalysisFields::KruskalWallis(_) => Ok(Self::KruskalWallis(decode(value)?)),
            AnalysisFields::GradientBoosting(_) => Ok(Self::GradientBoosting(decode(value)?)),
            AnalysisFields::SpatialAutoregressive(_) => Ok(Self::SpatialAutoregressive(decode(value)?)),
        }
    }

    pub fn kind(&self) -> AnalysisKind {
        match self {
            Self::RegressionDiscontinuity(_) => AnalysisKind::RegressionDiscontinuity,
            Self::Dbscan(_) => AnalysisKind::Dbscan,
            Self::KMeans(_) => AnalysisKind::KMeans,
            Self::KruskalWallis(_) => AnalysisKind::KruskalWallis,
            Self::GradientBoosting(_) => AnalysisKind::GradientBoosting,
            Self::SpatialAutoregressive(_) => AnalysisKind::SpatialAutoregressive,
        }
    }

    /// Plain-language sentences for the Summary step.
    pub fn summary(&self, fields: &AnalysisFields) -> Vec<String> {
        match (self, fields) {
            (Self::RegressionDiscontinuity(r), AnalysisFields::RegressionDiscontinuity(f)) => r.summary(f),
            (Self::Dbscan(r), AnalysisFields::Dbscan(f)) => r.summary(f),
            (Self::KMeans(r), AnalysisFields::KMeans(f)) => r.summary(f),
            (Self::KruskalWallis(r), AnalysisFields::KruskalWallis(f)) => r.summary(f),
            (Self::GradientBoosting(r), AnalysisFields::GradientBoosting(f)) => r.summary(f),
            (Self::SpatialAutoregressive(r), AnalysisFields::SpatialAutoregressive(f)) => r.summary(f),
            _ => Vec::new(),
        }
    }

    /// Method explanation and assumption notes for the Reasoning step.
    pub fn reasoning(&self, fields: &AnalysisFields) -> Vec<String> {
        match (self, fields) {
            (Self::RegressionDiscontinuity(r), AnalysisFields::RegressionDiscontinuity(f)) => r.reasoning(f),
            (Self::Dbscan(r), AnalysisFields::Dbscan(f)) => r.reasoning(f),
            (Self::KMeans(r), AnalysisFields::KMeans(f)) => r.reasoning(f),
            (Self::KruskalWallis(r), AnalysisFields::KruskalWallis(f)) => r.reasoning(f),
            (Self::GradientBoosting(r), AnalysisFields::GradientBoosting(f)) => r.reasoning(f),
            (Self::SpatialAutoregressive(r), AnalysisFields::SpatialAutoregressive(f)) => r.reasoning(f),
            _ => Vec::new(),
        }
    }

    /// Key/value rows of the full statistical report.
    pub fn statistics(&self) -> Vec<(String, String)> {
        match self {
            Self::RegressionDiscontinuity(r) => r.statistics(),
            Self::Dbscan(r) => r.statistics(),
            Self::KMeans(r) => r.statistics(),
            Self::KruskalWallis(r) => r.statistics(),
            Self::GradientBoosting(r) => r.statistics(),
            Self::SpatialAutoregressive(r) => r.statistics(),
        }
    }

    pub fn csv_table(&self) -> CsvTable {
        match self {
            Self::RegressionDiscontinuity(r) => r.csv_table(),
            Self::Dbscan(r) => r.csv_table(),
            Self::KMeans(r) => r.csv_table(),
            Self::KruskalWallis(r) => r.csv_table(),
            Self::GradientBoosting(r) => r.csv_table(),
            Self::SpatialAutoregressive(r) => r.csv_table(),
        }
    }

    /// Dataset with the cluster label column, for clustering results.
    pub fn annotated_dataset(&self) -> Option<&Dataset> {
        match self {
            Self::Dbscan(r) => r.annotated.as_ref(),
            Self::KMeans(r) => r.annotated.as_ref(),
            _ => None,
        }
    }
}

/// Zips service labels back onto the rows as a `cluster` column.
pub(crate) fn annotate_with_labels(dataset: &Dataset, labels: &[i64]) -> Result<Dataset, GatewayError> {
    if labels.len() != dataset.row_count() {
        return Err(GatewayError::Decode(format!(
            "received {} cluster labels for {} rows",
            labels.len(),
            dataset.row_count()
        )));
    }
    let cells = labels.iter().map(|&l| crate::dataset::Cell::Number(l as f64)).collect();
    Ok(dataset.with_column("cluster", cells))
}
