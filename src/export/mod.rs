// src/export/mod.rs
use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use crate::analysis::{AnalysisKind, AnalysisResult};
use crate::utils::iso_date;

pub mod csv;
pub mod docx;
pub mod png;

// Re-export commonly used types
pub use self::csv::CsvTable;
pub use docx::{document_payload, DocumentExporter, HttpDocumentExporter};
pub use png::{CaptureRegion, ReportCapture};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV export failed: {0}")]
    Csv(String),
    #[error("Could not write the file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image export failed: {0}")]
    Image(String),
    #[error("Document export failed: {0}")]
    Request(String),
    #[error("There is no result to export yet")]
    NoResult,
    #[error("{0} has no annotated dataset to export")]
    NoClusters(&'static str),
}

impl From<::csv::Error> for ExportError {
    fn from(err: ::csv::Error) -> Self {
        ExportError::Csv(err.to_string())
    }
}

impl From<image::ImageError> for ExportError {
    fn from(err: image::ImageError) -> Self {
        ExportError::Image(err.to_string())
    }
}

impl From<reqwest::Error> for ExportError {
    fn from(err: reqwest::Error) -> Self {
        ExportError::Request(err.to_string())
    }
}

/// A finished export, ready to be written wherever the user chooses.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    pub fn extension(&self) -> &str {
        self.file_name.rsplit('.').next().unwrap_or_default()
    }
}

/// `{ExportName}[_{infix}]_{YYYY-MM-DD}.{ext}`
pub fn export_file_name(kind: AnalysisKind, infix: Option<&str>, date: NaiveDate, ext: &str) -> String {
    match infix {
        Some(infix) => format!("{}_{}_{}.{}", kind.export_name(), infix, iso_date(date), ext),
        None => format!("{}_{}.{}", kind.export_name(), iso_date(date), ext),
    }
}

pub fn csv_export(result: &AnalysisResult, date: NaiveDate) -> Result<ExportArtifact, ExportError> {
    let bytes = result.csv_table().to_bytes()?;
    let artifact = ExportArtifact {
        file_name: export_file_name(result.kind(), None, date, "csv"),
        mime: "text/csv",
        bytes,
    };
    info!(file = %artifact.file_name, size = artifact.bytes.len(), "prepared CSV export");
    Ok(artifact)
}

/// The input rows with their cluster labels, for the clustering pages.
pub fn clusters_export(result: &AnalysisResult, date: NaiveDate) -> Result<ExportArtifact, ExportError> {
    let dataset = result.annotated_dataset()
        .ok_or(ExportError::NoClusters(result.kind().title()))?;
    let bytes = CsvTable::from_dataset(dataset).to_bytes()?;
    Ok(ExportArtifact {
        file_name: export_file_name(result.kind(), Some("Clusters"), date, "csv"),
        mime: "text/csv",
        bytes,
    })
}

pub fn png_export(kind: AnalysisKind, capture: &ReportCapture, date: NaiveDate) -> Result<ExportArtifact, ExportError> {
    let bytes = png::render_png(capture)?;
    let artifact = ExportArtifact {
        file_name: export_file_name(kind, Some("Report"), date, "png"),
        mime: "image/png",
        bytes,
    };
    info!(file = %artifact.file_name, size = artifact.bytes.len(), "prepared PNG export");
    Ok(artifact)
}

pub fn docx_export(
    exporter: &dyn DocumentExporter,
    fields: &crate::analysis::AnalysisFields,
    result: &AnalysisResult,
    date: NaiveDate,
) -> Result<ExportArtifact, ExportError> {
    let bytes = exporter.export(fields, result)?;
    Ok(ExportArtifact {
        file_name: export_file_name(result.kind(), Some("Report"), date, "docx"),
        mime: "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        bytes,
    })
}
