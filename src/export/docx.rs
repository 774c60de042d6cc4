// src/export/docx.rs
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

use crate::analysis::{AnalysisFields, AnalysisKind, AnalysisResult};
use crate::config::Settings;
use crate::gateway::ErrorBody;
use super::ExportError;

/// Produces a Word report for a finished run.
pub trait DocumentExporter: Send + Sync {
    fn export(&self, fields: &AnalysisFields, result: &AnalysisResult) -> Result<Vec<u8>, ExportError>;
}

/// `{analysis, parameters, result}` as the export route expects it.
pub fn document_payload(fields: &AnalysisFields, result: &AnalysisResult) -> Result<Value, ExportError> {
    let result = serde_json::to_value(result).map_err(|e| ExportError::Request(e.to_string()))?;
    Ok(json!({
        "analysis": fields.kind().slug(),
        "parameters": Value::Object(fields.parameters()),
        "result": result,
    }))
}

pub struct HttpDocumentExporter {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpDocumentExporter {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ExportError> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url: base_url.into() })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ExportError> {
        Self::new(settings.export_base_url.clone(), settings.request_timeout())
    }

    pub fn endpoint(&self, kind: AnalysisKind) -> String {
        format!("{}/api/export/{}-docx", self.base_url.trim_end_matches('/'), kind.slug())
    }
}

impl DocumentExporter for HttpDocumentExporter {
    fn export(&self, fields: &AnalysisFields, result: &AnalysisResult) -> Result<Vec<u8>, ExportError> {
        let url = self.endpoint(fields.kind());
        let payload = document_payload(fields, result)?;
        info!(%url, "requesting document export");

        let response = self.client.post(&url).json(&payload).send()?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = ErrorBody::parse(&body)
                .message()
                .unwrap_or_else(|| format!("the export service answered HTTP {}", status.as_u16()));
            warn!(%url, status = status.as_u16(), %message, "document export failed");
            return Err(ExportError::Request(message));
        }
        Ok(response.bytes()?.to_vec())
    }
}
