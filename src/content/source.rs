// src/content/source.rs
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::analysis::AnalysisKind;
use crate::config::Settings;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Could not fetch {file}: {message}")]
    Fetch { file: &'static str, message: String },
}

/// Downloads the Python implementation of an analysis for display only.
pub struct SourceFetcher {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl SourceFetcher {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url: base_url.into() })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, reqwest::Error> {
        Self::new(settings.source_base_url.clone(), settings.request_timeout())
    }

    pub fn url(&self, kind: AnalysisKind) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), kind.source_file())
    }

    pub fn fetch(&self, kind: AnalysisKind) -> Result<String, SourceError> {
        let file = kind.source_file();
        let fail = |message: String| SourceError::Fetch { file, message };
        let url = self.url(kind);
        info!(%url, "fetching analysis source");

        let response = self.client.get(&url).send().map_err(|e| fail(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fail(format!("HTTP {}", status.as_u16())));
        }
        response.text().map_err(|e| fail(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_points_at_python_file() {
        let fetcher = SourceFetcher::new("http://localhost:8000/static/code/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            fetcher.url(AnalysisKind::SpatialAutoregressive),
            "http://localhost:8000/static/code/spatial_autoregressive.py"
        );
    }
}
