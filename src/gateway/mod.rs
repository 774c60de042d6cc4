// src/gateway/mod.rs
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

use crate::analysis::{AnalysisFields, AnalysisKind};
use crate::config::Settings;
use crate::dataset::Dataset;

pub mod error;

pub use error::{interpret_response, ErrorBody, GatewayError};

/// One serialized run: the page's kind and the JSON body to post.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    pub kind: AnalysisKind,
    pub body: Value,
}

impl AnalysisRequest {
    pub fn new(fields: &AnalysisFields, dataset: &Dataset) -> Self {
        Self {
            kind: fields.kind(),
            body: fields.request_body(dataset),
        }
    }

    pub fn endpoint(&self, base_url: &str) -> String {
        format!("{}/api/analysis/{}", base_url.trim_end_matches('/'), self.kind.slug())
    }
}

pub trait AnalysisGateway: Send + Sync {
    /// Issues the request once. No retry.
    fn run(&self, request: &AnalysisRequest) -> Result<Value, GatewayError>;
}

pub struct HttpGateway {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, GatewayError> {
        Self::new(settings.api_base_url.clone(), settings.request_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl AnalysisGateway for HttpGateway {
    fn run(&self, request: &AnalysisRequest) -> Result<Value, GatewayError> {
        let url = request.endpoint(&self.base_url);
        info!(kind = ?request.kind, %url, "posting analysis request");

        let response = self.client.post(&url).json(&request.body).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;

        let outcome = interpret_response(status, &body);
        if let Err(err) = &outcome {
            warn!(kind = ?request.kind, status, error = %err, "analysis request failed");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::sample;

    #[test]
    fn endpoint_joins_slug() {
        let data = sample::generate(20, 1);
        let fields = AnalysisFields::from_dataset(AnalysisKind::KruskalWallis, &data);
        let request = AnalysisRequest::new(&fields, &data);
        assert_eq!(request.kind, AnalysisKind::KruskalWallis);
        assert_eq!(
            request.endpoint("http://localhost:8000/"),
            "http://localhost:8000/api/analysis/kruskal-wallis"
        );
        assert_eq!(request.body["group_col"], "region");
    }

    #[test]
    fn http_gateway_builds_with_timeout() {
        let gateway = HttpGateway::new("http://localhost:8000", Duration::from_secs(5)).unwrap();
        assert_eq!(gateway.base_url(), "http://localhost:8000");
    }
}
