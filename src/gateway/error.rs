// src/gateway/error.rs
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

pub const EMBEDDED_ERROR_FALLBACK: &str = "The analysis service reported an error";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// Non-2xx status or an error embedded in a 2xx body.
    #[error("{message}")]
    Request { status: Option<u16>, message: String },
    #[error("Could not reach the analysis service: {0}")]
    Transport(String),
    #[error("Unexpected response from the analysis service: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            GatewayError::Request { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Transport(err.to_string())
    }
}

#[derive(Debug, Deserialize)]
struct DetailItem {
    msg: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Detail {
    Text(String),
    Items(Vec<DetailItem>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorField {
    Text(String),
    Object { message: String },
}

/// The error shapes the service is known to return, most specific first.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorBody {
    Detail(String),
    ValidationItems(Vec<String>),
    Error(String),
    Unrecognized,
}

impl ErrorBody {
    pub fn parse(body: &str) -> Self {
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Self::from_value(&value),
            Err(_) => ErrorBody::Unrecognized,
        }
    }

    pub fn from_value(value: &Value) -> Self {
        if let Some(detail) = value.get("detail") {
            match serde_json::from_value::<Detail>(detail.clone()) {
                Ok(Detail::Text(text)) if !text.trim().is_empty() => return ErrorBody::Detail(text),
                Ok(Detail::Items(items)) => {
                    let messages: Vec<String> = items.into_iter().filter_map(|i| i.msg).collect();
                    if !messages.is_empty() {
                        return ErrorBody::ValidationItems(messages);
                    }
                }
                _ => {}
            }
        }

        if let Some(error) = value.get("error") {
            if let Ok(field) = serde_json::from_value::<ErrorField>(error.clone()) {
                let text = match field {
                    ErrorField::Text(text) => text,
                    ErrorField::Object { message } => message,
                };
                if !text.trim().is_empty() {
                    return ErrorBody::Error(text);
                }
            }
        }

        ErrorBody::Unrecognized
    }

    pub fn message(self) -> Option<String> {
        match self {
            ErrorBody::Detail(text) | ErrorBody::Error(text) => Some(text),
            ErrorBody::ValidationItems(items) => Some(items.join("; ")),
            ErrorBody::Unrecognized => None,
        }
    }
}

pub fn status_fallback(status: u16) -> String {
    format!("Analysis request failed (HTTP {})", status)
}

/// Maps a raw HTTP exchange onto the result JSON or a typed failure.
pub fn interpret_response(status: u16, body: &str) -> Result<Value, GatewayError> {
    if !(200..300).contains(&status) {
        let message = ErrorBody::parse(body).message().unwrap_or_else(|| status_fallback(status));
        return Err(GatewayError::Request { status: Some(status), message });
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| GatewayError::Decode(e.to_string()))?;

    let embedded = value.get("error").map_or(false, |e| !e.is_null() && e != &Value::Bool(false));
    if embedded {
        let message = ErrorBody::from_value(&value)
            .message()
            .unwrap_or_else(|| EMBEDDED_ERROR_FALLBACK.to_string());
        return Err(GatewayError::Request { status: Some(status), message });
    }

    Ok(value)
}
