use crate::config::ConfigError;
use crate::donation::store::{MalformedIdentifier, StoreError};
use crate::donation::validate::ValidationError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationError),
    MalformedId(MalformedIdentifier),
    NotFound { what: &'static str },
    Store(StoreError),
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
}

impl ApiError {
    pub fn not_found(what: &'static str) -> Self {
        Self::NotFound { what }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Validation(err) => write!(f, "{}", err),
            ApiError::MalformedId(err) => write!(f, "{}", err),
            ApiError::NotFound { what } => write!(f, "{} not found", what),
            ApiError::Store(err) => write!(f, "store error: {}", err),
            ApiError::Config(err) => write!(f, "configuration error: {}", err),
            ApiError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            ApiError::Io(err) => write!(f, "io error: {}", err),
            ApiError::Server(err) => write!(f, "server error: {}", err),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::Validation(err) => Some(err),
            ApiError::MalformedId(err) => Some(err),
            ApiError::NotFound { .. } => None,
            ApiError::Store(err) => Some(err),
            ApiError::Config(err) => Some(err),
            ApiError::Telemetry(err) => Some(err),
            ApiError::Io(err) => Some(err),
            ApiError::Server(err) => Some(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(err) => {
                let body = Json(json!({ "error": err.to_string(), "fields": err.errors }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::MalformedId(err) => {
                let body = Json(json!({ "error": err.to_string() }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            ApiError::NotFound { what } => {
                let body = Json(json!({ "error": format!("{what} not found") }));
                (StatusCode::NOT_FOUND, body).into_response()
            }
            other => {
                let body = Json(json!({ "error": other.to_string() }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<MalformedIdentifier> for ApiError {
    fn from(value: MalformedIdentifier) -> Self {
        Self::MalformedId(value)
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<ConfigError> for ApiError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for ApiError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for ApiError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for ApiError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}
