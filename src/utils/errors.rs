use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::store::StoreError;
use crate::utils::logger::LOGGER;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub details: Option<HashMap<String, Vec<String>>>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug)]
pub enum AppError {
    ValidationError(HashMap<String, Vec<String>>),
    NotFound(String),
    Unauthorized(String),
    Conflict(String),
    BadRequest(String),
    UnsupportedMediaType(String),
    PayloadTooLarge(String),
    /// Carries the cause text relayed to the caller under `details.cause`.
    InternalServerError(String),
}

impl AppError {
    /// Single-field validation failure.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = HashMap::new();
        errors.insert(field.to_string(), vec![message.into()]);
        AppError::ValidationError(errors)
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error_type, message, details) = match self {
            AppError::ValidationError(errors) => (
                "VALIDATION_ERROR",
                "Validation failed".to_string(),
                Some(errors),
            ),
            AppError::NotFound(msg) => ("NOT_FOUND", msg, None),
            AppError::Unauthorized(msg) => ("UNAUTHORIZED", msg, None),
            AppError::Conflict(msg) => ("CONFLICT", msg, None),
            AppError::BadRequest(msg) => ("BAD_REQUEST", msg, None),
            AppError::UnsupportedMediaType(msg) => ("UNSUPPORTED_MEDIA_TYPE", msg, None),
            AppError::PayloadTooLarge(msg) => ("PAYLOAD_TOO_LARGE", msg, None),
            AppError::InternalServerError(cause) => {
                let mut context = HashMap::new();
                context.insert(
                    "error_type".to_string(),
                    serde_json::Value::String("internal".to_string()),
                );
                LOGGER.log_error(&cause, context);

                let mut details = HashMap::new();
                details.insert("cause".to_string(), vec![cause]);
                (
                    "INTERNAL_SERVER_ERROR",
                    "An unexpected error occurred".to_string(),
                    Some(details),
                )
            }
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
            timestamp: Utc::now(),
        };

        (status, Json(error_response)).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut error_map = HashMap::new();

        for (field, field_errors) in errors.field_errors() {
            let messages: Vec<String> = field_errors
                .iter()
                .map(|error| {
                    error
                        .message
                        .as_ref()
                        .map(|msg| msg.to_string())
                        .unwrap_or_else(|| format!("Invalid value for field '{}'", field))
                })
                .collect();
            error_map.insert(field.to_string(), messages);
        }

        AppError::ValidationError(error_map)
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(entity) => AppError::NotFound(format!("{} not found", entity)),
            StoreError::Conflict(msg) => AppError::Conflict(msg),
            StoreError::Database(err) => AppError::InternalServerError(err.to_string()),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        AppError::InternalServerError(format!("Storage error: {}", error))
    }
}

fn missing_field_pattern() -> &'static Regex {
    static MISSING: OnceLock<Regex> = OnceLock::new();
    MISSING.get_or_init(|| Regex::new(r"missing field `([^`]+)`").expect("missing field pattern is valid"))
}

fn leading_path_pattern() -> &'static Regex {
    static PATH: OnceLock<Regex> = OnceLock::new();
    PATH.get_or_init(|| {
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)(?:[.\[][^:\s]*)?: ").expect("path pattern is valid")
    })
}

/// Field named by a deserializer message such as
/// "Failed to deserialize ...: missing field `round` at line 1 column 2"
/// or "...: round: invalid type: string". Falls back to `fallback`.
fn rejection_field(body_text: &str, fallback: &str) -> (String, String) {
    let detail = body_text
        .split_once(": ")
        .map(|(_, rest)| rest)
        .unwrap_or(body_text);

    if let Some(captures) = missing_field_pattern().captures(detail) {
        return (captures[1].to_string(), format!("{} is required", &captures[1]));
    }
    if let Some(captures) = leading_path_pattern().captures(detail) {
        let message = detail[captures[0].len()..].to_string();
        return (captures[1].to_string(), message);
    }
    (fallback.to_string(), detail.to_string())
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                let (field, message) = rejection_field(&err.body_text(), "body");
                AppError::invalid_field(&field, message)
            }
            JsonRejection::JsonSyntaxError(err) => AppError::BadRequest(err.body_text()),
            JsonRejection::MissingJsonContentType(err) => {
                AppError::UnsupportedMediaType(err.body_text())
            }
            other if other.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                AppError::PayloadTooLarge(other.body_text())
            }
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        let (field, message) = rejection_field(&rejection.body_text(), "query");
        AppError::invalid_field(&field, message)
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        if rejection.status().is_client_error() {
            AppError::invalid_field("id", rejection.body_text())
        } else {
            AppError::InternalServerError(rejection.body_text())
        }
    }
}
