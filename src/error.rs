//! Error types for the Bookrent client

use std::collections::BTreeMap;
use std::fmt;

use serde_json::{json, Value};
use thiserror::Error;

/// Per-field validation messages, keyed by field name
pub type FieldErrors = BTreeMap<String, Vec<String>>;

pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";
pub const UNEXPECTED_ERROR_MESSAGE: &str = "An unexpected error occurred.";

/// Failure categories the views react to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response was received
    Network,
    /// 4xx carrying per-field messages
    Validation,
    /// Authorization denied; forces a logout
    Auth,
    /// Any other non-2xx response
    Server,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ErrorKind::Network => "network error",
            ErrorKind::Validation => "validation error",
            ErrorKind::Auth => "authorization denied",
            ErrorKind::Server => "server error",
        };
        f.write_str(label)
    }
}

/// Normalized `{status, data}` failure produced by the HTTP adapter
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind} ({status}): {message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub status: u16,
    pub message: String,
    pub data: Value,
}

impl ApiError {
    /// Classify a non-2xx response
    pub fn from_response(status: u16, data: Value) -> Self {
        let has_field_errors = data.get("errors").map_or(false, Value::is_object);
        let kind = match status {
            401 => ErrorKind::Auth,
            422 => ErrorKind::Validation,
            400..=499 if has_field_errors => ErrorKind::Validation,
            _ => ErrorKind::Server,
        };
        let message = data
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| data.get("error").and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status));

        Self {
            kind,
            status,
            message,
            data,
        }
    }

    /// The request never got a response
    pub fn network() -> Self {
        Self {
            kind: ErrorKind::Network,
            status: 500,
            message: NETWORK_ERROR_MESSAGE.to_string(),
            data: json!({ "message": NETWORK_ERROR_MESSAGE }),
        }
    }

    /// A response arrived but could not be understood
    pub fn unexpected() -> Self {
        Self {
            kind: ErrorKind::Server,
            status: 500,
            message: UNEXPECTED_ERROR_MESSAGE.to_string(),
            data: json!({ "message": UNEXPECTED_ERROR_MESSAGE }),
        }
    }

    pub fn is_auth(&self) -> bool {
        self.kind == ErrorKind::Auth
    }

    /// String member of the response body, if present
    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// Field messages under `errors`, accepting either `[msg]` or a bare `msg` per field
    pub fn field_errors(&self) -> Option<FieldErrors> {
        let errors = self.data.get("errors")?.as_object()?;
        let fields = errors
            .iter()
            .map(|(field, messages)| {
                let messages = match messages {
                    Value::Array(items) => items
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect(),
                    Value::String(msg) => vec![msg.clone()],
                    _ => Vec::new(),
                };
                (field.clone(), messages)
            })
            .collect();
        Some(fields)
    }
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("Validation error: {}", summarize(.0))]
    Validation(FieldErrors),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            AppError::Api(e) => Some(e.kind),
            AppError::Validation(_) => Some(ErrorKind::Validation),
            _ => None,
        }
    }

    /// Field messages from either client-side or server-side validation
    pub fn field_errors(&self) -> Option<FieldErrors> {
        match self {
            AppError::Validation(fields) => Some(fields.clone()),
            AppError::Api(e) if e.kind == ErrorKind::Validation => e.field_errors(),
            _ => None,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, AppError::Api(e) if e.is_auth())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::Validation(field_errors_from(&errors))
    }
}

/// Flatten `validator` output into the same shape the server uses
pub fn field_errors_from(errors: &validator::ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, list)| {
            let messages = list
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

fn summarize(fields: &FieldErrors) -> String {
    fields
        .iter()
        .map(|(field, messages)| format!("{}: {}", field, messages.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unauthorized_is_auth() {
        let err = ApiError::from_response(401, json!({ "message": "Unauthenticated." }));
        assert_eq!(err.kind, ErrorKind::Auth);
        assert_eq!(err.message, "Unauthenticated.");
        assert!(err.is_auth());
    }

    #[test]
    fn test_field_errors_make_validation() {
        let err = ApiError::from_response(
            400,
            json!({ "message": "Invalid", "errors": { "email": ["taken"], "name": "required" } }),
        );
        assert_eq!(err.kind, ErrorKind::Validation);

        let fields = err.field_errors().unwrap();
        assert_eq!(fields["email"], vec!["taken".to_string()]);
        assert_eq!(fields["name"], vec!["required".to_string()]);
    }

    #[test]
    fn test_other_statuses_are_server_errors() {
        let err = ApiError::from_response(404, json!({ "message": "Book not found" }));
        assert_eq!(err.kind, ErrorKind::Server);
        assert!(err.field_errors().is_none());

        let err = ApiError::from_response(503, Value::Null);
        assert_eq!(err.kind, ErrorKind::Server);
        assert_eq!(err.message, "HTTP 503");
    }

    #[test]
    fn test_message_falls_back_to_error_member() {
        let err = ApiError::from_response(400, json!({ "error": "Invalid credentials" }));
        assert_eq!(err.message, "Invalid credentials");
        assert_eq!(err.data_str("error"), Some("Invalid credentials"));
    }

    #[test]
    fn test_network_shape() {
        let err = ApiError::network();
        assert_eq!(err.status, 500);
        assert_eq!(err.data_str("message"), Some(NETWORK_ERROR_MESSAGE));
    }

    #[test]
    fn test_app_error_field_errors() {
        let mut fields = FieldErrors::new();
        fields.insert("title".into(), vec!["Title is required".into()]);
        let err = AppError::Validation(fields);
        assert_eq!(err.kind(), Some(ErrorKind::Validation));
        assert_eq!(err.to_string(), "Validation error: title: Title is required");
    }
}
