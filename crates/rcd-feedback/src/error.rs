use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::evaluation::Notice;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Input(serde_json::Error),
    /// A finished report could not be serialized for output.
    Output(serde_json::Error),
    /// Report generation failed; carries the notice shown to the evaluator.
    Generation(Notice),
    /// The wizard refused to move forward; carries the blank field names.
    Incomplete(Vec<&'static str>),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Input(err) => write!(f, "invalid evaluation input: {}", err),
            AppError::Output(err) => write!(f, "unable to render report: {}", err),
            AppError::Generation(notice) => write!(f, "{} ({})", notice.message, notice.detail),
            AppError::Incomplete(fields) => {
                write!(f, "evaluation is missing required fields: {}", fields.join(", "))
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Input(err) | AppError::Output(err) => Some(err),
            AppError::Generation(_) | AppError::Incomplete(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Input(_) | AppError::Incomplete(_) => StatusCode::BAD_REQUEST,
            AppError::Generation(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Output(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Input(value)
    }
}

impl From<Notice> for AppError {
    fn from(value: Notice) -> Self {
        Self::Generation(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn json_error() -> serde_json::Error {
        serde_json::from_str::<u8>("not a number").expect_err("invalid json")
    }

    #[test]
    fn input_errors_are_client_errors() {
        let error = AppError::from(json_error());
        assert!(error.to_string().starts_with("invalid evaluation input"));
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn output_errors_are_server_errors() {
        let error = AppError::Output(json_error());
        assert!(error.to_string().starts_with("unable to render report"));
        assert_eq!(
            error.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn incomplete_records_name_missing_fields() {
        let error = AppError::Incomplete(vec!["employee_name", "role"]);
        assert_eq!(
            error.to_string(),
            "evaluation is missing required fields: employee_name, role"
        );
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
