//! Error types for the API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cadenza_controller::ControllerError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// API error types following RFC 7807 Problem Details.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400) - malformed upload or form
    BadRequest(String),

    /// Validation error (400) - specific field validation failed
    ValidationError {
        /// The field that failed validation
        field: String,
        /// The validation error message
        message: String,
    },

    /// Internal server error (500)
    InternalError(String),

    /// A generation request failed inside the controller
    Generation(ControllerError),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            Self::ValidationError { field, message } => {
                write!(f, "Validation Error [field: {}]: {}", field, message)
            }
            Self::InternalError(msg) => write!(f, "Internal Error: {}", msg),
            Self::Generation(err) => write!(f, "{}: {}", err.kind(), err),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<ControllerError> for ApiError {
    fn from(err: ControllerError) -> Self {
        Self::Generation(err)
    }
}

/// RFC 7807 Problem Details response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProblemDetails {
    /// URI reference identifying the problem type
    #[serde(rename = "type")]
    pub type_uri: String,

    /// Short, human-readable summary
    pub title: String,

    /// HTTP status code
    pub status: u16,

    /// Error kind, e.g. `UnknownModelError`
    pub kind: String,

    /// Human-readable explanation
    pub detail: String,

    /// Model the failing request named
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Generation stage that failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,

    /// Field-specific validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<serde_json::Value>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::ValidationError { .. } => StatusCode::BAD_REQUEST,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Generation(err) => match err {
                ControllerError::UnknownModel { .. } => StatusCode::NOT_FOUND,
                ControllerError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
                ControllerError::PipelineSelection { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    fn problem(&self) -> ProblemDetails {
        let status = self.status();
        let title = status.canonical_reason().unwrap_or("Error");

        let (kind, model, stage, errors) = match self {
            Self::BadRequest(_) => ("BadRequest".to_string(), None, None, None),
            Self::ValidationError { field, message } => (
                "ValidationError".to_string(),
                None,
                None,
                Some(serde_json::json!({ field: message })),
            ),
            Self::InternalError(_) => ("InternalError".to_string(), None, None, None),
            Self::Generation(err) => (
                err.kind().to_string(),
                Some(err.model().to_string()),
                err.stage().map(|s| s.to_string()),
                None,
            ),
        };

        let detail = match self {
            Self::BadRequest(msg) | Self::InternalError(msg) => msg.clone(),
            Self::ValidationError { field, message } => format!("Field '{}': {}", field, message),
            Self::Generation(err) => err.to_string(),
        };

        ProblemDetails {
            type_uri: format!("/errors/{}", title.to_lowercase().replace(' ', "-")),
            title: title.to_string(),
            status: status.as_u16(),
            kind,
            detail,
            model,
            stage,
            errors,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, "Request rejected");
        }
        (status, Json(self.problem())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_controller_error_statuses() {
        let unknown = ApiError::from(ControllerError::UnknownModel { model: "x".into() });
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

        let selection = ApiError::from(ControllerError::PipelineSelection {
            model: "x".into(),
            message: "no keyword".into(),
        });
        assert_eq!(selection.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let generation = ApiError::from(ControllerError::Generation {
            model: "x".into(),
            message: "boom".into(),
        });
        assert_eq!(generation.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_problem_carries_kind_and_stage() {
        let err = ApiError::from(ControllerError::Postprocess {
            model: "MORTM4.1-SAX".into(),
            message: "missing output".into(),
        });
        let problem = err.problem();

        assert_eq!(problem.kind, "PostprocessError");
        assert_eq!(problem.stage.as_deref(), Some("POSTPROCESSING"));
        assert_eq!(problem.model.as_deref(), Some("MORTM4.1-SAX"));
        assert_eq!(problem.status, 500);
        assert_eq!(problem.type_uri, "/errors/internal-server-error");
    }

    #[test]
    fn test_validation_problem_lists_field() {
        let err = ApiError::ValidationError {
            field: "tempo".into(),
            message: "must be positive".into(),
        };
        let problem = err.problem();
        assert_eq!(problem.status, 400);
        assert_eq!(problem.errors, Some(serde_json::json!({"tempo": "must be positive"})));
    }
}
