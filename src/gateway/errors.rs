//! HTTP-facing errors of the gateway and their translation from RPC outcomes.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use crate::rpc::CallError;

/// Field-specific validation failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Rejected at the boundary; never reaches the authentication service.
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Structured error from the authentication service, surfaced as-is.
    #[error("{message}")]
    Upstream { status: StatusCode, message: String },

    #[error("Authentication service timed out")]
    GatewayTimeout,

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Upstream { status, .. } => *status,
            ApiError::GatewayTimeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CallError> for ApiError {
    fn from(err: CallError) -> Self {
        match err {
            CallError::Remote(remote) => match StatusCode::from_u16(remote.status) {
                Ok(status) if status.is_client_error() || status.is_server_error() => {
                    ApiError::Upstream {
                        status,
                        message: remote.message,
                    }
                }
                _ => {
                    error!(status = remote.status, "remote error with unusable status");
                    ApiError::Internal
                }
            },
            CallError::Timeout => {
                error!("authentication service timed out");
                ApiError::GatewayTimeout
            }
            CallError::Transport(e) | CallError::Malformed(e) => {
                error!(error = %e, "authentication service call failed");
                ApiError::Internal
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| FieldError {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", error.code)),
                })
            })
            .collect();
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::Validation(fields)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(vec![FieldError {
            field: "body".into(),
            message: rejection.body_text(),
        }])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = json!({
            "statusCode": status.as_u16(),
            "message": self.to_string(),
            "error": status.canonical_reason().unwrap_or("Error"),
        });
        if let ApiError::Validation(fields) = &self {
            body["errors"] = json!(fields);
        }
        (status, Json(body)).into_response()
    }
}
