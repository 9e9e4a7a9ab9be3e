/// Error handling module
///
/// Maps handler failures onto HTTP statuses and the `{ok, data, error,
/// request_id}` envelope. Computed routes never use these: their failures
/// are lifecycle responses.
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use finboard_common::{Envelope, ErrorBody};
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;

use crate::infra::backend::UpstreamError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {reason}")]
    BadRequest {
        reason: String,
        field: Option<String>,
    },
    #[error("Unauthorized: {reason}")]
    Unauthorized { reason: String },
    #[error("Forbidden: {reason}")]
    Forbidden { reason: String },
    #[error("Not found: {resource}")]
    NotFound { resource: String },
    #[error("Upstream error: {details}")]
    Upstream {
        details: String,
        upstream_status: Option<u16>,
    },
    #[error("Upstream timed out")]
    UpstreamTimeout,
    #[error("Service unavailable: {details}")]
    ServiceUnavailable { details: String },
    #[error("Internal error: {reason}")]
    Internal { reason: String },
}

impl ApiError {
    pub fn bad_request(field: &str, reason: impl Into<String>) -> Self {
        ApiError::BadRequest {
            reason: reason.into(),
            field: Some(field.to_string()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ApiError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Envelope error body. Internal details are logged, not returned.
    pub fn body(&self) -> ErrorBody {
        match self {
            ApiError::BadRequest { reason, field } => {
                let body = ErrorBody::new("bad_request", reason.clone());
                match field {
                    Some(field) => body.with_details(json!({ "field": field })),
                    None => body,
                }
            }
            ApiError::Unauthorized { reason } => ErrorBody::new("unauthorized", "Authentication required")
                .with_details(json!({ "reason": reason })),
            ApiError::Forbidden { reason } => ErrorBody::new("forbidden", "Access denied")
                .with_details(json!({ "reason": reason })),
            ApiError::NotFound { resource } => ErrorBody::new("not_found", format!("{} not found", resource)),
            ApiError::Upstream { upstream_status, .. } => {
                let body = ErrorBody::new("upstream_error", "The backend service returned an error");
                match upstream_status {
                    Some(status) => body.with_details(json!({ "upstream_status": status })),
                    None => body,
                }
            }
            ApiError::UpstreamTimeout => ErrorBody::new("upstream_timeout", "The backend service did not answer in time"),
            ApiError::ServiceUnavailable { details } => ErrorBody::new("service_unavailable", details.clone()),
            ApiError::Internal { .. } => ErrorBody::new("internal", "Internal server error"),
        }
    }

    /// Full error envelope for `request_id`, logging server-side failures.
    pub fn to_response(&self, request_id: &str) -> HttpResponse {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(request_id = %request_id, error = %self, "Request failed");
        } else {
            tracing::debug!(request_id = %request_id, error = %self, "Request rejected");
        }
        HttpResponse::build(status).json(Envelope::<Value>::err(request_id, self.body()))
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Internal {
            reason: format!("database: {}", e),
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::NotConfigured => ApiError::ServiceUnavailable {
                details: "Backend service is not configured".to_string(),
            },
            UpstreamError::Timeout => ApiError::UpstreamTimeout,
            UpstreamError::Status { status, body } if (400..500).contains(&status) && status != 401 && status != 403 => {
                ApiError::BadRequest {
                    reason: body
                        .as_ref()
                        .and_then(|b| b.get("message").or_else(|| b.get("error")))
                        .and_then(Value::as_str)
                        .unwrap_or("Rejected by backend service")
                        .to_string(),
                    field: None,
                }
            }
            UpstreamError::Status { status, .. } => ApiError::Upstream {
                details: format!("status {}", status),
                upstream_status: Some(status),
            },
            other => ApiError::Upstream {
                details: other.to_string(),
                upstream_status: None,
            },
        }
    }
}

/// An [`ApiError`] bound to the request it rejected, so extractor failures
/// still render the envelope with the right `request_id`.
#[derive(Debug)]
pub struct Rejection {
    pub error: ApiError,
    pub request_id: String,
}

impl Rejection {
    pub fn new(error: ApiError, request_id: impl Into<String>) -> Self {
        Self {
            error,
            request_id: request_id.into(),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (request {})", self.error, self.request_id)
    }
}

impl ResponseError for Rejection {
    fn status_code(&self) -> StatusCode {
        self.error.status()
    }

    fn error_response(&self) -> HttpResponse {
        self.error.to_response(&self.request_id)
    }
}
