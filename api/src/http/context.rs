/// Per-request extractors shared by every `/api` handler
use actix_web::{
    dev::Payload, error::QueryPayloadError, http::StatusCode, web, FromRequest, HttpMessage, HttpRequest, HttpResponse,
};
use finboard_auth::SessionClaims;
use finboard_common::{new_request_id, Envelope};
use serde::Serialize;
use std::{
    convert::Infallible,
    future::{ready, Ready},
};

use super::middleware::request_id::RequestIdValue;
use crate::errors::{ApiError, Rejection};

fn request_id_of(req: &HttpRequest) -> String {
    req.extensions()
        .get::<RequestIdValue>()
        .map(|r| r.id.clone())
        .unwrap_or_else(new_request_id)
}

/// The request id assigned by the `RequestId` middleware.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub request_id: String,
}

impl RequestContext {
    /// Render a handler result as the plain envelope.
    pub fn respond<T: Serialize>(&self, result: Result<T, ApiError>) -> HttpResponse {
        self.respond_with(StatusCode::OK, result)
    }

    /// Like [`respond`](Self::respond) with a non-200 success status.
    pub fn respond_with<T: Serialize>(&self, status: StatusCode, result: Result<T, ApiError>) -> HttpResponse {
        match result {
            Ok(data) => HttpResponse::build(status).json(Envelope::ok(&self.request_id, data)),
            Err(e) => e.to_response(&self.request_id),
        }
    }

    pub fn reject(&self, error: ApiError) -> Rejection {
        Rejection::new(error, &self.request_id)
    }
}

impl FromRequest for RequestContext {
    type Error = Infallible;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(RequestContext {
            request_id: request_id_of(req),
        }))
    }
}

/// Verified caller, built from the claims the session middleware attached.
/// Every tenant-scoped query goes through `org_id`.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
    pub org_id: String,
    pub role: Option<String>,
    pub mfa_verified: bool,
}

impl FromRequest for Session {
    type Error = Rejection;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let request_id = request_id_of(req);
        let extensions = req.extensions();

        let Some(claims) = extensions.get::<SessionClaims>() else {
            return ready(Err(Rejection::new(
                ApiError::Unauthorized {
                    reason: "token_missing".to_string(),
                },
                request_id,
            )));
        };

        let Some(org_id) = claims.org() else {
            return ready(Err(Rejection::new(
                ApiError::Forbidden {
                    reason: "no_active_organization".to_string(),
                },
                request_id,
            )));
        };

        ready(Ok(Session {
            user_id: claims.sub.clone(),
            org_id: org_id.to_string(),
            role: claims.org_role.clone(),
            mfa_verified: claims.mfa_verified(),
        }))
    }
}

/// Query-string errors render as the envelope rather than actix's plain text.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: QueryPayloadError, req: &HttpRequest| {
        let reason = match &err {
            QueryPayloadError::Deserialize(e) => e.to_string(),
            other => other.to_string(),
        };
        Rejection::new(
            ApiError::BadRequest {
                reason,
                field: None,
            },
            request_id_of(req),
        )
        .into()
    })
}
