/// Session authentication middleware
///
/// Verifies the identity provider's session token before any handler runs
/// and attaches the verified claims to the request.

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::{header, Method},
    Error, HttpMessage,
};
use ed25519_dalek::VerifyingKey;
use finboard_auth::{
    bearer_token, cookie_value, decode_verifying_key, verify_session_token, AuthError, SessionClaims,
    SESSION_COOKIE,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
};

use super::request_id::RequestIdValue;
use crate::config::AuthConfig;
use crate::errors::ApiError;

#[derive(Clone)]
pub struct SessionAuth {
    config: AuthConfig,
    key: Option<VerifyingKey>,
}

impl SessionAuth {
    /// Fails when auth is enabled without a usable verification key.
    pub fn new(config: AuthConfig) -> Result<Self, AuthError> {
        let key = if config.enabled {
            Some(decode_verifying_key(&config.session_public_key)?)
        } else {
            tracing::warn!("Session authentication disabled; requests run as the configured dev identity");
            None
        };
        Ok(Self { config, key })
    }
}

/// `path` equals `prefix` or continues it with a new segment.
fn under_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionAuthMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionAuthMiddleware {
            service: Rc::new(service),
            config: self.config.clone(),
            key: self.key,
        }))
    }
}

pub struct SessionAuthMiddleware<S> {
    service: Rc<S>,
    config: AuthConfig,
    key: Option<VerifyingKey>,
}

impl<S> SessionAuthMiddleware<S> {
    fn is_bypassed(&self, path: &str) -> bool {
        self.config.bypass_paths.iter().any(|bp| path == bp)
    }

    fn is_protected(&self, path: &str) -> bool {
        self.config.protect_prefixes.iter().any(|prefix| under_prefix(path, prefix))
    }

    fn requires_mfa(&self, path: &str) -> bool {
        self.config
            .mfa_required_prefixes
            .iter()
            .any(|prefix| under_prefix(path, prefix))
    }

    fn dev_claims(&self) -> Option<SessionClaims> {
        let org_id = self.config.dev_org_id.clone()?;
        Some(SessionClaims {
            sub: self.config.dev_user_id.clone(),
            org_id: Some(org_id),
            org_role: Some("org:admin".to_string()),
            iat: 0,
            nbf: None,
            exp: i64::MAX,
            fva: Some([0, 0]),
        })
    }
}

fn session_token(req: &ServiceRequest) -> Option<String> {
    if let Some(token) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
    {
        return Some(token.to_string());
    }

    req.headers()
        .get_all(header::COOKIE)
        .filter_map(|h| h.to_str().ok())
        .find_map(|cookies| cookie_value(cookies, SESSION_COOKIE))
        .map(str::to_string)
}

fn reject<B>(req: ServiceRequest, error: ApiError) -> LocalBoxFuture<'static, Result<ServiceResponse<EitherBody<B>>, Error>>
where
    B: 'static,
{
    let request_id = req
        .extensions()
        .get::<RequestIdValue>()
        .map(|r| r.id.clone())
        .unwrap_or_else(|| "unknown".to_string());
    let response = error.to_response(&request_id);
    let (req, _) = req.into_parts();
    Box::pin(async move { Ok(ServiceResponse::new(req, response).map_into_right_body()) })
}

impl<S, B> Service<ServiceRequest> for SessionAuthMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // Percent-decoded path, the same one the router matches on.
        let path = req.match_info().as_str().to_string();

        let key = match self.key {
            Some(key) => key,
            None => {
                if let Some(claims) = self.dev_claims() {
                    req.extensions_mut().insert(claims);
                }
                let service = self.service.clone();
                return Box::pin(async move {
                    let res = service.call(req).await?;
                    Ok(res.map_into_left_body())
                });
            }
        };

        // Preflight, bypassed and public paths
        if req.method() == Method::OPTIONS || self.is_bypassed(&path) || !self.is_protected(&path) {
            let service = self.service.clone();
            return Box::pin(async move {
                let res = service.call(req).await?;
                Ok(res.map_into_left_body())
            });
        }

        let now = chrono::Utc::now().timestamp();
        let verified = session_token(&req)
            .ok_or(AuthError::Missing)
            .and_then(|token| verify_session_token(&token, &key, now, self.config.leeway_secs));

        let claims = match verified {
            Ok(claims) => claims,
            Err(e) => {
                tracing::warn!(path = %path, reason = e.reason(), error = %e, "Session rejected");
                return reject(
                    req,
                    ApiError::Unauthorized {
                        reason: e.reason().to_string(),
                    },
                );
            }
        };

        if self.requires_mfa(&path) && !claims.mfa_verified() {
            tracing::warn!(path = %path, user_id = %claims.sub, "Second factor required");
            return reject(
                req,
                ApiError::Forbidden {
                    reason: "mfa_required".to_string(),
                },
            );
        }

        tracing::debug!(
            user_id = %claims.sub,
            org_id = claims.org().unwrap_or(""),
            path = %path,
            "Session verified"
        );
        req.extensions_mut().insert(claims);

        let service = self.service.clone();
        Box::pin(async move {
            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_matching_is_segment_aware() {
        assert!(under_prefix("/api", "/api"));
        assert!(under_prefix("/api/transactions", "/api"));
        assert!(under_prefix("/api/payroll/runs", "/api/payroll/"));
        assert!(!under_prefix("/api-docs/openapi.json", "/api"));
        assert!(!under_prefix("/healthz", "/api"));
    }

    #[test]
    fn prefixes_see_the_decoded_path() {
        let req = actix_web::test::TestRequest::get()
            .uri("/api/%70ayroll/runs")
            .to_srv_request();
        assert!(under_prefix(req.match_info().as_str(), "/api/payroll"));
    }

    #[test]
    fn enabled_without_key_fails() {
        let config = AuthConfig::default();
        assert!(SessionAuth::new(config).is_err());
    }

    #[test]
    fn disabled_needs_no_key() {
        let config = AuthConfig {
            enabled: false,
            ..AuthConfig::default()
        };
        assert!(SessionAuth::new(config).is_ok());
    }
}
