use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{self, HeaderName, HeaderValue},
    Error,
};
use futures_util::future::{self, LocalBoxFuture, Ready};
use std::{rc::Rc, sync::Arc};

use crate::config::SecurityConfig;

/// Static response headers, parsed once at startup. Values that are not
/// valid header text are skipped with a warning.
#[derive(Clone)]
pub struct SecurityHeadersMiddleware {
    headers: Arc<Vec<(HeaderName, HeaderValue)>>,
}

impl SecurityHeadersMiddleware {
    pub fn new(config: &SecurityConfig) -> Self {
        let mut candidates = vec![
            (HeaderName::from_static("x-frame-options"), config.frame_options.clone()),
            (
                HeaderName::from_static("x-content-type-options"),
                config.content_type_options.clone(),
            ),
            (header::REFERRER_POLICY, config.referrer_policy.clone()),
            (
                HeaderName::from_static("permissions-policy"),
                config.permissions_policy.clone(),
            ),
        ];
        if config.hsts_enabled {
            candidates.push((
                header::STRICT_TRANSPORT_SECURITY,
                format!("max-age={}; includeSubDomains", config.hsts_max_age_secs),
            ));
        }

        let headers = candidates
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .filter_map(|(name, value)| match HeaderValue::from_str(&value) {
                Ok(v) => Some((name, v)),
                Err(_) => {
                    tracing::warn!(header = %name, "Ignoring invalid security header value");
                    None
                }
            })
            .collect();

        Self {
            headers: Arc::new(headers),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SecurityHeadersMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SecurityHeadersService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        future::ready(Ok(SecurityHeadersService {
            service: Rc::new(service),
            headers: self.headers.clone(),
        }))
    }
}

pub struct SecurityHeadersService<S> {
    service: Rc<S>,
    headers: Arc<Vec<(HeaderName, HeaderValue)>>,
}

impl<S, B> Service<ServiceRequest> for SecurityHeadersService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let headers = self.headers.clone();

        Box::pin(async move {
            let mut response = service.call(req).await?;
            let response_headers = response.headers_mut();
            for (name, value) in headers.iter() {
                response_headers.insert(name.clone(), value.clone());
            }
            Ok(response)
        })
    }
}
