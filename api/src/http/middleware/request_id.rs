/// Request ID middleware
///
/// Assigns every request a fresh server-generated id, exposes it to
/// handlers through request extensions and stamps it on the response.
/// A client-supplied id is kept only for log correlation.
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error, HttpMessage,
};
use finboard_common::new_request_id;
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    str::FromStr,
};

const DEFAULT_HEADER: &str = "x-request-id";

pub struct RequestId {
    header_name: HeaderName,
}

impl RequestId {
    pub fn new(header_name: &str) -> Self {
        let header_name = HeaderName::from_str(header_name).unwrap_or_else(|_| {
            tracing::warn!(header = %header_name, "Invalid request id header name, using x-request-id");
            HeaderName::from_static(DEFAULT_HEADER)
        });
        Self { header_name }
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self {
            header_name: HeaderName::from_static(DEFAULT_HEADER),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequestId
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestIdMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestIdMiddleware {
            service: Rc::new(service),
            header_name: self.header_name.clone(),
        }))
    }
}

pub struct RequestIdMiddleware<S> {
    service: Rc<S>,
    header_name: HeaderName,
}

impl<S, B> Service<ServiceRequest> for RequestIdMiddleware<S>
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
        let client_supplied = req
            .headers()
            .get(&self.header_name)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.chars().take(128).collect::<String>());

        let id = new_request_id();
        req.extensions_mut().insert(RequestIdValue {
            id: id.clone(),
            client_supplied,
        });

        let service = self.service.clone();
        let header_name = self.header_name.clone();

        Box::pin(async move {
            let mut res = service.call(req).await?;
            if let Ok(value) = HeaderValue::from_str(&id) {
                res.headers_mut().insert(header_name, value);
            }
            Ok(res)
        })
    }
}

#[derive(Debug, Clone)]
pub struct RequestIdValue {
    pub id: String,
    /// Id sent by the caller, if any. Never echoed back.
    pub client_supplied: Option<String>,
}
