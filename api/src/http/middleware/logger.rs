/// Access log middleware
///
/// One structured line per request. Runs outside session auth, so the
/// tenant and user are read from the finished request when available.
use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error, HttpMessage,
};
use finboard_auth::SessionClaims;
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
    time::Instant,
};

use super::request_id::RequestIdValue;

pub struct Logger;

impl<S, B> Transform<S, ServiceRequest> for Logger
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = LoggerMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LoggerMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct LoggerMiddleware<S> {
    service: Rc<S>,
}

struct AccessLine {
    request_id: String,
    client_request_id: Option<String>,
    method: String,
    path: String,
    remote_addr: String,
    started: Instant,
}

impl AccessLine {
    fn emit(&self, status: u16, org_id: &str, user_id: &str) {
        let duration_ms = self.started.elapsed().as_millis() as u64;
        let client_request_id = self.client_request_id.as_deref().unwrap_or("");

        macro_rules! access_line {
            ($level:ident) => {
                tracing::$level!(
                    request_id = %self.request_id,
                    client_request_id,
                    method = %self.method,
                    path = %self.path,
                    status,
                    duration_ms,
                    remote_addr = %self.remote_addr,
                    org_id,
                    user_id,
                    "HTTP request"
                )
            };
        }

        if status >= 500 {
            access_line!(error);
        } else if status >= 400 {
            access_line!(warn);
        } else {
            access_line!(info);
        }
    }
}

impl<S, B> Service<ServiceRequest> for LoggerMiddleware<S>
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
        let (request_id, client_request_id) = req
            .extensions()
            .get::<RequestIdValue>()
            .map(|r| (r.id.clone(), r.client_supplied.clone()))
            .unwrap_or_else(|| ("unknown".to_string(), None));

        let line = AccessLine {
            request_id,
            client_request_id,
            method: req.method().to_string(),
            path: req.path().to_string(),
            remote_addr: req
                .connection_info()
                .peer_addr()
                .unwrap_or("unknown")
                .to_string(),
            started: Instant::now(),
        };

        let service = self.service.clone();

        Box::pin(async move {
            let res = service.call(req).await?;

            let (org_id, user_id) = res
                .request()
                .extensions()
                .get::<SessionClaims>()
                .map(|c| (c.org().unwrap_or("").to_string(), c.sub.clone()))
                .unwrap_or_default();
            line.emit(res.status().as_u16(), &org_id, &user_id);

            Ok(res)
        })
    }
}
