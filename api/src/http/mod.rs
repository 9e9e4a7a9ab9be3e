/// HTTP server module

pub mod context;
pub mod middleware;
pub mod routes;

use actix_cors::Cors;
use actix_web::{http, web, App, HttpServer};
use std::io;

use crate::app_state::AppState;
use crate::config::{Config, SecurityConfig};
use middleware::{
    logger::Logger, request_id::RequestId, security_headers::SecurityHeadersMiddleware,
    session_auth::SessionAuth,
};

fn build_cors(security: &SecurityConfig) -> Cors {
    let mut cors = Cors::default();
    for origin in &security.cors_allowed_origins {
        if origin == "*" {
            cors = cors.allow_any_origin();
            break;
        } else {
            cors = cors.allowed_origin(origin);
        }
    }

    let methods: Vec<http::Method> = security
        .cors_allowed_methods
        .iter()
        .filter_map(|m| m.parse::<http::Method>().ok())
        .collect();
    cors = cors.allowed_methods(methods);

    if security.cors_allowed_headers.iter().any(|h| h == "*") {
        cors = cors.allow_any_header();
    } else {
        cors = cors.allowed_headers(
            security
                .cors_allowed_headers
                .iter()
                .filter_map(|h| h.parse::<http::header::HeaderName>().ok())
                .collect::<Vec<_>>(),
        );
    }

    cors.expose_headers(vec![http::header::HeaderName::from_static("x-request-id")])
        .max_age(600)
}

pub async fn start_server(config: Config, app_state: AppState) -> io::Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    tracing::info!(
        service_name = %config.service.name,
        service_version = %config.service.version,
        bind_addr = %bind_addr,
        auth_enabled = config.auth.enabled,
        log_level = %config.telemetry.log_level,
        log_format = %config.telemetry.log_format,
        "Starting HTTP server"
    );

    let session_auth = SessionAuth::new(config.auth.clone()).map_err(|e| {
        tracing::error!(error = %e, "Session verifier misconfigured");
        io::Error::new(io::ErrorKind::InvalidInput, e)
    })?;

    let app_state = web::Data::new(app_state);
    let security_headers = SecurityHeadersMiddleware::new(&config.security);
    let security = config.security.clone();
    let request_id_header = config.telemetry.request_id_header.clone();
    let body_limit = config.server.request_body_limit_bytes;

    let mut server = HttpServer::new(move || {
        // Outermost last: RequestId, CORS, SecurityHeaders, Logger, SessionAuth
        App::new()
            .app_data(app_state.clone())
            .app_data(web::PayloadConfig::new(body_limit))
            .wrap(session_auth.clone())
            .wrap(Logger)
            .wrap(security_headers.clone())
            .wrap(build_cors(&security))
            .wrap(RequestId::new(&request_id_header))
            .configure(routes::configure)
    });

    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server.bind(&bind_addr)?.run().await
}
