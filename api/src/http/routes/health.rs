/// Health check routes

use actix_web::{http::StatusCode, web, HttpResponse, Responder};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::app_state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyResponse {
    ready: bool,
    checks: BTreeMap<&'static str, CheckResult>,
}

#[derive(Serialize)]
struct CheckResult {
    enabled: bool,
    ok: bool,
    details: String,
}

impl CheckResult {
    fn disabled() -> Self {
        Self {
            enabled: false,
            ok: true,
            details: "not configured".to_string(),
        }
    }

    fn from_result<E: std::fmt::Display>(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self {
                enabled: true,
                ok: true,
                details: "reachable".to_string(),
            },
            Err(e) => Self {
                enabled: true,
                ok: false,
                details: e.to_string(),
            },
        }
    }
}

/// Liveness only: the process is up and serving.
pub async fn healthz() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse { status: "ok" })
}

pub async fn readyz(state: web::Data<AppState>) -> impl Responder {
    let mut checks = BTreeMap::new();

    let postgres = match state.ledger.as_ref() {
        Some(ledger) => CheckResult::from_result(ledger.ping().await),
        None => CheckResult::disabled(),
    };
    checks.insert("postgres", postgres);

    let backend = match state.backend.as_ref() {
        Some(backend) => CheckResult::from_result(backend.ping().await),
        None => CheckResult::disabled(),
    };
    checks.insert("backend", backend);

    // The provider is not called here; a test completion would spend tokens.
    let llm = match state.llm.as_ref() {
        Some(llm) => CheckResult {
            enabled: true,
            ok: true,
            details: format!("configured ({})", llm.model()),
        },
        None => CheckResult::disabled(),
    };
    checks.insert("llm", llm);

    let ready = checks.values().all(|c| c.ok);
    if !ready {
        tracing::warn!("Readiness check failed");
    }

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    HttpResponse::build(status).json(ReadyResponse { ready, checks })
}
