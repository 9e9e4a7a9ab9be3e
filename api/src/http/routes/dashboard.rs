use actix_web::{web, HttpResponse};
use futures_util::future::join3;
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::errors::ApiError;
use crate::http::context::{RequestContext, Session};
use crate::infra::backend::{BackendClient, UpstreamError};

/// Headline counts. A count whose source failed is `None` and its name is
/// listed in `degraded`.
#[derive(Debug, Serialize)]
pub struct DashboardMetrics {
    pub open_invoices: Option<i64>,
    pub unpaid_bills: Option<i64>,
    pub linked_accounts: Option<i64>,
    pub degraded: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
struct CountBody {
    count: i64,
}

async fn backend_count(
    backend: Option<&BackendClient>,
    path: &str,
    org_id: &str,
    request_id: &str,
) -> Result<i64, String> {
    let backend = backend.ok_or_else(|| UpstreamError::NotConfigured.to_string())?;
    let res = backend
        .get(path, org_id, request_id)
        .await
        .map_err(|e| e.to_string())?;
    serde_json::from_value::<CountBody>(res.body)
        .map(|b| b.count)
        .map_err(|e| format!("unexpected count body: {}", e))
}

async fn account_count(state: &AppState, org_id: &str) -> Result<i64, String> {
    let ledger = state
        .ledger
        .as_ref()
        .ok_or_else(|| "ledger database is not configured".to_string())?;
    ledger.count_accounts(org_id).await.map_err(|e| e.to_string())
}

pub async fn metrics(ctx: RequestContext, session: Session, state: web::Data<AppState>) -> HttpResponse {
    let backend = state.backend.as_ref();
    let org_id = session.org_id.as_str();
    let request_id = ctx.request_id.as_str();

    let (invoices, bills, accounts) = join3(
        backend_count(backend, "/invoices/count?status=open", org_id, request_id),
        backend_count(backend, "/bills/count?status=unpaid", org_id, request_id),
        account_count(&state, org_id),
    )
    .await;

    let mut degraded = Vec::new();
    let mut settle = |name: &'static str, result: Result<i64, String>| match result {
        Ok(count) => Some(count),
        Err(e) => {
            tracing::warn!(request_id = %request_id, metric = name, error = %e, "Dashboard metric unavailable");
            degraded.push(name);
            None
        }
    };

    let metrics = DashboardMetrics {
        open_invoices: settle("open_invoices", invoices),
        unpaid_bills: settle("unpaid_bills", bills),
        linked_accounts: settle("linked_accounts", accounts),
        degraded,
    };

    ctx.respond(Ok::<_, ApiError>(metrics))
}
