use actix_web::{web, HttpResponse};
use chrono::{Duration, Utc};
use finboard_common::{CfoReason, LifecycleResponse, Snapshot};

use crate::app_state::AppState;
use crate::computed::settle;
use crate::computed::snapshots::{cfo_snapshot, CfoSnapshot};
use crate::http::context::{RequestContext, Session};
use crate::infra::backend::UpstreamError;

pub type CfoResponse = LifecycleResponse<CfoReason, Snapshot<CfoSnapshot>>;

/// Always 200: backend trouble is reported through the lifecycle.
pub async fn snapshot(ctx: RequestContext, session: Session, state: web::Data<AppState>) -> HttpResponse {
    let fetched = match state.backend.as_ref() {
        Some(backend) => {
            backend
                .get("/cfo/snapshot", &session.org_id, &ctx.request_id)
                .await
        }
        None => Err(UpstreamError::NotConfigured),
    };

    let outcome = cfo_snapshot(fetched, Utc::now(), Duration::seconds(state.cfo.stale_after_secs));
    let response: CfoResponse = settle(&ctx.request_id, outcome);
    HttpResponse::Ok().json(response)
}
