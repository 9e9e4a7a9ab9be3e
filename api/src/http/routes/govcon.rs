use actix_web::{web, HttpResponse};
use finboard_common::{GovConReason, LifecycleResponse, Snapshot};

use crate::app_state::AppState;
use crate::computed::settle;
use crate::computed::snapshots::{govcon_snapshot, GovConSnapshot};
use crate::http::context::{RequestContext, Session};
use crate::infra::backend::UpstreamError;

pub type GovConResponse = LifecycleResponse<GovConReason, Snapshot<GovConSnapshot>>;

pub async fn snapshot(ctx: RequestContext, session: Session, state: web::Data<AppState>) -> HttpResponse {
    let fetched = match state.backend.as_ref() {
        Some(backend) => {
            backend
                .get("/govcon/snapshot", &session.org_id, &ctx.request_id)
                .await
        }
        None => Err(UpstreamError::NotConfigured),
    };

    let response: GovConResponse = settle(&ctx.request_id, govcon_snapshot(fetched));
    HttpResponse::Ok().json(response)
}
