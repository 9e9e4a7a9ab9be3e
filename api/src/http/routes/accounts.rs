use actix_web::{web, HttpResponse};

use crate::app_state::AppState;
use crate::errors::ApiError;
use crate::http::context::{RequestContext, Session};
use crate::repository::Account;

pub async fn list_accounts(ctx: RequestContext, session: Session, state: web::Data<AppState>) -> HttpResponse {
    ctx.respond(load(&session, &state).await)
}

async fn load(session: &Session, state: &AppState) -> Result<Vec<Account>, ApiError> {
    let ledger = state.ledger.as_ref().ok_or_else(|| ApiError::ServiceUnavailable {
        details: "Ledger database is not configured".to_string(),
    })?;
    Ok(ledger.list_accounts(&session.org_id).await?)
}
