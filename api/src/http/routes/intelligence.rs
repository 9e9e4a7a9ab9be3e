use actix_web::{web, HttpResponse};
use chrono::{Duration, Utc};
use finboard_common::{IntelligenceReason, Items, LifecycleResponse};

use crate::app_state::AppState;
use crate::computed::insights::{build_prompt, parse_insights, Insight, SYSTEM_PROMPT};
use crate::computed::{settle, Unavailable};
use crate::http::context::{RequestContext, Session};
use crate::infra::llm::LlmError;

pub type InsightsResponse = LifecycleResponse<IntelligenceReason, Items<Insight>>;

pub async fn insights(ctx: RequestContext, session: Session, state: web::Data<AppState>) -> HttpResponse {
    let response: InsightsResponse = settle(&ctx.request_id, generate(&session, &state).await);
    HttpResponse::Ok().json(response)
}

async fn generate(session: &Session, state: &AppState) -> Result<Vec<Insight>, Unavailable<IntelligenceReason>> {
    let llm = state.llm.as_ref().ok_or_else(|| {
        Unavailable::with_message(IntelligenceReason::NotConfigured, "no LLM provider is configured")
    })?;
    let ledger = state.ledger.as_ref().ok_or_else(|| {
        Unavailable::with_message(IntelligenceReason::NotConfigured, "the ledger database is not configured")
    })?;

    let until = Utc::now().date_naive();
    let since = until - Duration::days(state.intelligence.lookback_days);

    let transactions = ledger
        .transactions_since(&session.org_id, since)
        .await
        .map_err(|e| {
            tracing::error!(org_id = %session.org_id, error = %e, "Failed to load transactions for insights");
            Unavailable::with_message(IntelligenceReason::ComputationError, "transactions could not be loaded")
        })?;

    let min = state.intelligence.min_transactions;
    if transactions.len() < min {
        return Err(Unavailable::with_message(
            IntelligenceReason::InsufficientData,
            format!(
                "{} transactions in the last {} days; at least {} are needed",
                transactions.len(),
                state.intelligence.lookback_days,
                min
            ),
        ));
    }

    let prompt = build_prompt(&transactions, since, until);
    let reply = llm.complete(SYSTEM_PROMPT, &prompt).await.map_err(|e| match e {
        LlmError::Timeout => Unavailable::new(IntelligenceReason::BackendTimeout),
        LlmError::Transport(_) | LlmError::Status(_) => {
            Unavailable::with_message(IntelligenceReason::UpstreamError, e.to_string())
        }
        LlmError::Malformed(_) => Unavailable::with_message(IntelligenceReason::ComputationError, e.to_string()),
    })?;

    parse_insights(&reply).map_err(|e| Unavailable::with_message(IntelligenceReason::ComputationError, e))
}
