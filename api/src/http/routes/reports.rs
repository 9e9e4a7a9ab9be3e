use actix_web::{web, HttpResponse};
use chrono::{Duration, Utc};
use finboard_reports::{detect_recurring, DetectorConfig, RecurringSeries, TransactionRecord};
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::errors::ApiError;
use crate::http::context::{RequestContext, Session};

const MIN_LOOKBACK_DAYS: i64 = 30;
const MAX_LOOKBACK_DAYS: i64 = 730;

#[derive(Debug, Deserialize)]
pub struct RecurringQuery {
    pub lookback_days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct RecurringReport {
    pub lookback_days: i64,
    pub transactions_analyzed: usize,
    pub series: Vec<RecurringSeries>,
}

pub async fn recurring(
    ctx: RequestContext,
    session: Session,
    query: web::Query<RecurringQuery>,
    state: web::Data<AppState>,
) -> HttpResponse {
    ctx.respond(build(&session, query.into_inner(), &state).await)
}

async fn build(session: &Session, query: RecurringQuery, state: &AppState) -> Result<RecurringReport, ApiError> {
    let lookback_days = query.lookback_days.unwrap_or(state.reports.default_lookback_days);
    if !(MIN_LOOKBACK_DAYS..=MAX_LOOKBACK_DAYS).contains(&lookback_days) {
        return Err(ApiError::bad_request(
            "lookback_days",
            format!(
                "lookback_days must be between {} and {}",
                MIN_LOOKBACK_DAYS, MAX_LOOKBACK_DAYS
            ),
        ));
    }

    let ledger = state.ledger.as_ref().ok_or_else(|| ApiError::ServiceUnavailable {
        details: "Ledger database is not configured".to_string(),
    })?;

    let since = Utc::now().date_naive() - Duration::days(lookback_days);
    let transactions = ledger.transactions_since(&session.org_id, since).await?;
    let records: Vec<TransactionRecord> = transactions.iter().map(TransactionRecord::from).collect();

    let config = DetectorConfig {
        min_confidence: state.reports.min_confidence,
        ..DetectorConfig::default()
    };
    let series = detect_recurring(&records, &config);

    tracing::debug!(
        org_id = %session.org_id,
        transactions = records.len(),
        series = series.len(),
        "Recurring detection finished"
    );

    Ok(RecurringReport {
        lookback_days,
        transactions_analyzed: records.len(),
        series,
    })
}
