use actix_web::{web, HttpResponse};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::app_state::AppState;
use crate::errors::ApiError;
use crate::http::context::{RequestContext, Session};
use crate::repository::{Pagination, Transaction, TransactionFilter};

const MAX_LIMIT: u32 = 500;
const MAX_SEARCH_LEN: usize = 100;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub account_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default = "default_limit")]
    pub limit: u32, // 1..=500
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    100
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub items: Vec<Transaction>,
    pub page: PageInfo,
}

#[derive(Debug, Serialize)]
pub struct PageInfo {
    pub limit: u32,
    pub offset: u32,
    pub has_more: bool,
}

fn validate_query(query: &ListQuery) -> Result<(), ApiError> {
    if query.limit < 1 || query.limit > MAX_LIMIT {
        return Err(ApiError::bad_request(
            "limit",
            format!("limit must be between 1 and {}", MAX_LIMIT),
        ));
    }

    if let Some(ref search) = query.search {
        if search.chars().count() > MAX_SEARCH_LEN {
            return Err(ApiError::bad_request(
                "search",
                format!("search must be at most {} characters", MAX_SEARCH_LEN),
            ));
        }
    }

    if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        if start > end {
            return Err(ApiError::bad_request("start_date", "start_date must be <= end_date"));
        }
    }

    Ok(())
}

pub async fn list_transactions(
    ctx: RequestContext,
    session: Session,
    query: web::Query<ListQuery>,
    state: web::Data<AppState>,
) -> HttpResponse {
    ctx.respond(load(&session, query.into_inner(), &state).await)
}

async fn load(session: &Session, query: ListQuery, state: &AppState) -> Result<ListResponse, ApiError> {
    validate_query(&query)?;

    let ledger = state.ledger.as_ref().ok_or_else(|| ApiError::ServiceUnavailable {
        details: "Ledger database is not configured".to_string(),
    })?;

    let filter = TransactionFilter {
        search: query.search.clone(),
        account_id: query.account_id.clone(),
        start_date: query.start_date,
        end_date: query.end_date,
    };

    // One extra row tells us whether another page exists.
    let page = Pagination {
        limit: i64::from(query.limit) + 1,
        offset: i64::from(query.offset),
    };

    let mut items = ledger.list_transactions(&session.org_id, &filter, page).await?;
    let has_more = items.len() > query.limit as usize;
    items.truncate(query.limit as usize);

    Ok(ListResponse {
        items,
        page: PageInfo {
            limit: query.limit,
            offset: query.offset,
            has_more,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> ListQuery {
        ListQuery {
            search: None,
            account_id: None,
            start_date: None,
            end_date: None,
            limit: 100,
            offset: 0,
        }
    }

    #[test]
    fn limit_bounds() {
        assert!(validate_query(&query()).is_ok());
        assert!(validate_query(&ListQuery { limit: 0, ..query() }).is_err());
        assert!(validate_query(&ListQuery { limit: 501, ..query() }).is_err());
        assert!(validate_query(&ListQuery { limit: 500, ..query() }).is_ok());
    }

    #[test]
    fn date_range_must_be_ordered() {
        let q = ListQuery {
            start_date: NaiveDate::from_ymd_opt(2025, 2, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 1),
            ..query()
        };
        assert!(validate_query(&q).is_err());
    }

    #[test]
    fn overlong_search_rejected() {
        let q = ListQuery {
            search: Some("x".repeat(101)),
            ..query()
        };
        assert!(validate_query(&q).is_err());
    }
}
