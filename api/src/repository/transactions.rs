use chrono::NaiveDate;
use finboard_reports::TransactionRecord;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: String,
    pub account_id: String,
    pub date: NaiveDate,
    pub name: String,
    pub merchant_name: Option<String>,
    /// Positive for outflows, negative for inflows.
    pub amount: f64,
    pub iso_currency_code: Option<String>,
    pub category: Option<String>,
    pub pending: bool,
}

impl From<&Transaction> for TransactionRecord {
    fn from(tx: &Transaction) -> Self {
        TransactionRecord {
            date: tx.date,
            amount: tx.amount,
            name: tx.name.clone(),
            merchant_name: tx.merchant_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    /// Case-insensitive substring over `name` or `merchant_name`
    pub search: Option<String>,
    pub account_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 100,
            offset: 0,
        }
    }
}

const SELECT_TRANSACTIONS: &str = "SELECT id::text AS id, account_id::text AS account_id, date, name, merchant_name, \
     amount::float8 AS amount, iso_currency_code, category, pending \
     FROM transactions WHERE org_id = ";

/// Escape LIKE metacharacters so user input matches literally.
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

pub async fn list(
    pool: &PgPool,
    org_id: &str,
    filter: &TransactionFilter,
    page: Pagination,
) -> Result<Vec<Transaction>, sqlx::Error> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_TRANSACTIONS);
    query.push_bind(org_id);

    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = like_pattern(term);
        query.push(" AND (name ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR merchant_name ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }

    if let Some(ref account_id) = filter.account_id {
        query.push(" AND account_id::text = ");
        query.push_bind(account_id);
    }

    if let Some(start) = filter.start_date {
        query.push(" AND date >= ");
        query.push_bind(start);
    }

    if let Some(end) = filter.end_date {
        query.push(" AND date <= ");
        query.push_bind(end);
    }

    query.push(" ORDER BY date DESC, id DESC LIMIT ");
    query.push_bind(page.limit);
    query.push(" OFFSET ");
    query.push_bind(page.offset);

    query
        .build_query_as::<Transaction>()
        .fetch_all(pool)
        .await
}

/// All settled and pending transactions on or after `since`, oldest first.
pub async fn since(pool: &PgPool, org_id: &str, since: NaiveDate) -> Result<Vec<Transaction>, sqlx::Error> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_TRANSACTIONS);
    query.push_bind(org_id);
    query.push(" AND date >= ");
    query.push_bind(since);
    query.push(" ORDER BY date ASC");

    query
        .build_query_as::<Transaction>()
        .fetch_all(pool)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("netflix"), "%netflix%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn record_conversion_keeps_detector_fields() {
        let tx = Transaction {
            id: "t1".into(),
            account_id: "a1".into(),
            date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            name: "NETFLIX.COM".into(),
            merchant_name: Some("Netflix".into()),
            amount: 15.49,
            iso_currency_code: Some("USD".into()),
            category: None,
            pending: false,
        };
        let record = TransactionRecord::from(&tx);
        assert_eq!(record.date, tx.date);
        assert_eq!(record.amount, 15.49);
        assert_eq!(record.merchant_name.as_deref(), Some("Netflix"));
    }
}
