use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Linked bank account. Balances stay `None` when the aggregator did not
/// report them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub official_name: Option<String>,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub account_type: Option<String>,
    pub subtype: Option<String>,
    pub mask: Option<String>,
    pub current_balance: Option<f64>,
    pub available_balance: Option<f64>,
    pub iso_currency_code: Option<String>,
    pub institution_name: Option<String>,
}

pub async fn list(pool: &PgPool, org_id: &str) -> Result<Vec<Account>, sqlx::Error> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id::text AS id, name, official_name, type, subtype, mask,
               current_balance::float8 AS current_balance,
               available_balance::float8 AS available_balance,
               iso_currency_code, institution_name
        FROM accounts
        WHERE org_id = $1
        ORDER BY institution_name NULLS LAST, name
        "#,
    )
    .bind(org_id)
    .fetch_all(pool)
    .await
}

pub async fn count(pool: &PgPool, org_id: &str) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts WHERE org_id = $1")
        .bind(org_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}
