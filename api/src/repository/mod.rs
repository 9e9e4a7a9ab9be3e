// Repository layer for tenant ledger data
// Every query is scoped by organization id

pub mod accounts;
pub mod transactions;

pub use accounts::Account;
pub use transactions::{Pagination, Transaction, TransactionFilter};

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use crate::infra::postgres;

/// Read access to a tenant's linked accounts and transactions.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn list_accounts(&self, org_id: &str) -> Result<Vec<Account>, sqlx::Error>;

    async fn count_accounts(&self, org_id: &str) -> Result<i64, sqlx::Error>;

    async fn list_transactions(
        &self,
        org_id: &str,
        filter: &TransactionFilter,
        page: Pagination,
    ) -> Result<Vec<Transaction>, sqlx::Error>;

    /// Transactions dated on or after `since`, oldest first
    async fn transactions_since(&self, org_id: &str, since: NaiveDate) -> Result<Vec<Transaction>, sqlx::Error>;

    async fn ping(&self) -> Result<(), sqlx::Error>;
}

pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn list_accounts(&self, org_id: &str) -> Result<Vec<Account>, sqlx::Error> {
        accounts::list(&self.pool, org_id).await
    }

    async fn count_accounts(&self, org_id: &str) -> Result<i64, sqlx::Error> {
        accounts::count(&self.pool, org_id).await
    }

    async fn list_transactions(
        &self,
        org_id: &str,
        filter: &TransactionFilter,
        page: Pagination,
    ) -> Result<Vec<Transaction>, sqlx::Error> {
        transactions::list(&self.pool, org_id, filter, page).await
    }

    async fn transactions_since(&self, org_id: &str, since: NaiveDate) -> Result<Vec<Transaction>, sqlx::Error> {
        transactions::since(&self.pool, org_id, since).await
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        postgres::check_postgres_health(&self.pool).await
    }
}
