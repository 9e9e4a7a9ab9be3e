#![allow(dead_code)]

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{Duration, NaiveDate, Utc};
use ed25519_dalek::SigningKey;
use finboard_api::config::AuthConfig;
use finboard_api::repository::{Account, LedgerStore, Pagination, Transaction, TransactionFilter};
use finboard_auth::{encode_session_token, SessionClaims};

pub const ORG: &str = "org_acme";
pub const OTHER_ORG: &str = "org_globex";

/// Build the full middleware stack around `routes::configure`, in the same
/// order as the server.
#[macro_export]
macro_rules! test_app {
    ($state:expr) => {
        test_app!($state, $crate::common::auth_config())
    };
    ($state:expr, $auth:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($state))
                .wrap(finboard_api::http::middleware::session_auth::SessionAuth::new($auth).unwrap())
                .wrap(finboard_api::http::middleware::logger::Logger)
                .wrap(finboard_api::http::middleware::security_headers::SecurityHeadersMiddleware::new(
                    &finboard_api::config::SecurityConfig::default(),
                ))
                .wrap(finboard_api::http::middleware::request_id::RequestId::default())
                .configure(finboard_api::http::routes::configure),
        )
        .await
    };
}

pub fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[7u8; 32])
}

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        session_public_key: STANDARD.encode(signing_key().verifying_key().to_bytes()),
        ..AuthConfig::default()
    }
}

pub fn claims(org: Option<&str>, mfa: bool) -> SessionClaims {
    let now = Utc::now().timestamp();
    SessionClaims {
        sub: "user_1".to_string(),
        org_id: org.map(str::to_string),
        org_role: Some("org:admin".to_string()),
        iat: now,
        nbf: None,
        exp: now + 3600,
        fva: Some([3, if mfa { 3 } else { -1 }]),
    }
}

pub fn token_for(claims: &SessionClaims) -> String {
    encode_session_token(claims, &signing_key())
}

/// Bearer header value for a verified member of `ORG` with MFA.
pub fn bearer() -> String {
    format!("Bearer {}", token_for(&claims(Some(ORG), true)))
}

pub fn days_ago(days: i64) -> NaiveDate {
    Utc::now().date_naive() - Duration::days(days)
}

pub fn transaction(id: &str, date: NaiveDate, name: &str, merchant: Option<&str>, amount: f64) -> Transaction {
    Transaction {
        id: id.to_string(),
        account_id: "acc_checking".to_string(),
        date,
        name: name.to_string(),
        merchant_name: merchant.map(str::to_string),
        amount,
        iso_currency_code: Some("USD".to_string()),
        category: None,
        pending: false,
    }
}

pub fn account(id: &str, name: &str) -> Account {
    Account {
        id: id.to_string(),
        name: name.to_string(),
        official_name: None,
        account_type: Some("depository".to_string()),
        subtype: Some("checking".to_string()),
        mask: Some("0042".to_string()),
        current_balance: Some(1520.33),
        available_balance: None,
        iso_currency_code: Some("USD".to_string()),
        institution_name: Some("First Bank".to_string()),
    }
}

/// In-memory ledger keyed by organization.
#[derive(Default)]
pub struct FakeLedger {
    pub accounts: Vec<(String, Account)>,
    pub transactions: Vec<(String, Transaction)>,
    pub broken: bool,
}

impl FakeLedger {
    pub fn with_account(mut self, org: &str, account: Account) -> Self {
        self.accounts.push((org.to_string(), account));
        self
    }

    pub fn with_transaction(mut self, org: &str, tx: Transaction) -> Self {
        self.transactions.push((org.to_string(), tx));
        self
    }

    pub fn broken() -> Self {
        Self {
            broken: true,
            ..Self::default()
        }
    }

    fn check(&self) -> Result<(), sqlx::Error> {
        if self.broken {
            Err(sqlx::Error::PoolTimedOut)
        } else {
            Ok(())
        }
    }

    fn org_transactions(&self, org_id: &str) -> Vec<Transaction> {
        self.transactions
            .iter()
            .filter(|(org, _)| org == org_id)
            .map(|(_, tx)| tx.clone())
            .collect()
    }
}

#[async_trait]
impl LedgerStore for FakeLedger {
    async fn list_accounts(&self, org_id: &str) -> Result<Vec<Account>, sqlx::Error> {
        self.check()?;
        Ok(self
            .accounts
            .iter()
            .filter(|(org, _)| org == org_id)
            .map(|(_, a)| a.clone())
            .collect())
    }

    async fn count_accounts(&self, org_id: &str) -> Result<i64, sqlx::Error> {
        Ok(self.list_accounts(org_id).await?.len() as i64)
    }

    async fn list_transactions(
        &self,
        org_id: &str,
        filter: &TransactionFilter,
        page: Pagination,
    ) -> Result<Vec<Transaction>, sqlx::Error> {
        self.check()?;
        let needle = filter.search.as_deref().map(str::to_lowercase);
        let mut rows: Vec<Transaction> = self
            .org_transactions(org_id)
            .into_iter()
            .filter(|tx| match &needle {
                Some(n) => {
                    tx.name.to_lowercase().contains(n)
                        || tx
                            .merchant_name
                            .as_deref()
                            .map(|m| m.to_lowercase().contains(n))
                            .unwrap_or(false)
                }
                None => true,
            })
            .filter(|tx| filter.account_id.as_deref().map_or(true, |a| tx.account_id == a))
            .filter(|tx| filter.start_date.map_or(true, |d| tx.date >= d))
            .filter(|tx| filter.end_date.map_or(true, |d| tx.date <= d))
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.id.cmp(&a.id)));
        Ok(rows
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn transactions_since(&self, org_id: &str, since: NaiveDate) -> Result<Vec<Transaction>, sqlx::Error> {
        self.check()?;
        let mut rows: Vec<Transaction> = self
            .org_transactions(org_id)
            .into_iter()
            .filter(|tx| tx.date >= since)
            .collect();
        rows.sort_by_key(|tx| tx.date);
        Ok(rows)
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        self.check()
    }
}
