/// Ledger database pool

use crate::config::IntegrationsConfig;
use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};
use std::time::Duration;

/// Open the ledger pool. `None` leaves ledger routes answering 503 and
/// readiness reporting the database as not configured.
pub async fn init_postgres(config: &IntegrationsConfig) -> Option<PgPool> {
    if !config.enable_postgres {
        tracing::info!("Ledger database disabled");
        return None;
    }

    if config.database_url.trim().is_empty() {
        tracing::warn!("Ledger database enabled but database_url is empty");
        return None;
    }

    let options: PgConnectOptions = match config.database_url.parse() {
        Ok(options) => options,
        Err(e) => {
            // The raw URL may hold a password; only the parse error is logged.
            tracing::error!(error = %e, "Invalid database_url");
            return None;
        }
    };

    tracing::info!(
        host = %options.get_host(),
        port = options.get_port(),
        database = options.get_database().unwrap_or("(default)"),
        max_connections = config.pg_max_connections,
        acquire_timeout_ms = config.pg_connect_timeout_ms,
        "Connecting to ledger database"
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.pg_max_connections)
        .acquire_timeout(Duration::from_millis(config.pg_connect_timeout_ms))
        .idle_timeout(Duration::from_millis(config.pg_idle_timeout_ms))
        .connect_with(options)
        .await;

    match pool {
        Ok(pool) => Some(pool),
        Err(e) => {
            tracing::error!(error = %e, "Ledger database unreachable; ledger routes will answer 503");
            None
        }
    }
}

pub async fn check_postgres_health(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}
