use std::sync::Arc;

use finboard_api::app_state::AppState;
use finboard_api::config::load_config;
use finboard_api::http;
use finboard_api::infra::{backend::BackendClient, llm::LlmClient, postgres};
use finboard_api::repository::{LedgerStore, PgLedgerStore};
use finboard_api::telemetry::init_telemetry;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if exists
    let _ = dotenvy::dotenv();

    // Load configuration
    let config = load_config().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::process::exit(1);
    });

    // Held for the life of the process
    let _sentry_guard = init_telemetry(&config.telemetry, &config.sentry);

    tracing::info!(environment = %config.service.environment, "Configuration loaded");
    if !config.auth.enabled {
        tracing::warn!(
            environment = %config.service.environment,
            dev_org_id = config.auth.dev_org_id.as_deref().unwrap_or(""),
            "Session authentication is DISABLED; /api requests run as the development identity"
        );
    }

    tracing::info!("Initializing integrations...");

    let pg_pool = postgres::init_postgres(&config.integrations).await;
    let ledger = pg_pool
        .clone()
        .map(|pool| Arc::new(PgLedgerStore::new(pool)) as Arc<dyn LedgerStore>);

    let backend = BackendClient::from_config(&config.backend).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build backend client");
        std::process::exit(1);
    });
    let llm = LlmClient::from_config(&config.llm).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to build LLM client");
        std::process::exit(1);
    });

    let app_state = AppState::new(config.service.clone())
        .with_ledger(ledger)
        .with_backend(backend)
        .with_llm(llm)
        .with_cfo(config.cfo.clone())
        .with_intelligence(config.intelligence.clone())
        .with_reports(config.reports.clone());

    // actix handles SIGINT/SIGTERM and drains in-flight requests
    let result = http::start_server(config, app_state).await;
    if let Err(ref e) = result {
        tracing::error!(error = %e, "Server error");
    }

    if let Some(pool) = pg_pool {
        tracing::info!("Closing PostgreSQL connection pool");
        pool.close().await;
    }

    tracing::info!("Shutdown complete");
    result
}
