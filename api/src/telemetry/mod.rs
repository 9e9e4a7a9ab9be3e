/// Telemetry module
///
/// Initializes tracing/logging with structured output and optional Sentry
/// error reporting

use crate::config::{SentryConfig, TelemetryConfig};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. The returned Sentry guard must live as
/// long as the process; dropping it flushes and disables reporting.
pub fn init_telemetry(config: &TelemetryConfig, sentry_config: &SentryConfig) -> Option<sentry::ClientInitGuard> {
    let guard = init_sentry(sentry_config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let sentry_layer = guard.as_ref().map(|_| sentry_tracing::layer());

    let registry = tracing_subscriber::registry().with(env_filter).with(sentry_layer);

    if config.log_format == "json" {
        registry
            .with(fmt::layer().json().flatten_event(true))
            .init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }

    if guard.is_some() {
        tracing::info!(environment = %sentry_config.environment, "Sentry error reporting enabled");
    }
    guard
}

fn init_sentry(config: &SentryConfig) -> Option<sentry::ClientInitGuard> {
    if !config.enabled || config.dsn.trim().is_empty() {
        return None;
    }

    let dsn = match config.dsn.trim().parse::<sentry::types::Dsn>() {
        Ok(dsn) => dsn,
        Err(e) => {
            eprintln!("Ignoring invalid Sentry DSN: {}", e);
            return None;
        }
    };

    let guard = sentry::init(sentry::ClientOptions {
        dsn: Some(dsn),
        release: Some(config.release.clone().into()),
        environment: Some(config.environment.clone().into()),
        traces_sample_rate: config.traces_sample_rate,
        ..Default::default()
    });
    guard.is_enabled().then_some(guard)
}
