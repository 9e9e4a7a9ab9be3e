/// Configuration module
///
/// Loads configuration from TOML files and environment variables.
/// Priority: ENV > TOML > defaults
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub integrations: IntegrationsConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub intelligence: IntelligenceConfig,
    #[serde(default)]
    pub cfo: CfoConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub sentry: SentryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default = "default_service_version")]
    pub version: String,
    /// Name of the `configs/<env>` directory in use; set by `load_config`
    #[serde(default = "default_environment")]
    pub environment: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_body_limit")]
    pub request_body_limit_bytes: usize,
    /// 0 lets actix pick one worker per core
    #[serde(default)]
    pub workers: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_format")]
    pub log_format: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_request_id_header")]
    pub request_id_header: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Identity provider's Ed25519 session key, base58 or base64
    #[serde(default)]
    pub session_public_key: String,
    #[serde(default = "default_leeway_secs")]
    pub leeway_secs: i64,
    #[serde(default = "default_bypass_paths")]
    pub bypass_paths: Vec<String>,
    #[serde(default = "default_protect_prefixes")]
    pub protect_prefixes: Vec<String>,
    #[serde(default = "default_mfa_required_prefixes")]
    pub mfa_required_prefixes: Vec<String>,
    /// Identity attached to requests when auth is disabled (local development)
    #[serde(default)]
    pub dev_org_id: Option<String>,
    #[serde(default = "default_dev_user_id")]
    pub dev_user_id: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IntegrationsConfig {
    #[serde(default = "default_true")]
    pub enable_postgres: bool,
    #[serde(default)]
    pub database_url: String,
    #[serde(default = "default_pg_max_connections")]
    pub pg_max_connections: u32,
    #[serde(default = "default_pg_connect_timeout_ms")]
    pub pg_connect_timeout_ms: u64,
    #[serde(default = "default_pg_idle_timeout_ms")]
    pub pg_idle_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// Empty disables every backend-proxied route
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub service_token: Option<String>,
    #[serde(default = "default_backend_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_llm_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_llm_api_version")]
    pub api_version: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IntelligenceConfig {
    #[serde(default = "default_intelligence_lookback_days")]
    pub lookback_days: i64,
    #[serde(default = "default_min_transactions")]
    pub min_transactions: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CfoConfig {
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportsConfig {
    #[serde(default = "default_reports_lookback_days")]
    pub default_lookback_days: i64,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecurityConfig {
    #[serde(default)]
    pub hsts_enabled: bool,
    #[serde(default = "default_hsts_max_age_secs")]
    pub hsts_max_age_secs: u64,
    #[serde(default = "default_frame_options")]
    pub frame_options: String,
    #[serde(default = "default_content_type_options")]
    pub content_type_options: String,
    #[serde(default = "default_referrer_policy")]
    pub referrer_policy: String,
    #[serde(default = "default_permissions_policy")]
    pub permissions_policy: String,
    #[serde(default = "default_cors_allowed_origins")]
    pub cors_allowed_origins: Vec<String>,
    #[serde(default = "default_cors_allowed_methods")]
    pub cors_allowed_methods: Vec<String>,
    #[serde(default = "default_cors_allowed_headers")]
    pub cors_allowed_headers: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SentryConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub dsn: String,
    #[serde(default = "default_sentry_environment")]
    pub environment: String,
    #[serde(default = "default_service_version")]
    pub release: String,
    #[serde(default = "default_traces_sample_rate")]
    pub traces_sample_rate: f32,
}

// Defaults
fn default_service_name() -> String {
    "finboard-api".to_string()
}

fn default_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_request_body_limit() -> usize {
    262_144 // 256 KiB
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_request_id_header() -> String {
    "x-request-id".to_string()
}

fn default_true() -> bool {
    true
}

fn default_leeway_secs() -> i64 {
    5
}

fn default_bypass_paths() -> Vec<String> {
    vec![
        "/healthz".to_string(),
        "/readyz".to_string(),
        "/version".to_string(),
    ]
}

fn default_protect_prefixes() -> Vec<String> {
    vec!["/api".to_string()]
}

fn default_mfa_required_prefixes() -> Vec<String> {
    vec!["/api/payroll".to_string()]
}

fn default_dev_user_id() -> String {
    "user_local_dev".to_string()
}

fn default_pg_max_connections() -> u32 {
    10
}

fn default_pg_connect_timeout_ms() -> u64 {
    3000
}

fn default_pg_idle_timeout_ms() -> u64 {
    300000
}

fn default_backend_timeout_ms() -> u64 {
    10_000
}

fn default_llm_base_url() -> String {
    "https://api.anthropic.com".to_string()
}

fn default_llm_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}

fn default_llm_max_tokens() -> u32 {
    1024
}

fn default_llm_timeout_ms() -> u64 {
    60_000
}

fn default_llm_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_intelligence_lookback_days() -> i64 {
    90
}

fn default_min_transactions() -> usize {
    10
}

fn default_stale_after_secs() -> i64 {
    86_400
}

fn default_reports_lookback_days() -> i64 {
    365
}

fn default_min_confidence() -> f64 {
    0.5
}

fn default_hsts_max_age_secs() -> u64 {
    31_536_000
}

fn default_frame_options() -> String {
    "DENY".to_string()
}

fn default_content_type_options() -> String {
    "nosniff".to_string()
}

fn default_referrer_policy() -> String {
    "strict-origin-when-cross-origin".to_string()
}

fn default_permissions_policy() -> String {
    "camera=(), microphone=(), geolocation=()".to_string()
}

fn default_cors_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_cors_allowed_methods() -> Vec<String> {
    vec![
        "GET".to_string(),
        "POST".to_string(),
        "OPTIONS".to_string(),
    ]
}

fn default_cors_allowed_headers() -> Vec<String> {
    vec![
        "authorization".to_string(),
        "content-type".to_string(),
        "x-request-id".to_string(),
    ]
}

fn default_sentry_environment() -> String {
    "development".to_string()
}

fn default_traces_sample_rate() -> f32 {
    0.0
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            version: default_service_version(),
            environment: default_environment(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_body_limit_bytes: default_request_body_limit(),
            workers: 0,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_format: default_log_format(),
            log_level: default_log_level(),
            request_id_header: default_request_id_header(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            session_public_key: String::new(),
            leeway_secs: default_leeway_secs(),
            bypass_paths: default_bypass_paths(),
            protect_prefixes: default_protect_prefixes(),
            mfa_required_prefixes: default_mfa_required_prefixes(),
            dev_org_id: None,
            dev_user_id: default_dev_user_id(),
        }
    }
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            enable_postgres: true,
            database_url: String::new(),
            pg_max_connections: default_pg_max_connections(),
            pg_connect_timeout_ms: default_pg_connect_timeout_ms(),
            pg_idle_timeout_ms: default_pg_idle_timeout_ms(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            service_token: None,
            timeout_ms: default_backend_timeout_ms(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            max_tokens: default_llm_max_tokens(),
            timeout_ms: default_llm_timeout_ms(),
            api_version: default_llm_api_version(),
        }
    }
}

impl Default for IntelligenceConfig {
    fn default() -> Self {
        Self {
            lookback_days: default_intelligence_lookback_days(),
            min_transactions: default_min_transactions(),
        }
    }
}

impl Default for CfoConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

impl Default for ReportsConfig {
    fn default() -> Self {
        Self {
            default_lookback_days: default_reports_lookback_days(),
            min_confidence: default_min_confidence(),
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            hsts_enabled: false,
            hsts_max_age_secs: default_hsts_max_age_secs(),
            frame_options: default_frame_options(),
            content_type_options: default_content_type_options(),
            referrer_policy: default_referrer_policy(),
            permissions_policy: default_permissions_policy(),
            cors_allowed_origins: default_cors_allowed_origins(),
            cors_allowed_methods: default_cors_allowed_methods(),
            cors_allowed_headers: default_cors_allowed_headers(),
        }
    }
}

impl Default for SentryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dsn: String::new(),
            environment: default_sentry_environment(),
            release: default_service_version(),
            traces_sample_rate: default_traces_sample_rate(),
        }
    }
}

/// Environment variables override files with the APP__ prefix
fn environment_source() -> config::Environment {
    config::Environment::with_prefix("APP")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("auth.bypass_paths")
        .with_list_parse_key("auth.protect_prefixes")
        .with_list_parse_key("auth.mfa_required_prefixes")
        .with_list_parse_key("security.cors_allowed_origins")
        .with_list_parse_key("security.cors_allowed_methods")
        .with_list_parse_key("security.cors_allowed_headers")
        .try_parsing(true)
}

pub fn load_config() -> Result<Config, config::ConfigError> {
    let env = env::var("APP__ENV").unwrap_or_else(|_| default_environment());

    let mut builder = config::Config::builder();

    // Try to load TOML file, but don't fail if it doesn't exist
    let config_path = format!("configs/{}/default", env);
    if std::path::Path::new(&format!("{}.toml", config_path)).exists() {
        builder = builder.add_source(config::File::with_name(&config_path).required(false));
    }

    builder = builder.add_source(environment_source());

    let mut config: Config = builder.build()?.try_deserialize()?;
    config.service.environment = env;
    config.validate()?;
    Ok(config)
}

/// `value` must lie in `min..=max`.
fn check_range<T>(key: &str, value: T, min: T, max: T) -> Result<(), config::ConfigError>
where
    T: PartialOrd + std::fmt::Display,
{
    if value < min || value > max {
        return Err(config::ConfigError::Message(format!(
            "{} must be between {} and {}, got {}",
            key, min, max, value
        )));
    }
    Ok(())
}

impl Config {
    /// Reject values that would invert or overflow date windows.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        check_range("auth.leeway_secs", self.auth.leeway_secs, 0, 300)?;
        check_range("intelligence.lookback_days", self.intelligence.lookback_days, 1, 730)?;
        check_range("intelligence.min_transactions", self.intelligence.min_transactions, 1, 100_000)?;
        check_range("cfo.stale_after_secs", self.cfo.stale_after_secs, 60, 31_536_000)?;
        check_range("reports.default_lookback_days", self.reports.default_lookback_days, 30, 730)?;
        check_range("reports.min_confidence", self.reports.min_confidence, 0.0, 1.0)?;
        Ok(())
    }
}
