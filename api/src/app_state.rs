/// Application state

use std::sync::Arc;

use crate::config::{CfoConfig, IntelligenceConfig, ReportsConfig, ServiceConfig};
use crate::infra::{backend::BackendClient, llm::LlmClient};
use crate::repository::LedgerStore;

#[derive(Clone)]
pub struct AppState {
    pub service_config: ServiceConfig,
    pub ledger: Option<Arc<dyn LedgerStore>>,
    pub backend: Option<BackendClient>,
    pub llm: Option<LlmClient>,
    pub cfo: CfoConfig,
    pub intelligence: IntelligenceConfig,
    pub reports: ReportsConfig,
}

impl AppState {
    pub fn new(service_config: ServiceConfig) -> Self {
        Self {
            service_config,
            ledger: None,
            backend: None,
            llm: None,
            cfo: CfoConfig::default(),
            intelligence: IntelligenceConfig::default(),
            reports: ReportsConfig::default(),
        }
    }

    pub fn with_ledger(mut self, ledger: Option<Arc<dyn LedgerStore>>) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn with_backend(mut self, backend: Option<BackendClient>) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_llm(mut self, llm: Option<LlmClient>) -> Self {
        self.llm = llm;
        self
    }

    pub fn with_cfo(mut self, cfo: CfoConfig) -> Self {
        self.cfo = cfo;
        self
    }

    pub fn with_intelligence(mut self, intelligence: IntelligenceConfig) -> Self {
        self.intelligence = intelligence;
        self
    }

    pub fn with_reports(mut self, reports: ReportsConfig) -> Self {
        self.reports = reports;
        self
    }
}
