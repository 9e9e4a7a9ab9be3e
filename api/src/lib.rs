// finboard API service
//
// Tenant-scoped HTTP API in front of the ledger database, the reporting
// backend and the LLM provider.

pub mod app_state;
pub mod computed;
pub mod config;
pub mod errors;
pub mod http;
pub mod infra;
pub mod openapi;
pub mod repository;
pub mod telemetry;
