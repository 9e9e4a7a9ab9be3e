/// Outbound integrations: Postgres pool, backend service, LLM provider

pub mod backend;
pub mod llm;
pub mod postgres;
