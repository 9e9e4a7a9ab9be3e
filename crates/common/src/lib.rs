// Shared response contract for the finboard API
//
// Every route answers with either a plain `Envelope` or, for computed
// views, a `LifecycleResponse` that reports its own trustworthiness.

pub mod envelope;
pub mod lifecycle;
pub mod reasons;
pub mod request_id;

pub use envelope::{Envelope, ErrorBody};
pub use lifecycle::{Items, Lifecycle, LifecycleResponse, Payload, ReasonCode, Snapshot, Unsettled};
pub use reasons::{CfoReason, GovConReason, IntelligenceReason};
pub use request_id::new_request_id;
