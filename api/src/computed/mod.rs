/// Computed views: CFO and GovCon snapshots, intelligence insights
///
/// Each view resolves to either its payload or an [`Unavailable`] naming
/// the reason code, which the route turns into a lifecycle response.

pub mod insights;
pub mod snapshots;

use finboard_common::{LifecycleResponse, Payload, ReasonCode};

/// Why a computed view has no payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Unavailable<R> {
    pub reason: R,
    /// Overrides the reason's default description.
    pub message: Option<String>,
}

impl<R> Unavailable<R> {
    pub fn new(reason: R) -> Self {
        Self { reason, message: None }
    }

    pub fn with_message(reason: R, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: Some(message.into()),
        }
    }
}

/// Build the lifecycle response for a resolved view.
pub fn settle<R, P>(request_id: &str, outcome: Result<P::Value, Unavailable<R>>) -> LifecycleResponse<R, P>
where
    R: ReasonCode + std::fmt::Debug,
    P: Payload,
{
    match outcome {
        Ok(value) => LifecycleResponse::success(request_id, value),
        Err(unavailable) => {
            tracing::info!(
                request_id = %request_id,
                reason = ?unavailable.reason,
                message = unavailable.message.as_deref().unwrap_or(""),
                "Computed view unavailable"
            );
            LifecycleResponse::unavailable(request_id, unavailable.reason, unavailable.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finboard_common::{CfoReason, Lifecycle, Snapshot};

    #[test]
    fn settle_success() {
        let resp: LifecycleResponse<CfoReason, Snapshot<u32>> = settle("req_x", Ok(7));
        assert_eq!(resp.lifecycle(), Lifecycle::Success);
        assert!(resp.is_consistent());
    }

    #[test]
    fn settle_unavailable_keeps_message() {
        let resp: LifecycleResponse<CfoReason, Snapshot<u32>> = settle(
            "req_x",
            Err(Unavailable::with_message(CfoReason::SnapshotExpired, "snapshot is 30 hours old")),
        );
        assert_eq!(resp.lifecycle(), Lifecycle::Stale);
        assert_eq!(resp.reason_message(), Some("snapshot is 30 hours old"));
        assert!(resp.is_consistent());
    }
}
