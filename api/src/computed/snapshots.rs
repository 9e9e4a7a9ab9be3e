// Backend snapshot reading and lifecycle mapping for the CFO and GovCon views

use chrono::{DateTime, Duration, Utc};
use finboard_common::{CfoReason, GovConReason, ReasonCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Unavailable;
use crate::infra::backend::{BackendResponse, UpstreamError};

/// Reason codes every backend-computed view can report.
pub trait UpstreamReason: ReasonCode {
    const NOT_CONFIGURED: Self;
    const TIMEOUT: Self;
    const UNAVAILABLE: Self;
    const COMPUTATION_ERROR: Self;
    const IN_PROGRESS: Self;
    const INSUFFICIENT_DATA: Self;
}

impl UpstreamReason for CfoReason {
    const NOT_CONFIGURED: Self = CfoReason::NotConfigured;
    const TIMEOUT: Self = CfoReason::BackendTimeout;
    const UNAVAILABLE: Self = CfoReason::BackendUnavailable;
    const COMPUTATION_ERROR: Self = CfoReason::ComputationError;
    const IN_PROGRESS: Self = CfoReason::ComputationInProgress;
    const INSUFFICIENT_DATA: Self = CfoReason::InsufficientData;
}

impl UpstreamReason for GovConReason {
    const NOT_CONFIGURED: Self = GovConReason::NotConfigured;
    const TIMEOUT: Self = GovConReason::BackendTimeout;
    const UNAVAILABLE: Self = GovConReason::BackendUnavailable;
    const COMPUTATION_ERROR: Self = GovConReason::ComputationError;
    const IN_PROGRESS: Self = GovConReason::ComputationInProgress;
    const INSUFFICIENT_DATA: Self = GovConReason::InsufficientData;
}

/// Backend body: `{ "status": "...", "snapshot": {...} }`
pub fn read_snapshot<R, T>(fetched: Result<BackendResponse, UpstreamError>) -> Result<T, Unavailable<R>>
where
    R: UpstreamReason,
    T: DeserializeOwned,
{
    let response = match fetched {
        Ok(response) => response,
        Err(UpstreamError::NotConfigured) => return Err(Unavailable::new(R::NOT_CONFIGURED)),
        Err(UpstreamError::Timeout) => return Err(Unavailable::new(R::TIMEOUT)),
        Err(UpstreamError::Unreachable(e)) => {
            return Err(Unavailable::with_message(R::UNAVAILABLE, format!("backend unreachable: {}", e)))
        }
        Err(UpstreamError::Status { status, .. }) if status >= 500 => {
            return Err(Unavailable::with_message(
                R::UNAVAILABLE,
                format!("backend returned status {}", status),
            ))
        }
        Err(UpstreamError::Status { status: 401 | 403, .. }) => {
            return Err(Unavailable::with_message(
                R::NOT_CONFIGURED,
                "backend rejected this service's credentials",
            ))
        }
        Err(UpstreamError::Status { status: 404, .. }) => {
            return Err(Unavailable::with_message(
                R::INSUFFICIENT_DATA,
                "no snapshot exists for this organization yet",
            ))
        }
        Err(UpstreamError::Status { status, .. }) => {
            return Err(Unavailable::with_message(
                R::COMPUTATION_ERROR,
                format!("backend returned status {}", status),
            ))
        }
        Err(UpstreamError::Decode(e)) => {
            return Err(Unavailable::with_message(
                R::COMPUTATION_ERROR,
                format!("backend body could not be decoded: {}", e),
            ))
        }
    };

    if response.status == 202 {
        return Err(Unavailable::new(R::IN_PROGRESS));
    }

    // Status decides before the snapshot shape is looked at: a computing
    // backend may send a partial snapshot.
    let mut body = response.body;
    match body.get("status").and_then(Value::as_str) {
        Some("computing" | "pending" | "queued") => return Err(Unavailable::new(R::IN_PROGRESS)),
        Some("insufficient_data") => return Err(Unavailable::new(R::INSUFFICIENT_DATA)),
        Some("failed" | "error") => return Err(Unavailable::new(R::COMPUTATION_ERROR)),
        _ => {}
    }

    let snapshot = match body.get_mut("snapshot").map(Value::take) {
        Some(Value::Null) | None => {
            return Err(Unavailable::with_message(R::COMPUTATION_ERROR, "backend returned no snapshot"))
        }
        Some(snapshot) => snapshot,
    };

    serde_json::from_value(snapshot).map_err(|e| {
        Unavailable::with_message(R::COMPUTATION_ERROR, format!("snapshot has an unexpected shape: {}", e))
    })
}

/// Month-to-date CFO figures. A figure the backend could not compute stays
/// `None`; it is never reported as zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CfoSnapshot {
    pub as_of: DateTime<Utc>,
    pub currency: String,
    pub cash_on_hand: Option<f64>,
    pub monthly_burn: Option<f64>,
    pub runway_months: Option<f64>,
    pub revenue_mtd: Option<f64>,
    pub expenses_mtd: Option<f64>,
    pub accounts_receivable: Option<f64>,
    pub accounts_payable: Option<f64>,
}

pub fn cfo_snapshot(
    fetched: Result<BackendResponse, UpstreamError>,
    now: DateTime<Utc>,
    stale_after: Duration,
) -> Result<CfoSnapshot, Unavailable<CfoReason>> {
    let snapshot: CfoSnapshot = read_snapshot(fetched)?;

    let age = now - snapshot.as_of;
    if age > stale_after {
        return Err(Unavailable::with_message(
            CfoReason::SnapshotExpired,
            format!("latest snapshot is {} hours old", age.num_hours()),
        ));
    }

    Ok(snapshot)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkStatus {
    pub framework: String,
    pub controls_total: u32,
    pub controls_met: u32,
    /// `controls_met / controls_total`, absent when no controls are defined
    #[serde(default)]
    pub coverage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GovConSnapshot {
    pub as_of: DateTime<Utc>,
    pub active_contracts: u32,
    pub evidence_count: u32,
    pub open_findings: u32,
    #[serde(default)]
    pub frameworks: Vec<FrameworkStatus>,
}

pub fn govcon_snapshot(
    fetched: Result<BackendResponse, UpstreamError>,
) -> Result<GovConSnapshot, Unavailable<GovConReason>> {
    let mut snapshot: GovConSnapshot = read_snapshot(fetched)?;

    if snapshot.evidence_count == 0 {
        return Err(Unavailable::new(GovConReason::NoEvidenceUploaded));
    }

    for framework in &mut snapshot.frameworks {
        framework.coverage = (framework.controls_total > 0)
            .then(|| f64::from(framework.controls_met) / f64::from(framework.controls_total));
    }

    Ok(snapshot)
}
