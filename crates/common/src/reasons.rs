// Reason codes per computed domain

use serde::{Deserialize, Serialize};

use crate::lifecycle::{ReasonCode, Unsettled};

/// Why a CFO snapshot is not `success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CfoReason {
    InsufficientData,
    ComputationError,
    BackendTimeout,
    BackendUnavailable,
    NotConfigured,
    ComputationInProgress,
    SnapshotExpired,
}

impl ReasonCode for CfoReason {
    fn lifecycle(self) -> Unsettled {
        match self {
            CfoReason::ComputationInProgress => Unsettled::Pending,
            CfoReason::SnapshotExpired => Unsettled::Stale,
            _ => Unsettled::Failed,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            CfoReason::InsufficientData => "Not enough ledger history to compute a CFO snapshot",
            CfoReason::ComputationError => "The CFO snapshot could not be computed",
            CfoReason::BackendTimeout => "The reporting backend did not answer in time",
            CfoReason::BackendUnavailable => "The reporting backend is unavailable",
            CfoReason::NotConfigured => "CFO reporting is not configured for this deployment",
            CfoReason::ComputationInProgress => "The CFO snapshot is still being computed",
            CfoReason::SnapshotExpired => "The latest CFO snapshot is too old to display",
        }
    }
}

/// Why a GovCon compliance snapshot is not `success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GovConReason {
    InsufficientData,
    ComputationError,
    BackendTimeout,
    BackendUnavailable,
    NotConfigured,
    ComputationInProgress,
    NoEvidenceUploaded,
}

impl ReasonCode for GovConReason {
    fn lifecycle(self) -> Unsettled {
        match self {
            GovConReason::ComputationInProgress => Unsettled::Pending,
            GovConReason::NoEvidenceUploaded => Unsettled::NoEvidence,
            _ => Unsettled::Failed,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            GovConReason::InsufficientData => "Not enough contract data to assess compliance",
            GovConReason::ComputationError => "The compliance snapshot could not be computed",
            GovConReason::BackendTimeout => "The compliance backend did not answer in time",
            GovConReason::BackendUnavailable => "The compliance backend is unavailable",
            GovConReason::NotConfigured => "GovCon compliance is not configured for this deployment",
            GovConReason::ComputationInProgress => "The compliance snapshot is still being computed",
            GovConReason::NoEvidenceUploaded => "No compliance evidence has been uploaded yet",
        }
    }
}

/// Why intelligence insights are not `success`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntelligenceReason {
    InsufficientData,
    ComputationError,
    BackendTimeout,
    UpstreamError,
    NotConfigured,
    GenerationInProgress,
}

impl ReasonCode for IntelligenceReason {
    fn lifecycle(self) -> Unsettled {
        match self {
            IntelligenceReason::GenerationInProgress => Unsettled::Pending,
            _ => Unsettled::Failed,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            IntelligenceReason::InsufficientData => "Not enough recent transactions to generate insights",
            IntelligenceReason::ComputationError => "The insight response could not be interpreted",
            IntelligenceReason::BackendTimeout => "The insight provider did not answer in time",
            IntelligenceReason::UpstreamError => "The insight provider returned an error",
            IntelligenceReason::NotConfigured => "Insights are not configured for this deployment",
            IntelligenceReason::GenerationInProgress => "Insights are still being generated",
        }
    }
}
