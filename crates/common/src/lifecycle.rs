// Lifecycle response envelope
//
// A computed response carries its data together with a lifecycle tag.
// The payload is only ever populated when the lifecycle is `success`;
// every other lifecycle carries a reason code instead.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trust status of a computed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Success,
    Pending,
    Failed,
    Stale,
    NoEvidence,
}

impl Lifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Success => "success",
            Lifecycle::Pending => "pending",
            Lifecycle::Failed => "failed",
            Lifecycle::Stale => "stale",
            Lifecycle::NoEvidence => "no_evidence",
        }
    }
}

/// The non-success subset of [`Lifecycle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unsettled {
    Pending,
    Failed,
    Stale,
    NoEvidence,
}

impl From<Unsettled> for Lifecycle {
    fn from(value: Unsettled) -> Self {
        match value {
            Unsettled::Pending => Lifecycle::Pending,
            Unsettled::Failed => Lifecycle::Failed,
            Unsettled::Stale => Lifecycle::Stale,
            Unsettled::NoEvidence => Lifecycle::NoEvidence,
        }
    }
}

/// Domain-specific explanation for a non-success lifecycle.
///
/// Each code fixes the lifecycle it produces, so a domain's reason enum
/// also defines which lifecycles that domain can report.
pub trait ReasonCode: Copy + Serialize {
    fn lifecycle(self) -> Unsettled;

    /// Default human-readable message.
    fn describe(self) -> &'static str;
}

/// Payload slot of a lifecycle response. The implementing type owns the
/// JSON field name (`snapshot`, `items`).
pub trait Payload: Serialize {
    type Value;

    fn present(value: Self::Value) -> Self;
    fn absent() -> Self;
    fn is_present(&self) -> bool;
    fn into_value(self) -> Option<Self::Value>;
}

/// Single-object payload serialized as `"snapshot"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot<T> {
    snapshot: Option<T>,
}

impl<T: Serialize> Payload for Snapshot<T> {
    type Value = T;

    fn present(value: T) -> Self {
        Self {
            snapshot: Some(value),
        }
    }

    fn absent() -> Self {
        Self { snapshot: None }
    }

    fn is_present(&self) -> bool {
        self.snapshot.is_some()
    }

    fn into_value(self) -> Option<T> {
        self.snapshot
    }
}

/// Collection payload serialized as `"items"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Items<T> {
    items: Option<Vec<T>>,
}

impl<T: Serialize> Payload for Items<T> {
    type Value = Vec<T>;

    fn present(value: Vec<T>) -> Self {
        Self { items: Some(value) }
    }

    fn absent() -> Self {
        Self { items: None }
    }

    fn is_present(&self) -> bool {
        self.items.is_some()
    }

    fn into_value(self) -> Option<Vec<T>> {
        self.items
    }
}

/// Response for a computed view.
///
/// Fields are private: the only ways to build one are [`success`] and
/// [`unavailable`], which keep payload and reason code mutually exclusive.
///
/// [`success`]: LifecycleResponse::success
/// [`unavailable`]: LifecycleResponse::unavailable
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleResponse<R, P> {
    lifecycle: Lifecycle,
    reason_code: Option<R>,
    reason_message: Option<String>,
    generated_at: DateTime<Utc>,
    #[serde(flatten)]
    payload: P,
    request_id: String,
}

impl<R: ReasonCode, P: Payload> LifecycleResponse<R, P> {
    pub fn success(request_id: impl Into<String>, value: P::Value) -> Self {
        Self {
            lifecycle: Lifecycle::Success,
            reason_code: None,
            reason_message: None,
            generated_at: Utc::now(),
            payload: P::present(value),
            request_id: request_id.into(),
        }
    }

    /// Builds a fail-closed response. The lifecycle comes from `reason`;
    /// `message` falls back to the reason's default description.
    pub fn unavailable(request_id: impl Into<String>, reason: R, message: Option<String>) -> Self {
        Self {
            lifecycle: reason.lifecycle().into(),
            reason_code: Some(reason),
            reason_message: Some(message.unwrap_or_else(|| reason.describe().to_string())),
            generated_at: Utc::now(),
            payload: P::absent(),
            request_id: request_id.into(),
        }
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn reason_code(&self) -> Option<R> {
        self.reason_code
    }

    pub fn reason_message(&self) -> Option<&str> {
        self.reason_message.as_deref()
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn into_value(self) -> Option<P::Value> {
        self.payload.into_value()
    }

    pub fn is_consistent(&self) -> bool {
        match self.lifecycle {
            Lifecycle::Success => self.reason_code.is_none() && self.payload.is_present(),
            _ => self.reason_code.is_some() && !self.payload.is_present(),
        }
    }
}
