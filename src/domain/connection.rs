//! Connection lifecycle states and status reports.

use serde::{Deserialize, Serialize};

use super::Family;

/// Lifecycle state of one connection handle.
///
/// `Disconnected -> Connecting -> Connected`, `Connecting/Connected -> Failed`
/// when the liveness probe fails, `Connected -> Disconnected` on close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

impl ConnectionState {
    #[must_use]
    pub fn is_connected(self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// Status of one instance inside a family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceStatus {
    pub name: String,
    /// `connected` or `disconnected`, the coarse view exposed to observers.
    pub status: OverallStatus,
    /// Detailed lifecycle state.
    pub state: ConnectionState,
    /// Last connect/probe error, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl InstanceStatus {
    #[must_use]
    pub fn new(name: impl Into<String>, state: ConnectionState, error: Option<String>) -> Self {
        let status = if state.is_connected() {
            OverallStatus::Connected
        } else {
            OverallStatus::Disconnected
        };
        Self {
            name: name.into(),
            status,
            state,
            error,
        }
    }
}

/// Aggregate connection status of a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Connected,
    Partial,
    Disconnected,
}

impl OverallStatus {
    /// `Connected` only if every instance is connected, `Partial` if some
    /// are, `Disconnected` otherwise (including no instances at all).
    #[must_use]
    pub fn from_instances(instances: &[InstanceStatus]) -> Self {
        let connected = instances.iter().filter(|i| i.state.is_connected()).count();
        if connected == 0 {
            OverallStatus::Disconnected
        } else if connected == instances.len() {
            OverallStatus::Connected
        } else {
            OverallStatus::Partial
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            OverallStatus::Connected => "connected",
            OverallStatus::Partial => "partial",
            OverallStatus::Disconnected => "disconnected",
        }
    }
}

/// Status query result for one family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyStatus {
    pub family: Family,
    pub status: OverallStatus,
    pub instances: Vec<InstanceStatus>,
}

impl FamilyStatus {
    #[must_use]
    pub fn new(family: Family, instances: Vec<InstanceStatus>) -> Self {
        Self {
            family,
            status: OverallStatus::from_instances(&instances),
            instances,
        }
    }
}
