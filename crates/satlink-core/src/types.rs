//! Link-level vocabulary shared by the driver seam and the transport.
//!
//! These mirror what the satellite manager reports: registration state,
//! service availability, capabilities, and signal buckets.

use serde::{Deserialize, Serialize};

// ── States ───────────────────────────────────────────────────────────────────

/// NTN registration state as reported by the satellite manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkState {
    /// NTN is disabled.
    #[default]
    Disabled,
    /// NTN is enabled but the device is not registered with a provider.
    OutOfService,
    /// Registered and online.
    InService,
}

/// Availability of the satellite manager service itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    Available,
    /// Temporarily unavailable, e.g. the underlying service restarted.
    #[default]
    Unavailable,
    /// Irrecoverable failure.
    Failed,
}

/// RF signal-strength bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalStrength {
    #[default]
    None,
    Poor,
    Moderate,
    Good,
    Great,
}

/// Capabilities of the NTN network. May change over time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    /// Largest payload in bytes the link accepts in one send. 0 = not reported.
    pub max_data_size: u32,
}

// ── Uplink ───────────────────────────────────────────────────────────────────

/// Bearer selection for an uplink frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    #[default]
    Normal,
    Emergency,
}

impl Priority {
    pub fn is_emergency(self) -> bool {
        matches!(self, Priority::Emergency)
    }
}

/// Identifier the link assigns to an accepted chunk. The matching
/// acknowledgment carries the same value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TransactionId(pub u64);

impl TransactionId {
    /// Reported when no transaction was accepted by the link.
    pub const NONE: TransactionId = TransactionId(0);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// System selection entry pushed to the modem (SFL).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemSelectionSpecifier {
    /// Mobile country code.
    pub mcc: String,
    /// Mobile network code.
    pub mnc: String,
    pub bands: Vec<u64>,
    /// E-UTRAN absolute radio frequency channel numbers.
    pub earfcns: Vec<u64>,
}
