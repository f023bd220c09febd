//! The satellite link seam.
//!
//! The satellite manager driver lives outside this workspace. Everything the
//! transport needs from it goes through [`SatelliteLink`], and everything it
//! reports back arrives as a [`LinkEvent`] on a registered [`EventSink`].
//! Acquisition is injected through [`LinkProvider`] rather than looked up
//! from a process-wide factory.

use std::sync::Arc;

use bytes::Bytes;

use crate::types::{
    Capabilities, NetworkState, Priority, ServiceStatus, SignalStrength,
    SystemSelectionSpecifier, TransactionId,
};

/// Failure codes reported by the link, either synchronously or in an
/// acknowledgment.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error("link not ready")]
    NotReady,
    #[error("invalid argument")]
    InvalidArgument,
    #[error("operation not supported")]
    NotSupported,
    #[error("no network service")]
    NoService,
    #[error("request timed out in the modem")]
    Timeout,
    #[error("data aborted")]
    Aborted,
    #[error("driver error code {0}")]
    Driver(i32),
}

/// Asynchronous notification from the link. One variant per listener
/// channel of the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// Downlink payload, already complete.
    IncomingData(Bytes),
    NetworkState(NetworkState),
    Capabilities(Capabilities),
    SignalStrength(SignalStrength),
    ServiceStatus(ServiceStatus),
    /// L2 acknowledgment (success or failure) for a previously sent chunk.
    Ack {
        result: Result<(), LinkError>,
        id: TransactionId,
    },
    /// Terrestrial coverage toggled while operating over NTN.
    CoverageAvailable(bool),
}

/// Receiver for link notifications. Invoked on driver-owned threads.
pub type EventSink = Arc<dyn Fn(LinkEvent) + Send + Sync>;

/// Handle returned by [`SatelliteLink::register_sink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SinkId(pub u64);

/// Primitives the transport consumes from the satellite manager.
///
/// `send_chunk` must not block: it hands the chunk to the modem and returns
/// the transaction id; delivery is reported later as [`LinkEvent::Ack`].
pub trait SatelliteLink: Send + Sync {
    /// Whether NB-NTN is supported on this device and SIM.
    fn is_supported(&self) -> Result<bool, LinkError>;

    /// Enable or disable NTN. `iccid` identifies the provisioned profile.
    fn enable(&self, enable: bool, emergency: bool, iccid: &str) -> Result<(), LinkError>;

    fn capabilities(&self) -> Result<Capabilities, LinkError>;

    fn signal_strength(&self) -> Result<SignalStrength, LinkError>;

    fn network_state(&self) -> NetworkState;

    fn service_status(&self) -> ServiceStatus;

    /// Hand one chunk (at most the current MTU) to the modem.
    fn send_chunk(&self, data: &[u8], priority: Priority) -> Result<TransactionId, LinkError>;

    /// Abort every outstanding uplink transaction.
    fn abort_all_pending(&self) -> Result<(), LinkError>;

    /// Toggle terrestrial scanning while in NTN mode.
    fn enable_cellular_scan(&self, enable: bool) -> Result<(), LinkError>;

    fn update_system_selection(
        &self,
        specifiers: &[SystemSelectionSpecifier],
    ) -> Result<(), LinkError>;

    fn register_sink(&self, sink: EventSink) -> Result<SinkId, LinkError>;

    fn deregister_sink(&self, id: SinkId) -> Result<(), LinkError>;
}

/// Fired once the link's subsystem settles on a final status.
pub type ReadyCallback = Box<dyn FnOnce(ServiceStatus) + Send>;

/// Acquires a link handle. The handle is usable once `on_ready` fires with
/// [`ServiceStatus::Available`]; the callback may fire before `acquire`
/// returns.
pub trait LinkProvider: Send + Sync {
    fn acquire(&self, on_ready: ReadyCallback) -> Option<Arc<dyn SatelliteLink>>;
}
