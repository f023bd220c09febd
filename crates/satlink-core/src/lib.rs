//! satlink-core — link vocabulary, the satellite driver seam, and configuration.
//! The transport crate and the integration harness depend on this one.

pub mod config;
pub mod link;
pub mod types;

pub use link::{EventSink, LinkError, LinkEvent, LinkProvider, ReadyCallback, SatelliteLink, SinkId};
pub use types::{
    Capabilities, NetworkState, Priority, ServiceStatus, SignalStrength, SystemSelectionSpecifier,
    TransactionId,
};
