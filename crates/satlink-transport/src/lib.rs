//! satlink-transport — ACK-paced segmented uplink over an NB-NTN link.
//!
//! Applications hand whole frames to [`SatCommService::enqueue`]. A single
//! pacing engine task cuts each frame to the link MTU and sends one chunk
//! at a time, waiting for the link's acknowledgment before the next.

pub mod callbacks;
pub mod capability;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod frame;
pub mod queue;
pub mod readiness;
pub mod service;


pub use callbacks::{CallbackRegistry, SatCommCallbacks};
pub use engine::{UplinkCounters, UplinkStatus};
pub use error::TransportError;
pub use frame::Frame;
pub use service::SatCommService;
