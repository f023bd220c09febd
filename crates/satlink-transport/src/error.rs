//! Errors surfaced by the transport to the application.

use std::time::Duration;

use satlink_core::LinkError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Empty frame submitted. Never reaches the queue.
    #[error("invalid argument: frame is empty")]
    InvalidArgument,

    /// The link handle was never established (or has been released).
    #[error("transport not ready: link not established")]
    NotReady,

    /// The send primitive refused a chunk. The unsent remainder of the frame
    /// was re-queued.
    #[error("chunk send rejected: {0}")]
    SendRejected(LinkError),

    /// The link accepted a chunk but reported a delivery failure. Not retried.
    #[error("chunk delivery failed: {0}")]
    AckFailed(LinkError),

    /// No acknowledgment arrived before the deadline. Not retried.
    #[error("no acknowledgment within {0:?}")]
    AckTimeout(Duration),

    #[error("link initialization failed: {0}")]
    InitFailed(String),

    #[error("link did not report readiness within {0:?}")]
    InitTimeout(Duration),

    #[error(transparent)]
    Link(#[from] LinkError),
}
