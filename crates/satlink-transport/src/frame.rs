//! Uplink frames — application payloads awaiting transmission.

use bytes::Bytes;
use satlink_core::Priority;

/// An application payload plus its bearer priority.
///
/// Immutable once queued. When a chunk send fails part-way through, the
/// unsent suffix becomes a new frame via [`Frame::remainder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub payload: Bytes,
    pub priority: Priority,
}

impl Frame {
    /// Copy `data` into a new frame.
    pub fn copy_from(data: &[u8], priority: Priority) -> Self {
        Self {
            payload: Bytes::copy_from_slice(data),
            priority,
        }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// The bytes from `offset` onward as a new frame, or None if nothing
    /// remains. Shares the underlying buffer.
    pub fn remainder(&self, offset: usize) -> Option<Frame> {
        if offset >= self.payload.len() {
            return None;
        }
        Some(Frame {
            payload: self.payload.slice(offset..),
            priority: self.priority,
        })
    }
}
