//! Frame queue — ordered, unbounded backlog of uplink frames.
//!
//! Owned by the pacing engine, so no lock is needed; waiting for work is
//! the engine's job (it parks on its event channel).

use std::collections::VecDeque;

use crate::frame::Frame;

#[derive(Debug, Default)]
pub struct FrameQueue {
    frames: VecDeque<Frame>,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append to the back.
    pub fn push(&mut self, frame: Frame) {
        self.frames.push_back(frame);
    }

    /// Re-insert ahead of everything else. Used for the unsent remainder of
    /// a frame whose chunk send failed, so it stays ahead of newer frames.
    pub fn push_front(&mut self, frame: Frame) {
        self.frames.push_front(frame);
    }

    /// Remove and return the oldest frame.
    pub fn pop_front(&mut self) -> Option<Frame> {
        self.frames.pop_front()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Total bytes waiting.
    pub fn queued_bytes(&self) -> usize {
        self.frames.iter().map(Frame::len).sum()
    }

    /// Discard everything. Returns how many frames were dropped.
    pub fn drain(&mut self) -> usize {
        let n = self.frames.len();
        self.frames.clear();
        n
    }
}
