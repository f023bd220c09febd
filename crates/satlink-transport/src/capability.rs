//! Capability tracker — the working MTU for uplink segmentation.

use satlink_core::SatelliteLink;

/// Last-known MTU (0 = unknown) plus the limits applied on top of it.
#[derive(Debug, Clone)]
pub struct CapabilityTracker {
    mtu: u32,
    fallback: u32,
    pdu_cap: Option<u32>,
}

impl CapabilityTracker {
    /// `fallback` is stored as the working MTU when the link cannot report
    /// one. `pdu_cap` clamps every chunk regardless of the reported MTU.
    pub fn new(fallback: u32, pdu_cap: Option<u32>) -> Self {
        Self {
            mtu: 0,
            fallback: fallback.max(1),
            pdu_cap: pdu_cap.filter(|c| *c > 0),
        }
    }

    /// Last-known MTU, 0 if unknown.
    pub fn mtu(&self) -> u32 {
        self.mtu
    }

    /// Last write wins; zero is not a valid MTU and is ignored.
    pub fn update_mtu(&mut self, value: u32) {
        if value > 0 {
            self.mtu = value;
        }
    }

    /// Resolve an unknown MTU by asking the link, falling back to the
    /// conservative default. The result is stored so later sends skip the
    /// query.
    pub fn ensure_mtu(&mut self, link: &dyn SatelliteLink) -> u32 {
        if self.mtu > 0 {
            return self.mtu;
        }
        match link.capabilities() {
            Ok(cap) if cap.max_data_size > 0 => {
                tracing::debug!(mtu = cap.max_data_size, "mtu resolved from capability query");
                self.mtu = cap.max_data_size;
            }
            Ok(_) => {
                tracing::warn!(fallback = self.fallback, "link reported no mtu, using fallback");
                self.mtu = self.fallback;
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    fallback = self.fallback,
                    "capability query failed, using fallback"
                );
                self.mtu = self.fallback;
            }
        }
        self.mtu
    }

    /// Chunk size limit to use for the next send: the resolved MTU,
    /// clamped by the configured PDU cap.
    pub fn effective_mtu(&mut self, link: &dyn SatelliteLink) -> u32 {
        let mtu = self.ensure_mtu(link);
        match self.pdu_cap {
            Some(cap) => mtu.min(cap),
            None => mtu,
        }
    }
}
