//! Event dispatch — routes link notifications to the pacing engine and on
//! to the application's callbacks.

use std::sync::Arc;

use satlink_core::{EventSink, LinkEvent};

use crate::callbacks::CallbackRegistry;
use crate::engine::{EngineEvent, EngineSender};
use crate::error::TransportError;

/// Bytes of downlink payload shown in debug logs.
const PREVIEW_LEN: usize = 8;

/// Runs on the driver's notification threads. Internal state is updated
/// first (by messaging the engine), then the application is told.
#[derive(Clone)]
pub struct EventDispatcher {
    engine: EngineSender,
    callbacks: CallbackRegistry,
}

impl EventDispatcher {
    pub fn new(engine: EngineSender, callbacks: CallbackRegistry) -> Self {
        Self { engine, callbacks }
    }

    /// Wrap this dispatcher as a sink for [`satlink_core::SatelliteLink::register_sink`].
    pub fn sink(&self) -> EventSink {
        let this = self.clone();
        Arc::new(move |event: LinkEvent| this.dispatch(event))
    }

    pub fn dispatch(&self, event: LinkEvent) {
        match event {
            LinkEvent::IncomingData(data) => {
                if data.is_empty() {
                    return;
                }
                tracing::debug!(
                    len = data.len(),
                    preview = hex::encode(&data[..data.len().min(PREVIEW_LEN)]),
                    "downlink data"
                );
                self.callbacks.incoming_data(&data);
            }
            LinkEvent::NetworkState(state) => {
                tracing::info!(?state, "network state changed");
                self.notify_engine(EngineEvent::NetworkStateChanged(state));
                self.callbacks.network_state(state);
            }
            LinkEvent::Capabilities(cap) => {
                tracing::info!(max_data_size = cap.max_data_size, "capabilities changed");
                self.notify_engine(EngineEvent::CapabilityChanged(cap));
                self.callbacks.capabilities(cap);
            }
            LinkEvent::SignalStrength(strength) => {
                tracing::debug!(?strength, "signal strength changed");
                self.callbacks.signal_strength(strength);
            }
            LinkEvent::ServiceStatus(status) => {
                tracing::info!(?status, "service status changed");
                self.notify_engine(EngineEvent::ServiceStatusChanged(status));
                self.callbacks.service_status(status);
            }
            LinkEvent::Ack { result, id } => {
                // Release the engine whether or not anyone listens.
                self.notify_engine(EngineEvent::ChunkAcked {
                    id,
                    result: result.clone(),
                });
                self.callbacks.ack(result.map_err(TransportError::AckFailed), id);
            }
            LinkEvent::CoverageAvailable(available) => {
                tracing::info!(available, "terrestrial coverage changed");
                self.callbacks.coverage_available(available);
            }
        }
    }

    fn notify_engine(&self, event: EngineEvent) {
        if self.engine.send(event).is_err() {
            tracing::debug!("pacing engine stopped, event dropped");
        }
    }
}
