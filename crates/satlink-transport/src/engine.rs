//! Pacing engine — the uplink worker.
//!
//! Pulls one frame at a time, cuts it into chunks no larger than the MTU in
//! effect at send time, and releases each chunk only after the previous
//! chunk's acknowledgment (or failure, or deadline). At most one chunk is
//! in flight for the whole transport.
//!
//! The engine is the sole owner of the queue, MTU, readiness and in-flight
//! state. Everything else talks to it through [`EngineEvent`]s on an
//! unbounded channel, which driver threads can feed without a runtime.
//! Shutdown arrives on its own broadcast channel and is checked before
//! every dispatch, so nothing queued behind it can release another chunk.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::TryRecvError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::Instant;

use satlink_core::config::SatlinkConfig;
use satlink_core::{
    Capabilities, LinkError, NetworkState, SatelliteLink, ServiceStatus, TransactionId,
};

use crate::callbacks::CallbackRegistry;
use crate::capability::CapabilityTracker;
use crate::error::TransportError;
use crate::frame::Frame;
use crate::queue::FrameQueue;
use crate::readiness::ReadinessGate;

/// Inputs to the engine.
#[derive(Debug)]
pub enum EngineEvent {
    FrameEnqueued(Frame),
    ChunkAcked {
        id: TransactionId,
        result: Result<(), LinkError>,
    },
    CapabilityChanged(Capabilities),
    NetworkStateChanged(NetworkState),
    ServiceStatusChanged(ServiceStatus),
}

pub type EngineSender = mpsc::UnboundedSender<EngineEvent>;
pub type EngineReceiver = mpsc::UnboundedReceiver<EngineEvent>;

pub fn channel() -> (EngineSender, EngineReceiver) {
    mpsc::unbounded_channel()
}

/// Cumulative uplink counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UplinkCounters {
    pub chunks_sent: u64,
    pub chunks_acked: u64,
    pub bytes_acked: u64,
    pub send_failures: u64,
    pub ack_failures: u64,
    pub ack_timeouts: u64,
}

/// Snapshot published after every engine step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UplinkStatus {
    pub running: bool,
    pub ready: bool,
    pub network_state: NetworkState,
    pub service_status: ServiceStatus,
    /// Working MTU, 0 until resolved.
    pub mtu: u32,
    pub in_flight: Option<TransactionId>,
    /// Frames waiting behind the one being sent.
    pub queued_frames: usize,
    pub queued_bytes: usize,
    /// Byte offset into the partially sent frame, if any.
    pub resume_offset: Option<usize>,
    pub counters: UplinkCounters,
}

/// Engine tuning, normally derived from [`SatlinkConfig`].
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub ack_timeout: Duration,
    pub fallback_mtu: u32,
    pub pdu_cap: Option<u32>,
    /// MTU primed at startup, 0 if unknown.
    pub initial_mtu: u32,
    pub initial_network: NetworkState,
    pub initial_service: ServiceStatus,
}

impl EngineSettings {
    pub fn from_config(config: &SatlinkConfig) -> Self {
        Self {
            ack_timeout: config.ack_timeout(),
            fallback_mtu: config.uplink.fallback_mtu,
            pdu_cap: config.data_plane.max_tx_pdu_override,
            initial_mtu: 0,
            initial_network: NetworkState::Disabled,
            initial_service: ServiceStatus::Unavailable,
        }
    }
}

/// The frame currently being segmented and how far it has got.
struct InProgress {
    frame: Frame,
    offset: usize,
}

impl InProgress {
    fn remaining(&self) -> usize {
        self.frame.len() - self.offset
    }
}

/// The single outstanding chunk.
struct InFlight {
    id: TransactionId,
    len: usize,
    deadline: Instant,
}

enum Step {
    Shutdown,
    Event(Option<EngineEvent>),
    AckDeadline,
}

pub struct PacingEngine {
    link: Arc<dyn SatelliteLink>,
    events: EngineReceiver,
    shutdown: broadcast::Receiver<()>,
    stopping: bool,
    callbacks: CallbackRegistry,
    status_tx: watch::Sender<UplinkStatus>,
    queue: FrameQueue,
    capability: CapabilityTracker,
    readiness: ReadinessGate,
    current: Option<InProgress>,
    in_flight: Option<InFlight>,
    ack_timeout: Duration,
    counters: UplinkCounters,
}

impl PacingEngine {
    pub fn new(
        link: Arc<dyn SatelliteLink>,
        events: EngineReceiver,
        shutdown: broadcast::Receiver<()>,
        callbacks: CallbackRegistry,
        settings: EngineSettings,
    ) -> (Self, watch::Receiver<UplinkStatus>) {
        let mut capability = CapabilityTracker::new(settings.fallback_mtu, settings.pdu_cap);
        capability.update_mtu(settings.initial_mtu);
        let readiness = ReadinessGate::new(settings.initial_network, settings.initial_service);

        let (status_tx, status_rx) = watch::channel(UplinkStatus::default());
        let engine = Self {
            link,
            events,
            shutdown,
            stopping: false,
            callbacks,
            status_tx,
            queue: FrameQueue::new(),
            capability,
            readiness,
            current: None,
            in_flight: None,
            ack_timeout: settings.ack_timeout,
            counters: UplinkCounters::default(),
        };
        engine.publish(true);
        (engine, status_rx)
    }

    pub async fn run(mut self) {
        tracing::info!(
            ack_timeout_ms = self.ack_timeout.as_millis() as u64,
            mtu = self.capability.mtu(),
            ready = self.readiness.is_ready(),
            "pacing engine started"
        );

        loop {
            if self.shutdown_signalled() {
                tracing::info!("pacing engine shutting down");
                break;
            }
            self.pump();
            self.publish(true);

            let deadline = self.in_flight.as_ref().map(|f| f.deadline);
            let step = tokio::select! {
                biased;
                _ = self.shutdown.recv() => Step::Shutdown,
                event = self.events.recv() => Step::Event(event),
                _ = ack_deadline(deadline) => Step::AckDeadline,
            };

            match step {
                Step::Shutdown => {
                    tracing::info!("pacing engine shutting down");
                    break;
                }
                Step::Event(Some(event)) => self.apply(event),
                Step::Event(None) => {
                    tracing::info!("event sender dropped, pacing engine exiting");
                    break;
                }
                Step::AckDeadline => self.expire_in_flight(),
            }
        }

        self.drain();
        self.publish(false);
    }

    fn apply(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::FrameEnqueued(frame) => self.queue.push(frame),
            EngineEvent::ChunkAcked { id, result } => self.on_ack(id, result),
            EngineEvent::CapabilityChanged(cap) => self.capability.update_mtu(cap.max_data_size),
            EngineEvent::NetworkStateChanged(state) => {
                self.readiness.on_network_state_changed(state)
            }
            EngineEvent::ServiceStatusChanged(status) => {
                self.readiness.on_service_status_changed(status)
            }
        }
    }

    /// Latches once the shutdown sender fires or is dropped.
    fn shutdown_signalled(&mut self) -> bool {
        if !self.stopping {
            self.stopping = !matches!(self.shutdown.try_recv(), Err(TryRecvError::Empty));
        }
        self.stopping
    }

    /// Dispatch chunks while nothing is in flight and the link is ready.
    fn pump(&mut self) {
        while self.in_flight.is_none() && self.readiness.is_ready() {
            if self.shutdown_signalled() {
                return;
            }
            let job = match self.current.take() {
                Some(job) => job,
                None => match self.queue.pop_front() {
                    Some(frame) => InProgress { frame, offset: 0 },
                    None => return,
                },
            };
            self.send_next_chunk(job);
        }
    }

    fn send_next_chunk(&mut self, job: InProgress) {
        let mtu = self.capability.effective_mtu(self.link.as_ref()) as usize;
        let len = job.remaining().min(mtu);
        let end = job.offset + len;
        let chunk = job.frame.payload.slice(job.offset..end);

        match self.link.send_chunk(&chunk, job.frame.priority) {
            Ok(id) => {
                tracing::debug!(
                    %id,
                    offset = job.offset,
                    len,
                    frame_len = job.frame.len(),
                    emergency = job.frame.priority.is_emergency(),
                    "chunk dispatched"
                );
                self.counters.chunks_sent += 1;
                self.in_flight = Some(InFlight {
                    id,
                    len,
                    deadline: Instant::now() + self.ack_timeout,
                });
                self.current = Some(job);
            }
            Err(e) => {
                self.counters.send_failures += 1;
                tracing::warn!(error = %e, offset = job.offset, len, "chunk send rejected");
                if let Some(rest) = job.frame.remainder(end) {
                    tracing::debug!(remaining = rest.len(), "re-queued unsent remainder");
                    self.queue.push_front(rest);
                }
                self.callbacks
                    .ack(Err(TransportError::SendRejected(e)), TransactionId::NONE);
            }
        }
    }

    fn on_ack(&mut self, id: TransactionId, result: Result<(), LinkError>) {
        if id.is_none() || self.in_flight.as_ref().map(|f| f.id) != Some(id) {
            tracing::debug!(%id, "acknowledgment for unknown transaction ignored");
            return;
        }
        let Some(flight) = self.in_flight.take() else {
            return;
        };

        match result {
            Ok(()) => {
                self.counters.chunks_acked += 1;
                self.counters.bytes_acked += flight.len as u64;
                tracing::debug!(%id, len = flight.len, "chunk acknowledged");
            }
            Err(e) => {
                self.counters.ack_failures += 1;
                tracing::warn!(%id, error = %e, "chunk delivery failed, not retried");
            }
        }
        self.advance(flight.len);
    }

    fn expire_in_flight(&mut self) {
        let Some(flight) = self.in_flight.take() else {
            return;
        };
        self.counters.ack_timeouts += 1;
        tracing::warn!(
            id = %flight.id,
            timeout_ms = self.ack_timeout.as_millis() as u64,
            "acknowledgment timed out, chunk not retried"
        );
        self.advance(flight.len);
        self.callbacks
            .ack(Err(TransportError::AckTimeout(self.ack_timeout)), flight.id);
    }

    /// Move past the chunk that just settled.
    fn advance(&mut self, len: usize) {
        if let Some(mut job) = self.current.take() {
            job.offset += len;
            if job.offset < job.frame.len() {
                self.current = Some(job);
            } else {
                tracing::debug!(frame_len = job.frame.len(), "frame complete");
            }
        }
    }

    fn drain(&mut self) {
        let mut discarded = self.queue.drain();
        if self.current.take().is_some() {
            discarded += 1;
        }
        if let Some(flight) = self.in_flight.take() {
            tracing::debug!(id = %flight.id, "abandoning unacknowledged chunk");
        }
        if discarded > 0 {
            tracing::info!(discarded, "discarded pending frames on shutdown");
        }
    }

    fn publish(&self, running: bool) {
        self.status_tx.send_replace(UplinkStatus {
            running,
            ready: self.readiness.is_ready(),
            network_state: self.readiness.network_state(),
            service_status: self.readiness.service_status(),
            mtu: self.capability.mtu(),
            in_flight: self.in_flight.as_ref().map(|f| f.id),
            queued_frames: self.queue.len(),
            queued_bytes: self.queue.queued_bytes(),
            resume_offset: self.current.as_ref().map(|j| j.offset),
            counters: self.counters.clone(),
        });
    }
}

async fn ack_deadline(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}
