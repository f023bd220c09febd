//! SatCommService — the application-facing NB-NTN transport.
//!
//! Owns the link handle, the registered notification sink, and the pacing
//! engine task. `enqueue` never blocks: it copies the frame into the
//! engine's channel and returns. Transmission outcomes arrive only through
//! the acknowledgment callback.

use std::sync::Arc;

use tokio::sync::{broadcast, oneshot, watch};
use tokio::task::JoinHandle;

use satlink_core::config::SatlinkConfig;
use satlink_core::{
    Capabilities, LinkProvider, NetworkState, Priority, SatelliteLink, ServiceStatus,
    SignalStrength, SinkId, SystemSelectionSpecifier,
};

use crate::callbacks::{CallbackRegistry, SatCommCallbacks};
use crate::dispatch::EventDispatcher;
use crate::engine::{self, EngineEvent, EngineSender, EngineSettings, PacingEngine, UplinkStatus};
use crate::error::TransportError;
use crate::frame::Frame;

/// Everything that exists only between a successful `init` and `shutdown`.
struct Active {
    link: Arc<dyn SatelliteLink>,
    sink: SinkId,
    engine_tx: EngineSender,
    shutdown_tx: broadcast::Sender<()>,
    status: watch::Receiver<UplinkStatus>,
    task: JoinHandle<()>,
}

pub struct SatCommService {
    config: SatlinkConfig,
    provider: Arc<dyn LinkProvider>,
    callbacks: CallbackRegistry,
    active: Option<Active>,
}

impl SatCommService {
    /// Build a service from a loaded config. Out-of-range values are reset
    /// to defaults and logged. The config is not re-read afterwards.
    pub fn new(mut config: SatlinkConfig, provider: Arc<dyn LinkProvider>) -> Self {
        for warning in config.validate() {
            tracing::warn!(%warning, "config value replaced");
        }
        Self {
            config,
            provider,
            callbacks: CallbackRegistry::new(),
            active: None,
        }
    }

    pub fn config(&self) -> &SatlinkConfig {
        &self.config
    }

    /// Acquire the link, wait for it to report ready, register for
    /// notifications, prime MTU and readiness, and start the pacing engine.
    ///
    /// Failures are reported once; call `init` again to retry.
    pub async fn init(&mut self) -> Result<(), TransportError> {
        if self.active.is_some() {
            return Ok(());
        }

        let timeout = self.config.init_timeout();
        let (ready_tx, ready_rx) = oneshot::channel();
        let link = self
            .provider
            .acquire(Box::new(move |status| {
                let _ = ready_tx.send(status);
            }))
            .ok_or_else(|| {
                tracing::error!("link provider returned no link");
                TransportError::InitFailed("link provider returned no link".to_string())
            })?;

        let ready = match tokio::time::timeout(timeout, ready_rx).await {
            Ok(Ok(status)) => status,
            Ok(Err(_)) => {
                tracing::error!("ready callback dropped without firing");
                return Err(TransportError::InitFailed(
                    "ready callback dropped without firing".to_string(),
                ));
            }
            Err(_) => {
                tracing::error!(
                    timeout_ms = timeout.as_millis() as u64,
                    "link readiness timed out"
                );
                return Err(TransportError::InitTimeout(timeout));
            }
        };
        if ready != ServiceStatus::Available {
            tracing::error!(status = ?ready, "link subsystem is not ready");
            return Err(TransportError::InitFailed(format!(
                "link subsystem reported {ready:?}"
            )));
        }

        let (engine_tx, engine_rx) = engine::channel();
        let dispatcher = EventDispatcher::new(engine_tx.clone(), self.callbacks.clone());
        let sink = link.register_sink(dispatcher.sink()).map_err(|e| {
            tracing::error!(error = %e, "notification sink registration failed");
            TransportError::InitFailed(format!("notification sink registration failed: {e}"))
        })?;

        let mut settings = EngineSettings::from_config(&self.config);
        match link.capabilities() {
            Ok(cap) if cap.max_data_size > 0 => settings.initial_mtu = cap.max_data_size,
            Ok(_) => tracing::info!("link has not reported an mtu yet"),
            Err(e) => tracing::warn!(error = %e, "initial capability query failed"),
        }
        settings.initial_network = link.network_state();
        settings.initial_service = link.service_status();

        tracing::info!(
            mtu = settings.initial_mtu,
            network = ?settings.initial_network,
            service = ?settings.initial_service,
            slot_id = self.config.ntn.slot_id,
            "satcom link ready"
        );

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let (engine, status) = PacingEngine::new(
            link.clone(),
            engine_rx,
            shutdown_rx,
            self.callbacks.clone(),
            settings,
        );
        let task = tokio::spawn(engine.run());

        self.active = Some(Active {
            link,
            sink,
            engine_tx,
            shutdown_tx,
            status,
            task,
        });
        Ok(())
    }

    /// Stop the engine (pending frames are discarded, not flushed),
    /// deregister from the link and release it.
    pub async fn shutdown(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        let _ = active.shutdown_tx.send(());
        if let Err(e) = active.task.await {
            tracing::warn!(error = %e, "pacing engine task failed");
        }
        if let Err(e) = active.link.deregister_sink(active.sink) {
            tracing::warn!(error = %e, "notification sink deregistration failed");
        }
        tracing::info!("satcom service shut down");
    }

    /// Replace the application callbacks. Takes effect for the next event.
    pub fn set_callbacks(&self, callbacks: SatCommCallbacks) {
        self.callbacks.set(callbacks);
    }

    /// Queue a frame for uplink. Readiness is not required; frames wait in
    /// the queue until the link is in service.
    pub fn enqueue(&self, data: &[u8], priority: Priority) -> Result<(), TransportError> {
        let active = self.active()?;
        if data.is_empty() {
            return Err(TransportError::InvalidArgument);
        }
        active
            .engine_tx
            .send(EngineEvent::FrameEnqueued(Frame::copy_from(data, priority)))
            .map_err(|_| TransportError::NotReady)
    }

    /// Abort all outstanding uplink data in the link. The local queue and
    /// in-flight chunk are left alone.
    pub fn abort(&self) -> Result<(), TransportError> {
        Ok(self.link()?.abort_all_pending()?)
    }

    pub fn is_supported(&self) -> Result<bool, TransportError> {
        Ok(self.link()?.is_supported()?)
    }

    pub fn enable_ntn(
        &self,
        enable: bool,
        emergency: bool,
        iccid: &str,
    ) -> Result<(), TransportError> {
        Ok(self.link()?.enable(enable, emergency, iccid)?)
    }

    pub fn network_state(&self) -> NetworkState {
        self.link()
            .map(|l| l.network_state())
            .unwrap_or(NetworkState::Disabled)
    }

    pub fn service_status(&self) -> ServiceStatus {
        self.link()
            .map(|l| l.service_status())
            .unwrap_or(ServiceStatus::Unavailable)
    }

    pub fn capabilities(&self) -> Result<Capabilities, TransportError> {
        Ok(self.link()?.capabilities()?)
    }

    pub fn signal_strength(&self) -> Result<SignalStrength, TransportError> {
        Ok(self.link()?.signal_strength()?)
    }

    /// Terrestrial scan toggle while operating over NTN.
    pub fn enable_cellular_scan(&self, enable: bool) -> Result<(), TransportError> {
        Ok(self.link()?.enable_cellular_scan(enable)?)
    }

    pub fn update_system_selection(
        &self,
        specifiers: &[SystemSelectionSpecifier],
    ) -> Result<(), TransportError> {
        Ok(self.link()?.update_system_selection(specifiers)?)
    }

    /// Latest engine snapshot. Default (not running) before `init`.
    pub fn status(&self) -> UplinkStatus {
        self.active
            .as_ref()
            .map(|a| a.status.borrow().clone())
            .unwrap_or_default()
    }

    pub fn subscribe_status(&self) -> Option<watch::Receiver<UplinkStatus>> {
        self.active.as_ref().map(|a| a.status.clone())
    }

    /// Whether the engine last saw the link in service and available.
    pub fn is_ready(&self) -> bool {
        self.status().ready
    }

    fn active(&self) -> Result<&Active, TransportError> {
        self.active.as_ref().ok_or(TransportError::NotReady)
    }

    fn link(&self) -> Result<&Arc<dyn SatelliteLink>, TransportError> {
        self.active().map(|a| &a.link)
    }
}

impl Drop for SatCommService {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            let _ = active.shutdown_tx.send(());
            if let Err(e) = active.link.deregister_sink(active.sink) {
                tracing::warn!(error = %e, "notification sink deregistration failed");
            }
        }
    }
}
