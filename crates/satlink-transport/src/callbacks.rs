//! Application callbacks.
//!
//! Seven independent channels, each optional. All are invoked from
//! internal threads (driver notification threads or the pacing engine);
//! forward onto your own executor if you need thread affinity.

use std::sync::{Arc, PoisonError, RwLock};

use satlink_core::{Capabilities, NetworkState, ServiceStatus, SignalStrength, TransactionId};

use crate::error::TransportError;

pub type IncomingDataFn = Arc<dyn Fn(&[u8]) + Send + Sync>;
pub type NetworkStateFn = Arc<dyn Fn(NetworkState) + Send + Sync>;
pub type CapabilitiesFn = Arc<dyn Fn(Capabilities) + Send + Sync>;
pub type SignalStrengthFn = Arc<dyn Fn(SignalStrength) + Send + Sync>;
pub type ServiceStatusFn = Arc<dyn Fn(ServiceStatus) + Send + Sync>;
/// Outcome of one chunk: acknowledged, delivery failure, send rejection
/// (id is [`TransactionId::NONE`]), or ack timeout.
pub type AckFn = Arc<dyn Fn(Result<(), TransportError>, TransactionId) + Send + Sync>;
pub type CoverageFn = Arc<dyn Fn(bool) + Send + Sync>;

#[derive(Clone, Default)]
pub struct SatCommCallbacks {
    pub on_incoming_data: Option<IncomingDataFn>,
    pub on_network_state: Option<NetworkStateFn>,
    pub on_capabilities: Option<CapabilitiesFn>,
    pub on_signal_strength: Option<SignalStrengthFn>,
    pub on_service_status: Option<ServiceStatusFn>,
    pub on_ack: Option<AckFn>,
    pub on_coverage_available: Option<CoverageFn>,
}

impl SatCommCallbacks {
    pub fn on_incoming_data(mut self, f: impl Fn(&[u8]) + Send + Sync + 'static) -> Self {
        self.on_incoming_data = Some(Arc::new(f));
        self
    }

    pub fn on_network_state(mut self, f: impl Fn(NetworkState) + Send + Sync + 'static) -> Self {
        self.on_network_state = Some(Arc::new(f));
        self
    }

    pub fn on_capabilities(mut self, f: impl Fn(Capabilities) + Send + Sync + 'static) -> Self {
        self.on_capabilities = Some(Arc::new(f));
        self
    }

    pub fn on_signal_strength(
        mut self,
        f: impl Fn(SignalStrength) + Send + Sync + 'static,
    ) -> Self {
        self.on_signal_strength = Some(Arc::new(f));
        self
    }

    pub fn on_service_status(mut self, f: impl Fn(ServiceStatus) + Send + Sync + 'static) -> Self {
        self.on_service_status = Some(Arc::new(f));
        self
    }

    pub fn on_ack(
        mut self,
        f: impl Fn(Result<(), TransportError>, TransactionId) + Send + Sync + 'static,
    ) -> Self {
        self.on_ack = Some(Arc::new(f));
        self
    }

    pub fn on_coverage_available(mut self, f: impl Fn(bool) + Send + Sync + 'static) -> Self {
        self.on_coverage_available = Some(Arc::new(f));
        self
    }
}

/// Shared, replaceable callback set. The closure is cloned out of the lock
/// before it runs, so a callback may call `set` without deadlocking.
#[derive(Clone, Default)]
pub struct CallbackRegistry {
    inner: Arc<RwLock<SatCommCallbacks>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, callbacks: SatCommCallbacks) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = callbacks;
    }

    fn get<T: Clone>(&self, pick: impl FnOnce(&SatCommCallbacks) -> &Option<T>) -> Option<T> {
        let cb = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        pick(&*cb).clone()
    }

    pub fn incoming_data(&self, data: &[u8]) {
        if let Some(f) = self.get(|c| &c.on_incoming_data) {
            f(data);
        }
    }

    pub fn network_state(&self, state: NetworkState) {
        if let Some(f) = self.get(|c| &c.on_network_state) {
            f(state);
        }
    }

    pub fn capabilities(&self, cap: Capabilities) {
        if let Some(f) = self.get(|c| &c.on_capabilities) {
            f(cap);
        }
    }

    pub fn signal_strength(&self, strength: SignalStrength) {
        if let Some(f) = self.get(|c| &c.on_signal_strength) {
            f(strength);
        }
    }

    pub fn service_status(&self, status: ServiceStatus) {
        if let Some(f) = self.get(|c| &c.on_service_status) {
            f(status);
        }
    }

    pub fn ack(&self, result: Result<(), TransportError>, id: TransactionId) {
        if let Some(f) = self.get(|c| &c.on_ack) {
            f(result, id);
        }
    }

    pub fn coverage_available(&self, available: bool) {
        if let Some(f) = self.get(|c| &c.on_coverage_available) {
            f(available);
        }
    }
}
