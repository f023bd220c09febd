//! Readiness gate — uplink proceeds only while the link is registered
//! (IN_SERVICE) and the manager service is AVAILABLE.

use satlink_core::{NetworkState, ServiceStatus};

/// Latest-known network and service state. Readiness is derived on every
/// read and never stored on its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadinessGate {
    network: NetworkState,
    service: ServiceStatus,
}

impl ReadinessGate {
    pub fn new(network: NetworkState, service: ServiceStatus) -> Self {
        Self { network, service }
    }

    pub fn on_network_state_changed(&mut self, state: NetworkState) {
        self.network = state;
    }

    pub fn on_service_status_changed(&mut self, status: ServiceStatus) {
        self.service = status;
    }

    pub fn is_ready(&self) -> bool {
        self.network == NetworkState::InService && self.service == ServiceStatus::Available
    }

    pub fn network_state(&self) -> NetworkState {
        self.network
    }

    pub fn service_status(&self) -> ServiceStatus {
        self.service
    }
}
