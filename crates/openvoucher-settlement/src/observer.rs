//! Settlement notifications.
//!
//! Observers are called once per successful redemption, after every state
//! change has been committed. They cannot fail or veto a settlement.

use std::sync::{Mutex, PoisonError};

use openvoucher_types::VoucherRedeemed;

/// Receives one event per successful settlement.
pub trait SettlementObserver: Send + Sync {
    fn on_redeemed(&self, event: &VoucherRedeemed);
}

/// Emits each event as a structured `tracing` record.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl SettlementObserver for TracingObserver {
    fn on_redeemed(&self, event: &VoucherRedeemed) {
        tracing::info!(
            target: "openvoucher::events",
            unique_id = %event.unique_id,
            recipient = %event.recipient,
            "VoucherRedeemed"
        );
    }
}

/// Keeps every event in memory, in arrival order.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<VoucherRedeemed>>,
}

impl RecordingObserver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all events recorded so far.
    pub fn events(&self) -> Vec<VoucherRedeemed> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SettlementObserver for RecordingObserver {
    fn on_redeemed(&self, event: &VoucherRedeemed) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(*event);
    }
}

#[cfg(test)]
mod tests {
    use openvoucher_types::Address;

    use super::*;

    #[test]
    fn recording_observer_keeps_order() {
        let observer = RecordingObserver::new();
        let recipient = Address::random();
        for unique_id in [3u128, 1, 2] {
            observer.on_redeemed(&VoucherRedeemed {
                unique_id,
                recipient,
            });
        }
        let ids: Vec<u128> = observer.events().iter().map(|e| e.unique_id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn tracing_observer_does_not_panic_without_subscriber() {
        TracingObserver.on_redeemed(&VoucherRedeemed {
            unique_id: 1,
            recipient: Address::ZERO,
        });
    }
}
