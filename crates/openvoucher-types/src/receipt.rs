//! Settlement receipts and notification events.
//!
//! Every successful redemption yields a [`Settlement`] for the caller and a
//! [`VoucherRedeemed`] event for observers.

use serde::{Deserialize, Serialize};

use crate::{Address, UniqueId};

/// Notification emitted once per successful settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoucherRedeemed {
    pub unique_id: UniqueId,
    pub recipient: Address,
}

/// Result of a successful redemption, returned to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// The voucher id now recorded as settled.
    pub unique_id: UniqueId,
    /// Who received the payout.
    pub recipient: Address,
    /// Payout asset transferred to the recipient.
    pub amount: u128,
    /// Settlement currency credited to the operator as the fee.
    pub fee: u128,
    /// Portion of the payment not consumed and handed back to the caller.
    ///
    /// Always zero under [`crate::ExcessPaymentPolicy::Retain`].
    pub change: u128,
    /// Unix seconds at which the redemption was accepted.
    pub settled_at: u64,
}

impl Settlement {
    /// The notification event for this settlement.
    #[must_use]
    pub fn event(&self) -> VoucherRedeemed {
        VoucherRedeemed {
            unique_id: self.unique_id,
            recipient: self.recipient,
        }
    }
}
