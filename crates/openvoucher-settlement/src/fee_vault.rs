//! Settlement-currency accounting.
//!
//! Redeemers attach a payment in the settlement currency. The engine keeps
//! that currency in a [`FeeVault`] and credits the operator's share there;
//! paying it out is the operator's business and outside this crate.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use openvoucher_types::{Address, OpenvoucherError, Result};

/// Per-address settlement-currency credits.
#[derive(Debug, Default)]
pub struct FeeVault {
    credits: Mutex<HashMap<Address, u128>>,
}

impl FeeVault {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` to `to`.
    ///
    /// # Errors
    /// Returns [`OpenvoucherError::TransferFailure`] if the credit would
    /// overflow; the vault is unchanged in that case.
    pub fn credit(&self, to: Address, amount: u128) -> Result<()> {
        let mut credits = self.credits();
        let current = credits.get(&to).copied().unwrap_or(0);
        let updated = current
            .checked_add(amount)
            .ok_or_else(|| OpenvoucherError::TransferFailure {
                reason: format!("fee credit to {to} overflows"),
            })?;
        credits.insert(to, updated);
        Ok(())
    }

    /// Undo a prior [`Self::credit`] of exactly `amount` to `to`.
    pub(crate) fn reverse(&self, to: Address, amount: u128) {
        let mut credits = self.credits();
        if let Some(balance) = credits.get_mut(&to) {
            *balance = balance.saturating_sub(amount);
            if *balance == 0 {
                credits.remove(&to);
            }
        }
    }

    /// Settlement currency credited to `owner`.
    pub fn balance_of(&self, owner: Address) -> u128 {
        self.credits().get(&owner).copied().unwrap_or(0)
    }

    /// Total settlement currency held.
    pub fn total(&self) -> u128 {
        self.credits()
            .values()
            .copied()
            .fold(0u128, u128::saturating_add)
    }

    fn credits(&self) -> MutexGuard<'_, HashMap<Address, u128>> {
        self.credits.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
