//! The payout asset ledger.
//!
//! The engine never moves the payout asset itself; it asks an external
//! [`AssetLedger`] to transfer from the engine's custody account. A ledger
//! may run arbitrary code during a transfer (receiver hooks), including a
//! nested redemption attempt.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use openvoucher_types::Address;

/// Transfer interface of the payout asset, bound to the engine's custody
/// account as sender.
pub trait AssetLedger: Send + Sync {
    /// Move `amount` from custody to `to`. `false` means nothing moved.
    fn transfer(&self, to: Address, amount: u128) -> bool;

    /// Balance held by `owner`.
    fn balance_of(&self, owner: Address) -> u128;
}

/// Callback run after every successful transfer, outside any ledger lock.
pub type TransferHook = Arc<dyn Fn(Address, u128) + Send + Sync>;

/// In-memory token ledger.
///
/// Transfers are drawn from `holder`. Supports a one-shot failure switch
/// and a receiver hook so hosts and tests can model hostile ledgers.
pub struct InMemoryAssetLedger {
    holder: Address,
    balances: Mutex<HashMap<Address, u128>>,
    fail_next: AtomicBool,
    hook: Mutex<Option<TransferHook>>,
}

impl InMemoryAssetLedger {
    #[must_use]
    pub fn new(holder: Address) -> Self {
        Self {
            holder,
            balances: Mutex::new(HashMap::new()),
            fail_next: AtomicBool::new(false),
            hook: Mutex::new(None),
        }
    }

    /// The account transfers are drawn from.
    #[must_use]
    pub fn holder(&self) -> Address {
        self.holder
    }

    /// Credit `amount` to `owner` out of thin air.
    pub fn mint(&self, owner: Address, amount: u128) {
        let mut balances = self.balances();
        let entry = balances.entry(owner).or_default();
        *entry = entry.saturating_add(amount);
    }

    /// Make the next transfer report failure without moving funds.
    pub fn fail_next_transfer(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Install a hook invoked after each successful transfer.
    pub fn set_transfer_hook(&self, hook: TransferHook) {
        *self.hook.lock().unwrap_or_else(PoisonError::into_inner) = Some(hook);
    }

    /// Sum of all balances.
    pub fn total_supply(&self) -> u128 {
        self.balances().values().copied().fold(0u128, u128::saturating_add)
    }

    fn balances(&self) -> MutexGuard<'_, HashMap<Address, u128>> {
        self.balances.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AssetLedger for InMemoryAssetLedger {
    fn transfer(&self, to: Address, amount: u128) -> bool {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return false;
        }

        {
            let mut balances = self.balances();
            let from_balance = balances.get(&self.holder).copied().unwrap_or(0);
            let Some(remaining) = from_balance.checked_sub(amount) else {
                return false;
            };
            if to != self.holder {
                let to_balance = balances.get(&to).copied().unwrap_or(0);
                let Some(credited) = to_balance.checked_add(amount) else {
                    return false;
                };
                balances.insert(self.holder, remaining);
                balances.insert(to, credited);
            }
        }

        let hook = self
            .hook
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(hook) = hook {
            hook(to, amount);
        }
        true
    }

    fn balance_of(&self, owner: Address) -> u128 {
        self.balances().get(&owner).copied().unwrap_or(0)
    }
}

impl std::fmt::Debug for InMemoryAssetLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryAssetLedger")
            .field("holder", &self.holder)
            .field("accounts", &self.balances().len())
            .finish_non_exhaustive()
    }
}
