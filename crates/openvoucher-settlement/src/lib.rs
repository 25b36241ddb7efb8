//! # openvoucher-settlement
//!
//! **Settlement**: redeems signed vouchers exactly once.
//!
//! ## Architecture
//!
//! The [`SettlementEngine`] receives a [`openvoucher_types::Voucher`] plus a
//! settlement-currency payment and:
//! 1. Rejects ids already in the [`ReplayLedger`]
//! 2. Rejects expired vouchers (`now >= expires_at`)
//! 3. Rejects callers other than the recipient
//! 4. Verifies the authority signature
//! 5. Rejects payments below the fee
//! 6. Marks the id settled, credits the fee in the [`FeeVault`], then
//!    transfers the payout through the [`AssetLedger`]
//! 7. Rolls everything back if a transfer fails
//!
//! ## Reentrancy
//!
//! The asset transfer is an external call that may run caller-controlled
//! code and re-enter [`SettlementEngine::redeem`]. The replay mark is
//! committed before that call, so a nested attempt on the same voucher is
//! rejected at the first gate. No lock is held across the call.

pub mod asset_ledger;
pub mod clock;
pub mod engine;
pub mod fee_vault;
pub mod observer;
pub mod replay_ledger;

pub use asset_ledger::{AssetLedger, InMemoryAssetLedger};
pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::SettlementEngine;
pub use fee_vault::FeeVault;
pub use observer::{RecordingObserver, SettlementObserver, TracingObserver};
pub use replay_ledger::{ReplayLedger, ReplaySnapshot};
