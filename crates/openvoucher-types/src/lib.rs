//! # openvoucher-types
//!
//! Shared types, errors, and configuration for **OpenVoucher**, the
//! offline-signed payout voucher system.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identities**: [`Address`], [`UniqueId`]
//! - **Voucher model**: [`VoucherTerms`], [`Voucher`], [`VoucherSignature`]
//! - **Canonical encoding**: [`VoucherTerms::encode_packed`], [`VoucherTerms::digest`]
//! - **Receipts**: [`Settlement`], [`VoucherRedeemed`]
//! - **Configuration**: [`SettlementConfig`], [`ExcessPaymentPolicy`]
//! - **Errors**: [`OpenvoucherError`] with `OV_ERR_` prefix codes
//! - **Constants**: fixed widths and protocol tags

pub mod address;
pub mod config;
pub mod constants;
pub mod error;
pub mod hash;
pub mod receipt;
pub mod voucher;

// Re-export all primary types at crate root for ergonomic imports:
//   use openvoucher_types::{Address, Voucher, VoucherTerms, ...};

pub use address::*;
pub use config::*;
pub use error::*;
pub use hash::*;
pub use receipt::*;
pub use voucher::*;

// Constants are accessed via `openvoucher_types::constants::FOO`
// (not re-exported to avoid name collisions).
