//! # openvoucher-auth
//!
//! **Authorization**: decides whether a voucher was signed by the configured
//! authority.
//!
//! ## Verification Pipeline
//!
//! ```text
//! VoucherTerms ──encode_packed──▶ keccak256 ──▶ digest
//!     digest ──"\x19Ethereum Signed Message:\n32" prefix──▶ keccak256 ──▶ signing hash
//!     signing hash + (r, s, v) ──secp256k1 recovery──▶ public key ──▶ Address
//!     Address == authority ?
//! ```
//!
//! - [`signature`]: decodes 65 raw bytes into `k256` signature components
//! - [`verifier`]: recovers the signer and compares it to the authority
//! - [`signer`]: issues vouchers on behalf of an authority key (tooling, tests)

pub mod signature;
pub mod signer;
pub mod verifier;

pub use signature::RecoverableSignature;
pub use signer::AuthoritySigner;
pub use verifier::SignatureVerifier;
