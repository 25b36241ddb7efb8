//! System-wide constants for OpenVoucher.

/// Length of an account address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Length of a Keccak-256 digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// Length of a detached voucher signature: `r (32) || s (32) || v (1)`.
pub const SIGNATURE_LEN: usize = 65;

/// Width of a single unsigned integer word in the canonical encoding.
pub const WORD_LEN: usize = 32;

/// Length of the canonical voucher encoding:
/// `amount (32) || fee (32) || recipient (20) || unique_id (32) || expires_at (8)`.
pub const ENCODED_VOUCHER_LEN: usize = WORD_LEN * 3 + ADDRESS_LEN + 8;

/// Domain-separation tag applied to a voucher digest before signing.
///
/// The trailing `32` is the decimal length of the digest that follows.
pub const SIGNED_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n32";

/// Offset added to the recovery id in the legacy `v` encoding (`27`/`28`).
pub const LEGACY_V_OFFSET: u8 = 27;

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "OpenVoucher";
