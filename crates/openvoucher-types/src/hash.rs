//! Keccak-256 helpers.

use sha3::{Digest, Keccak256};

use crate::constants::{DIGEST_LEN, SIGNED_MESSAGE_PREFIX};

/// A 32-byte Keccak-256 digest.
pub type Digest32 = [u8; DIGEST_LEN];

/// Keccak-256 of `data`.
#[must_use]
pub fn keccak256(data: impl AsRef<[u8]>) -> Digest32 {
    Keccak256::digest(data.as_ref()).into()
}

/// Domain-separated hash of a voucher digest:
/// `keccak256(SIGNED_MESSAGE_PREFIX || digest)`.
///
/// This is the value the authority signs.
#[must_use]
pub fn signed_message_hash(digest: &Digest32) -> Digest32 {
    let mut hasher = Keccak256::new();
    hasher.update(SIGNED_MESSAGE_PREFIX);
    hasher.update(digest);
    hasher.finalize().into()
}
