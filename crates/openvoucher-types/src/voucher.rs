//! # Voucher: the signed payout descriptor
//!
//! A voucher is issued off-system by the authority and redeemed exactly once
//! by its recipient.
//!
//! ## Canonical Encoding
//!
//! The signed payload is a fixed-layout, delimiter-free concatenation of the
//! economically relevant fields. Every field has a fixed width, so no two
//! distinct tuples can produce the same byte string:
//!
//! ```text
//!   0        32        64                84         116        124
//!   ┌────────┬─────────┬─────────────────┬──────────┬──────────┐
//!   │ amount │   fee   │    recipient    │ uniqueId │ expires  │
//!   │ u256BE │ u256BE  │    20 bytes     │  u256BE  │  u64BE   │
//!   └────────┴─────────┴─────────────────┴──────────┴──────────┘
//! ```
//!
//! The digest is `keccak256(encoding)`. The authority signs the
//! domain-separated hash of that digest (see [`crate::signed_message_hash`]).

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{
    Address, Digest32, UniqueId,
    constants::{ENCODED_VOUCHER_LEN, SIGNATURE_LEN, WORD_LEN},
    keccak256, signed_message_hash,
};

// ---------------------------------------------------------------------------
// VoucherTerms: the signed fields
// ---------------------------------------------------------------------------

/// The economically relevant fields of a voucher, i.e. everything the
/// authority's signature commits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VoucherTerms {
    /// Quantity of the payout asset to transfer.
    pub amount: u128,
    /// Settlement currency the redeemer pays to the operator.
    pub fee: u128,
    /// The only identity allowed to redeem.
    pub recipient: Address,
    /// Replay-protection key. Unique per voucher.
    pub unique_id: UniqueId,
    /// Unix seconds. The voucher is invalid at or after this instant.
    pub expires_at: u64,
}

impl VoucherTerms {
    /// Canonical fixed-width encoding of the terms.
    ///
    /// Format: `amount(32) || fee(32) || recipient(20) || unique_id(32) || expires_at(8)`
    #[must_use]
    pub fn encode_packed(&self) -> Vec<u8> {
        let mut payload = Vec::with_capacity(ENCODED_VOUCHER_LEN);
        payload.extend_from_slice(&uint_word(self.amount));
        payload.extend_from_slice(&uint_word(self.fee));
        payload.extend_from_slice(self.recipient.as_bytes());
        payload.extend_from_slice(&uint_word(self.unique_id));
        payload.extend_from_slice(&self.expires_at.to_be_bytes());
        debug_assert_eq!(payload.len(), ENCODED_VOUCHER_LEN);
        payload
    }

    /// Keccak-256 digest of [`Self::encode_packed`].
    #[must_use]
    pub fn digest(&self) -> Digest32 {
        keccak256(self.encode_packed())
    }

    /// The domain-separated hash the authority actually signs.
    #[must_use]
    pub fn signing_hash(&self) -> Digest32 {
        signed_message_hash(&self.digest())
    }

    /// Whether the terms are still redeemable at `now` (unix seconds).
    #[must_use]
    pub fn is_live_at(&self, now: u64) -> bool {
        now < self.expires_at
    }
}

/// Left-pad an unsigned integer into a 32-byte big-endian word.
fn uint_word(value: u128) -> [u8; WORD_LEN] {
    let mut word = [0u8; WORD_LEN];
    word[WORD_LEN - 16..].copy_from_slice(&value.to_be_bytes());
    word
}

// ---------------------------------------------------------------------------
// VoucherSignature
// ---------------------------------------------------------------------------

/// Detached signature bytes as presented by the redeemer.
///
/// Expected layout is `r (32) || s (32) || v (1)`. The length is checked by
/// the verifier, not here. Serialized as `0x`-prefixed hex.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct VoucherSignature(pub Vec<u8>);

impl VoucherSignature {
    /// Assemble a signature from its `r`, `s` and `v` components.
    #[must_use]
    pub fn from_parts(r: &[u8; 32], s: &[u8; 32], v: u8) -> Self {
        let mut bytes = Vec::with_capacity(SIGNATURE_LEN);
        bytes.extend_from_slice(r);
        bytes.extend_from_slice(s);
        bytes.push(v);
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for VoucherSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VoucherSignature({self})")
    }
}

impl fmt::Display for VoucherSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0))
    }
}

impl From<Vec<u8>> for VoucherSignature {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl Serialize for VoucherSignature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for VoucherSignature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let body = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(body)
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Voucher
// ---------------------------------------------------------------------------

/// A signed voucher: the terms plus the authority's detached signature.
///
/// Immutable once issued. Only `terms.unique_id` outlives a redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    pub terms: VoucherTerms,
    pub signature: VoucherSignature,
}

impl Voucher {
    #[must_use]
    pub fn new(terms: VoucherTerms, signature: VoucherSignature) -> Self {
        Self { terms, signature }
    }

    #[must_use]
    pub fn unique_id(&self) -> UniqueId {
        self.terms.unique_id
    }

    #[must_use]
    pub fn recipient(&self) -> Address {
        self.terms.recipient
    }

    /// Parse a voucher from its JSON representation.
    pub fn from_json_str(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the voucher to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Dummy terms for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl VoucherTerms {
    pub fn dummy(recipient: Address, unique_id: UniqueId) -> Self {
        Self {
            amount: 1_000,
            fee: 5,
            recipient,
            unique_id,
            expires_at: u64::MAX,
        }
    }
}
