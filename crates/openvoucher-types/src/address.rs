//! Account identities used throughout OpenVoucher.
//!
//! An [`Address`] is the last 20 bytes of the Keccak-256 hash of an
//! uncompressed secp256k1 public key. It identifies the voucher authority,
//! the fee operator, the engine's custody account, and every recipient.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{OpenvoucherError, constants::ADDRESS_LEN};

/// Caller-chosen nonce that identifies a voucher for replay protection.
pub type UniqueId = u128;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 20-byte account identity.
///
/// Serialized as a `0x`-prefixed lowercase hex string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Default)]
pub struct Address(pub [u8; ADDRESS_LEN]);

impl Address {
    /// The all-zero address. Never a valid authority.
    pub const ZERO: Self = Self([0u8; ADDRESS_LEN]);

    #[must_use]
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Build an address from a slice that must be exactly 20 bytes long.
    ///
    /// # Errors
    /// Returns [`OpenvoucherError::InvalidAddress`] on a length mismatch.
    pub fn from_slice(bytes: &[u8]) -> crate::Result<Self> {
        let raw: [u8; ADDRESS_LEN] = bytes.try_into().map_err(|_| {
            OpenvoucherError::InvalidAddress(format!(
                "expected {ADDRESS_LEN} bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(Self(raw))
    }

    /// Derive an address from the 64-byte `x || y` body of an uncompressed
    /// public key (the SEC1 `0x04` tag already stripped).
    #[must_use]
    pub fn from_public_key_body(body: &[u8]) -> Self {
        let hash = crate::keccak256(body);
        let mut raw = [0u8; ADDRESS_LEN];
        raw.copy_from_slice(&hash[hash.len() - ADDRESS_LEN..]);
        Self(raw)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// First four bytes in hex, for compact log output.
    #[must_use]
    pub fn short(&self) -> String {
        format!("0x{}", hex::encode(&self.0[..4]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = OpenvoucherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let bytes = hex::decode(body)
            .map_err(|e| OpenvoucherError::InvalidAddress(format!("{s}: {e}")))?;
        Self::from_slice(&bytes)
    }
}

impl From<[u8; ADDRESS_LEN]> for Address {
    fn from(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Random address for unit tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Address {
    pub fn random() -> Self {
        Self(rand::random::<[u8; ADDRESS_LEN]>())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_prefixed_lowercase_hex() {
        let addr = Address([0xAB; ADDRESS_LEN]);
        assert_eq!(addr.to_string(), format!("0x{}", "ab".repeat(20)));
        assert_eq!(addr.short(), "0xabababab");
    }

    #[test]
    fn parse_accepts_with_and_without_prefix() {
        let hex_body = "00112233445566778899aabbccddeeff00112233";
        let a: Address = format!("0x{hex_body}").parse().unwrap();
        let b: Address = hex_body.parse().unwrap();
        let c: Address = format!("0X{}", hex_body.to_uppercase()).parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert_eq!(a.0[0], 0x00);
        assert_eq!(a.0[19], 0x33);
    }

    #[test]
    fn parse_rejects_wrong_length() {
        let err = "0x0011".parse::<Address>().unwrap_err();
        assert!(matches!(err, OpenvoucherError::InvalidAddress(_)));
    }

    #[test]
    fn parse_rejects_non_hex() {
        let err = "0xzz112233445566778899aabbccddeeff00112233"
            .parse::<Address>()
            .unwrap_err();
        assert!(matches!(err, OpenvoucherError::InvalidAddress(_)));
    }

    #[test]
    fn zero_address() {
        assert!(Address::ZERO.is_zero());
        assert!(!Address::new([1u8; ADDRESS_LEN]).is_zero());
        assert_eq!(Address::default(), Address::ZERO);
    }

    #[test]
    fn serde_uses_hex_string() {
        let addr = Address([0x01; ADDRESS_LEN]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"0x{}\"", "01".repeat(20)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, back);
    }
}
