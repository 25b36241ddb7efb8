//! Voucher issuance on behalf of an authority key.
//!
//! Issuance happens off-system; this type exists for operator tooling (the
//! `openvoucher` CLI) and for tests. Settlement never touches a private key.

use k256::ecdsa::SigningKey;
use openvoucher_types::{
    Address, Digest32, OpenvoucherError, Result, Voucher, VoucherSignature, VoucherTerms,
};
use rand::rngs::OsRng;

use crate::{signature::RecoverableSignature, verifier::address_of};

/// An authority signing key.
#[derive(Clone)]
pub struct AuthoritySigner {
    key: SigningKey,
}

impl AuthoritySigner {
    /// Generate a fresh key from the OS RNG.
    #[must_use]
    pub fn random() -> Self {
        Self {
            key: SigningKey::random(&mut OsRng),
        }
    }

    /// Load a key from its 32-byte big-endian secret scalar.
    ///
    /// # Errors
    /// Returns [`OpenvoucherError::InvalidKey`] if the bytes are not a valid
    /// non-zero scalar.
    pub fn from_bytes(secret: &[u8]) -> Result<Self> {
        let key = SigningKey::from_slice(secret)
            .map_err(|e| OpenvoucherError::InvalidKey(e.to_string()))?;
        Ok(Self { key })
    }

    /// Load a key from hex, with or without a `0x` prefix.
    pub fn from_hex(secret: &str) -> Result<Self> {
        let trimmed = secret.trim();
        let body = trimmed.strip_prefix("0x").unwrap_or(trimmed);
        let bytes = hex::decode(body).map_err(|e| OpenvoucherError::InvalidKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// The secret scalar as `0x`-prefixed hex.
    #[must_use]
    pub fn secret_hex(&self) -> String {
        format!("0x{}", hex::encode(self.key.to_bytes()))
    }

    /// The authority address vouchers from this key recover to.
    #[must_use]
    pub fn address(&self) -> Address {
        address_of(self.key.verifying_key())
    }

    /// Sign a 32-byte hash exactly as given, with no domain prefix.
    pub fn sign_prehash(&self, prehash: &Digest32) -> Result<VoucherSignature> {
        let (signature, recovery_id) = self
            .key
            .sign_prehash_recoverable(prehash)
            .map_err(|e| OpenvoucherError::InvalidKey(e.to_string()))?;
        Ok(RecoverableSignature {
            signature,
            recovery_id,
        }
        .to_voucher_signature())
    }

    /// Issue a voucher: sign the domain-separated digest of `terms`.
    pub fn sign(&self, terms: VoucherTerms) -> Result<Voucher> {
        let signature = self.sign_prehash(&terms.signing_hash())?;
        Ok(Voucher::new(terms, signature))
    }
}

impl std::fmt::Debug for AuthoritySigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthoritySigner")
            .field("address", &self.address())
            .finish_non_exhaustive()
    }
}
