//! Authority signature verification.
//!
//! The verifier holds a single immutable authority [`Address`]. Acceptance
//! is decided solely by comparing that address with the one recovered from
//! the signature; there is no key registry and no mutable state.

use k256::ecdsa::VerifyingKey;
use openvoucher_types::{
    Address, Digest32, OpenvoucherError, Result, Voucher, VoucherSignature, signed_message_hash,
};

use crate::signature::RecoverableSignature;

/// Verifies that vouchers were signed by the configured authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureVerifier {
    authority: Address,
}

impl SignatureVerifier {
    #[must_use]
    pub fn new(authority: Address) -> Self {
        Self { authority }
    }

    /// The only identity whose signatures are accepted.
    #[must_use]
    pub fn authority(&self) -> Address {
        self.authority
    }

    /// Recover the signer of a voucher digest.
    ///
    /// The digest is domain-separated with the signed-message prefix before
    /// recovery, so callers pass the raw [`openvoucher_types::VoucherTerms::digest`].
    ///
    /// # Errors
    /// - `MalformedSignature` if the signature is not 65 bytes or `v` is out of range
    /// - `RecoveryFailure` if the signature values are degenerate, `s` is in the
    ///   upper half of the curve order, or no public key can be recovered
    pub fn recover_signer(digest: &Digest32, signature: &VoucherSignature) -> Result<Address> {
        let parsed = RecoverableSignature::try_from(signature)?;
        let prehash = signed_message_hash(digest);

        let key =
            VerifyingKey::recover_from_prehash(&prehash, &parsed.signature, parsed.recovery_id)
                .map_err(|e| OpenvoucherError::RecoveryFailure {
                    reason: format!("no signer recoverable: {e}"),
                })?;

        Ok(address_of(&key))
    }

    /// Check that `signature` over `digest` was produced by the authority.
    ///
    /// # Errors
    /// Any error from [`Self::recover_signer`], or `SignerMismatch` if the
    /// recovered address differs from the authority.
    pub fn verify_digest(&self, digest: &Digest32, signature: &VoucherSignature) -> Result<()> {
        let recovered = Self::recover_signer(digest, signature)?;
        if recovered != self.authority {
            tracing::debug!(
                expected = %self.authority,
                recovered = %recovered,
                "Voucher signer mismatch"
            );
            return Err(OpenvoucherError::SignerMismatch {
                expected: self.authority,
                recovered,
            });
        }
        Ok(())
    }

    /// Check a complete voucher: canonical digest of its terms against its
    /// attached signature.
    pub fn verify_voucher(&self, voucher: &Voucher) -> Result<()> {
        self.verify_digest(&voucher.terms.digest(), &voucher.signature)
    }
}

/// Address of a secp256k1 public key: last 20 bytes of
/// `keccak256(x || y)` over the uncompressed point.
#[must_use]
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    // Skip the SEC1 0x04 tag.
    Address::from_public_key_body(&point.as_bytes()[1..])
}
