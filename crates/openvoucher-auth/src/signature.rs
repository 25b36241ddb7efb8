//! Decoding of detached 65-byte voucher signatures.
//!
//! The wire layout is `r (32) || s (32) || v (1)`. The `r`/`s` pair is
//! handed to `k256` as-is, which rejects zero or out-of-range scalars; `v`
//! is accepted either as a raw recovery id (`0`/`1`) or in the legacy
//! `27`/`28` encoding.

use k256::ecdsa::{RecoveryId, Signature};
use openvoucher_types::{
    OpenvoucherError, Result, VoucherSignature,
    constants::{LEGACY_V_OFFSET, SIGNATURE_LEN},
};

/// A signature split into its algebraic components, ready for recovery.
#[derive(Debug, Clone, Copy)]
pub struct RecoverableSignature {
    pub signature: Signature,
    pub recovery_id: RecoveryId,
}

impl RecoverableSignature {
    /// Decode raw signature bytes.
    ///
    /// # Errors
    /// - [`OpenvoucherError::MalformedSignature`] if the input is not exactly
    ///   65 bytes or `v` is not one of `0, 1, 27, 28`
    /// - [`OpenvoucherError::RecoveryFailure`] if `r` or `s` is zero or not
    ///   below the curve order
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SIGNATURE_LEN {
            return Err(OpenvoucherError::MalformedSignature {
                reason: format!("expected {SIGNATURE_LEN} bytes, got {}", bytes.len()),
            });
        }
        let (rs, v) = bytes.split_at(SIGNATURE_LEN - 1);

        let recovery_id = recovery_id_from_v(v[0])?;
        let signature =
            Signature::from_slice(rs).map_err(|e| OpenvoucherError::RecoveryFailure {
                reason: format!("invalid r/s scalars: {e}"),
            })?;

        Ok(Self {
            signature,
            recovery_id,
        })
    }

    /// Re-encode as `r || s || v` with `v` in the legacy `27`/`28` form.
    #[must_use]
    pub fn to_voucher_signature(&self) -> VoucherSignature {
        let mut bytes = self.signature.to_bytes().to_vec();
        bytes.push(self.recovery_id.to_byte() + LEGACY_V_OFFSET);
        VoucherSignature(bytes)
    }
}

impl TryFrom<&VoucherSignature> for RecoverableSignature {
    type Error = OpenvoucherError;

    fn try_from(sig: &VoucherSignature) -> Result<Self> {
        Self::from_bytes(sig.as_bytes())
    }
}

/// Map a `v` byte onto a y-parity recovery id.
///
/// Recovery ids 2 and 3 (x-coordinate reduced mod n) are not accepted.
fn recovery_id_from_v(v: u8) -> Result<RecoveryId> {
    let raw = match v {
        0 | 1 => v,
        27 | 28 => v - LEGACY_V_OFFSET,
        other => {
            return Err(OpenvoucherError::MalformedSignature {
                reason: format!("recovery indicator {other} out of range"),
            });
        }
    };
    RecoveryId::from_byte(raw).ok_or_else(|| OpenvoucherError::MalformedSignature {
        reason: format!("recovery indicator {v} out of range"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_rs() -> Vec<u8> {
        let mut bytes = vec![0u8; 64];
        bytes[31] = 1; // r = 1
        bytes[63] = 1; // s = 1
        bytes
    }

    #[test]
    fn accepts_all_v_encodings() {
        for (v, parity) in [(0u8, false), (1, true), (27, false), (28, true)] {
            let mut bytes = valid_rs();
            bytes.push(v);
            let parsed = RecoverableSignature::from_bytes(&bytes).unwrap();
            assert_eq!(parsed.recovery_id.is_y_odd(), parity, "v = {v}");
            assert!(!parsed.recovery_id.is_x_reduced());
        }
    }

    #[test]
    fn rejects_out_of_range_v() {
        for v in [2u8, 3, 26, 29, 35, 255] {
            let mut bytes = valid_rs();
            bytes.push(v);
            let err = RecoverableSignature::from_bytes(&bytes).unwrap_err();
            assert!(
                matches!(err, OpenvoucherError::MalformedSignature { .. }),
                "v = {v}: {err:?}"
            );
        }
    }

    #[test]
    fn rejects_wrong_length() {
        for len in [0usize, 64, 66, 130] {
            let err = RecoverableSignature::from_bytes(&vec![1u8; len]).unwrap_err();
            assert!(matches!(err, OpenvoucherError::MalformedSignature { .. }));
        }
    }

    #[test]
    fn zero_scalars_are_recovery_failures() {
        let mut bytes = vec![0u8; 64];
        bytes.push(27);
        let err = RecoverableSignature::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, OpenvoucherError::RecoveryFailure { .. }));
    }

    #[test]
    fn scalars_above_order_are_recovery_failures() {
        let mut bytes = vec![0xffu8; 64];
        bytes.push(27);
        let err = RecoverableSignature::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, OpenvoucherError::RecoveryFailure { .. }));
    }

    #[test]
    fn reencodes_with_legacy_v() {
        let mut bytes = valid_rs();
        bytes.push(1);
        let parsed = RecoverableSignature::from_bytes(&bytes).unwrap();
        let sig = parsed.to_voucher_signature();
        assert_eq!(sig.len(), SIGNATURE_LEN);
        assert_eq!(sig.as_bytes()[64], 28);
        assert_eq!(&sig.as_bytes()[..64], &valid_rs()[..]);
    }
}
