//! Error types for OpenVoucher.
//!
//! All errors use the `OV_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: Redemption gate errors
//! - 2xx: Signature errors
//! - 3xx: Payment / transfer errors
//! - 4xx: Identity errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{Address, UniqueId};

/// Central error enum for all OpenVoucher operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpenvoucherError {
    // =================================================================
    // Redemption Gate Errors (1xx)
    // =================================================================
    /// The voucher's `unique_id` has already been settled.
    #[error("OV_ERR_100: Voucher already processed: {0}")]
    AlreadyProcessed(UniqueId),

    /// The voucher is at or past its expiry instant.
    #[error("OV_ERR_101: Voucher expired at {expires_at} (now {now})")]
    Expired { expires_at: u64, now: u64 },

    /// The caller is not the voucher's recipient.
    #[error("OV_ERR_102: Recipient mismatch: voucher is for {expected}, caller is {caller}")]
    RecipientMismatch { expected: Address, caller: Address },

    // =================================================================
    // Signature Errors (2xx)
    // =================================================================
    /// Signature has the wrong length or an out-of-range recovery indicator.
    #[error("OV_ERR_200: Malformed signature: {reason}")]
    MalformedSignature { reason: String },

    /// The signature values are degenerate and no signer can be recovered.
    #[error("OV_ERR_201: Signer recovery failed: {reason}")]
    RecoveryFailure { reason: String },

    /// Recovery succeeded but the signer is not the configured authority.
    #[error("OV_ERR_202: Signer mismatch: expected {expected}, recovered {recovered}")]
    SignerMismatch {
        expected: Address,
        recovered: Address,
    },

    // =================================================================
    // Payment / Transfer Errors (3xx)
    // =================================================================
    /// The attached payment does not cover the voucher fee.
    #[error("OV_ERR_300: Insufficient fee: required {required}, supplied {supplied}")]
    InsufficientFee { required: u128, supplied: u128 },

    /// The fee credit or the asset transfer failed; the redemption was rolled back.
    #[error("OV_ERR_301: Transfer failed: {reason}")]
    TransferFailure { reason: String },

    // =================================================================
    // Identity Errors (4xx)
    // =================================================================
    /// An address could not be parsed.
    #[error("OV_ERR_400: Invalid address: {0}")]
    InvalidAddress(String),

    /// A signing key could not be parsed.
    #[error("OV_ERR_401: Invalid signing key: {0}")]
    InvalidKey(String),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Configuration error (invalid config file, missing fields, etc.).
    #[error("OV_ERR_900: Configuration error: {0}")]
    Configuration(String),

    /// Serialization / deserialization error.
    #[error("OV_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// I/O error (disk).
    #[error("OV_ERR_902: I/O error: {0}")]
    Io(String),
}

impl OpenvoucherError {
    /// Whether this error came from the signature verifier.
    #[must_use]
    pub fn is_signature_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedSignature { .. } | Self::RecoveryFailure { .. } | Self::SignerMismatch { .. }
        )
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, OpenvoucherError>;

impl From<std::io::Error> for OpenvoucherError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for OpenvoucherError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = OpenvoucherError::AlreadyProcessed(42);
        let msg = format!("{err}");
        assert!(msg.starts_with("OV_ERR_100"), "Got: {msg}");
        assert!(msg.contains("42"));
    }

    #[test]
    fn insufficient_fee_display() {
        let err = OpenvoucherError::InsufficientFee {
            required: 5,
            supplied: 3,
        };
        let msg = format!("{err}");
        assert!(msg.contains("OV_ERR_300"));
        assert!(msg.contains("required 5"));
        assert!(msg.contains("supplied 3"));
    }

    #[test]
    fn signature_errors_classified() {
        assert!(
            OpenvoucherError::MalformedSignature {
                reason: "x".into()
            }
            .is_signature_error()
        );
        assert!(
            OpenvoucherError::SignerMismatch {
                expected: Address::ZERO,
                recovered: Address::ZERO,
            }
            .is_signature_error()
        );
        assert!(!OpenvoucherError::AlreadyProcessed(1).is_signature_error());
    }

    #[test]
    fn all_errors_have_ov_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(OpenvoucherError::Expired {
                expires_at: 10,
                now: 10,
            }),
            Box::new(OpenvoucherError::RecoveryFailure {
                reason: "degenerate".into(),
            }),
            Box::new(OpenvoucherError::TransferFailure {
                reason: "ledger".into(),
            }),
            Box::new(OpenvoucherError::Configuration("test".into())),
            Box::new(OpenvoucherError::InvalidKey("short".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("OV_ERR_"),
                "Error missing OV_ERR_ prefix: {msg}"
            );
        }
    }

    #[test]
    fn io_error_converts() {
        let err: OpenvoucherError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert!(matches!(err, OpenvoucherError::Io(msg) if msg.contains("missing")));
    }
}
