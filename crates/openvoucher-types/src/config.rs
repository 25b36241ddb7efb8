//! Configuration types for an OpenVoucher settlement engine.
//!
//! All fields are fixed at construction; the engine exposes no setters.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Address, OpenvoucherError, Result};

/// What happens to payment in excess of the voucher fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExcessPaymentPolicy {
    /// Only the fee is consumed; the remainder is returned to the caller
    /// as [`crate::Settlement::change`].
    #[default]
    Refund,
    /// The whole payment is credited to the operator.
    Retain,
}

/// Initialization parameters for a settlement engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementConfig {
    /// The single identity whose voucher signatures are accepted.
    pub authority: Address,
    /// Receives collected fees. Defaults to the deployer when absent.
    #[serde(default)]
    pub operator: Option<Address>,
    /// The engine's own account on the asset ledger; payouts are drawn
    /// from its balance.
    pub custody: Address,
    /// Handling of overpayment.
    #[serde(default)]
    pub excess_payment: ExcessPaymentPolicy,
}

impl SettlementConfig {
    #[must_use]
    pub fn new(authority: Address, custody: Address) -> Self {
        Self {
            authority,
            operator: None,
            custody,
            excess_payment: ExcessPaymentPolicy::default(),
        }
    }

    #[must_use]
    pub fn with_operator(mut self, operator: Address) -> Self {
        self.operator = Some(operator);
        self
    }

    #[must_use]
    pub fn with_excess_payment(mut self, policy: ExcessPaymentPolicy) -> Self {
        self.excess_payment = policy;
        self
    }

    /// The operator identity, falling back to `deployer`.
    #[must_use]
    pub fn operator_or(&self, deployer: Address) -> Address {
        self.operator.unwrap_or(deployer)
    }

    /// Reject configurations that can never settle anything.
    ///
    /// # Errors
    /// Returns [`OpenvoucherError::Configuration`] if the authority is the
    /// zero address.
    pub fn validate(&self) -> Result<()> {
        if self.authority.is_zero() {
            return Err(OpenvoucherError::Configuration(
                "authority must not be the zero address".into(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| OpenvoucherError::Configuration(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }
}
