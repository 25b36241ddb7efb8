//! Atomic voucher redemption.
//!
//! Each redemption attempt walks the gates in order and stops at the first
//! failure without touching any state:
//!
//! ```text
//!   Received ─▶ not settled? ─▶ not expired? ─▶ caller == recipient?
//!            ─▶ signature valid? ─▶ payment >= fee? ─▶ Settled
//! ```
//!
//! Once every gate has passed:
//! 1. Mark `unique_id` in the replay ledger (before any external call)
//! 2. Credit the fee to the operator in the fee vault
//! 3. Transfer the payout through the asset ledger
//! 4. On failure in 2 or 3, release the mark and reverse the credit
//! 5. On success, notify observers

use std::sync::Arc;

use openvoucher_auth::SignatureVerifier;
use openvoucher_types::{
    Address, ExcessPaymentPolicy, OpenvoucherError, Result, Settlement, SettlementConfig,
    UniqueId, Voucher, VoucherRedeemed,
    constants::{ENGINE_NAME, VERSION},
};

use crate::{
    asset_ledger::AssetLedger,
    clock::{Clock, SystemClock},
    fee_vault::FeeVault,
    observer::SettlementObserver,
    replay_ledger::{ReplayLedger, ReplaySnapshot},
};

/// Redeems signed vouchers exactly once.
///
/// Shareable across threads (`Arc<SettlementEngine>`); every method takes
/// `&self`. Configuration is fixed at construction.
pub struct SettlementEngine {
    verifier: SignatureVerifier,
    /// Receives collected fees.
    operator: Address,
    /// The engine's account on the asset ledger.
    custody: Address,
    excess_payment: ExcessPaymentPolicy,
    replay: ReplayLedger,
    fees: FeeVault,
    asset: Arc<dyn AssetLedger>,
    clock: Arc<dyn Clock>,
    observers: Vec<Arc<dyn SettlementObserver>>,
}

impl SettlementEngine {
    /// Create an engine.
    ///
    /// `deployer` becomes the operator unless the config names one.
    ///
    /// # Errors
    /// Returns `Configuration` if the config fails validation.
    pub fn new(
        deployer: Address,
        config: &SettlementConfig,
        asset: Arc<dyn AssetLedger>,
    ) -> Result<Self> {
        config.validate()?;
        let operator = config.operator_or(deployer);

        tracing::info!(
            engine = ENGINE_NAME,
            version = VERSION,
            authority = %config.authority,
            operator = %operator,
            custody = %config.custody,
            excess_payment = ?config.excess_payment,
            "Settlement engine initialized"
        );

        Ok(Self {
            verifier: SignatureVerifier::new(config.authority),
            operator,
            custody: config.custody,
            excess_payment: config.excess_payment,
            replay: ReplayLedger::new(),
            fees: FeeVault::new(),
            asset,
            clock: Arc::new(SystemClock),
            observers: Vec::new(),
        })
    }

    /// Replace the time source.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Register an observer for settlement events.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn SettlementObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Start from a previously persisted set of settled ids.
    #[must_use]
    pub fn with_replay_snapshot(mut self, snapshot: &ReplaySnapshot) -> Self {
        self.replay = ReplayLedger::from_snapshot(snapshot);
        self
    }

    /// Redeem `voucher` on behalf of `caller`, who attaches `payment` units
    /// of settlement currency.
    ///
    /// On error nothing has changed: the id is not settled, no fee is
    /// retained, and no payout moved. The whole payment is the caller's
    /// again.
    ///
    /// # Errors
    /// - `AlreadyProcessed` if the id was settled before (or concurrently)
    /// - `Expired` if `now >= expires_at`
    /// - `RecipientMismatch` if `caller` is not the recipient
    /// - `MalformedSignature` / `RecoveryFailure` / `SignerMismatch` from the verifier
    /// - `InsufficientFee` if `payment < fee`
    /// - `TransferFailure` if the fee credit or payout transfer failed
    pub fn redeem(&self, caller: Address, voucher: &Voucher, payment: u128) -> Result<Settlement> {
        let unique_id = voucher.terms.unique_id;

        let now = self
            .check_gates(caller, voucher, payment)
            .inspect_err(|err| {
                tracing::debug!(
                    unique_id = %unique_id,
                    caller = %caller,
                    error = %err,
                    "Redemption rejected"
                );
            })?;

        // Effects first: a nested attempt triggered by the transfer below
        // must observe this id as settled.
        self.replay.mark_settled(unique_id)?;

        let (operator_credit, change) = self.split_payment(voucher.terms.fee, payment);
        if let Err(err) = self.fees.credit(self.operator, operator_credit) {
            self.replay.release(unique_id);
            tracing::warn!(unique_id = %unique_id, error = %err, "Fee credit failed, rolled back");
            return Err(err);
        }

        if !self.asset.transfer(voucher.terms.recipient, voucher.terms.amount) {
            self.fees.reverse(self.operator, operator_credit);
            self.replay.release(unique_id);
            tracing::warn!(
                unique_id = %unique_id,
                recipient = %voucher.terms.recipient,
                amount = %voucher.terms.amount,
                "Asset transfer failed, rolled back"
            );
            return Err(OpenvoucherError::TransferFailure {
                reason: format!(
                    "asset ledger refused transfer of {} to {}",
                    voucher.terms.amount, voucher.terms.recipient
                ),
            });
        }

        let settlement = Settlement {
            unique_id,
            recipient: voucher.terms.recipient,
            amount: voucher.terms.amount,
            fee: voucher.terms.fee,
            change,
            settled_at: now,
        };

        tracing::info!(
            unique_id = %unique_id,
            recipient = %settlement.recipient,
            amount = %settlement.amount,
            fee = %settlement.fee,
            change = %settlement.change,
            "Voucher settled"
        );

        self.notify(&settlement.event());
        Ok(settlement)
    }

    /// Run every read-only gate. Returns the time the checks were made at.
    fn check_gates(&self, caller: Address, voucher: &Voucher, payment: u128) -> Result<u64> {
        let terms = &voucher.terms;

        if self.replay.is_settled(terms.unique_id) {
            return Err(OpenvoucherError::AlreadyProcessed(terms.unique_id));
        }

        let now = self.clock.now_unix();
        if !terms.is_live_at(now) {
            return Err(OpenvoucherError::Expired {
                expires_at: terms.expires_at,
                now,
            });
        }

        if caller != terms.recipient {
            return Err(OpenvoucherError::RecipientMismatch {
                expected: terms.recipient,
                caller,
            });
        }

        self.verifier.verify_voucher(voucher)?;

        if payment < terms.fee {
            return Err(OpenvoucherError::InsufficientFee {
                required: terms.fee,
                supplied: payment,
            });
        }

        Ok(now)
    }

    /// `(credited to operator, returned to caller)` for a payment that
    /// already covers `fee`.
    fn split_payment(&self, fee: u128, payment: u128) -> (u128, u128) {
        match self.excess_payment {
            ExcessPaymentPolicy::Refund => (fee, payment - fee),
            ExcessPaymentPolicy::Retain => (payment, 0),
        }
    }

    fn notify(&self, event: &VoucherRedeemed) {
        for observer in &self.observers {
            observer.on_redeemed(event);
        }
    }

    // -----------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------

    /// Whether `unique_id` has been settled.
    pub fn is_settled(&self, unique_id: UniqueId) -> bool {
        self.replay.is_settled(unique_id)
    }

    /// Payout asset held by the engine's custody account.
    pub fn asset_balance(&self) -> u128 {
        self.asset.balance_of(self.custody)
    }

    /// Settlement currency credited to `owner` in the fee vault.
    pub fn fee_balance(&self, owner: Address) -> u128 {
        self.fees.balance_of(owner)
    }

    /// Persistable copy of the settled ids.
    pub fn replay_snapshot(&self) -> ReplaySnapshot {
        self.replay.snapshot()
    }

    #[must_use]
    pub fn authority(&self) -> Address {
        self.verifier.authority()
    }

    #[must_use]
    pub fn operator(&self) -> Address {
        self.operator
    }

    #[must_use]
    pub fn custody(&self) -> Address {
        self.custody
    }
}

impl std::fmt::Debug for SettlementEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettlementEngine")
            .field("authority", &self.verifier.authority())
            .field("operator", &self.operator)
            .field("custody", &self.custody)
            .field("excess_payment", &self.excess_payment)
            .field("settled", &self.replay.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use openvoucher_auth::AuthoritySigner;
    use openvoucher_types::VoucherTerms;

    use super::*;
    use crate::{FixedClock, InMemoryAssetLedger, RecordingObserver};

    const NOW: u64 = 1_700_000_000;

    struct Fixture {
        signer: AuthoritySigner,
        deployer: Address,
        ledger: Arc<InMemoryAssetLedger>,
        clock: Arc<FixedClock>,
        observer: Arc<RecordingObserver>,
        engine: SettlementEngine,
    }

    fn fixture_with(policy: ExcessPaymentPolicy) -> Fixture {
        let signer = AuthoritySigner::random();
        let deployer = Address::random();
        let custody = Address::random();
        let ledger = Arc::new(InMemoryAssetLedger::new(custody));
        ledger.mint(custody, 1_000_000);
        let clock = Arc::new(FixedClock::new(NOW));
        let observer = Arc::new(RecordingObserver::new());

        let config =
            SettlementConfig::new(signer.address(), custody).with_excess_payment(policy);
        let engine = SettlementEngine::new(deployer, &config, ledger.clone())
            .unwrap()
            .with_clock(clock.clone())
            .with_observer(observer.clone());

        Fixture {
            signer,
            deployer,
            ledger,
            clock,
            observer,
            engine,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(ExcessPaymentPolicy::Refund)
    }

    fn voucher(f: &Fixture, recipient: Address, unique_id: UniqueId) -> Voucher {
        f.signer
            .sign(VoucherTerms {
                amount: 1_000,
                fee: 5,
                recipient,
                unique_id,
                expires_at: NOW + 3_600,
            })
            .unwrap()
    }

    #[test]
    fn redeem_transfers_and_marks() {
        let f = fixture();
        let r = Address::random();
        let v = voucher(&f, r, 42);

        let settlement = f.engine.redeem(r, &v, 5).unwrap();

        assert_eq!(settlement.unique_id, 42);
        assert_eq!(settlement.recipient, r);
        assert_eq!(settlement.change, 0);
        assert_eq!(settlement.settled_at, NOW);
        assert_eq!(f.ledger.balance_of(r), 1_000);
        assert_eq!(f.engine.asset_balance(), 999_000);
        assert_eq!(f.engine.fee_balance(f.deployer), 5);
        assert!(f.engine.is_settled(42));
        assert_eq!(
            f.observer.events(),
            vec![VoucherRedeemed {
                unique_id: 42,
                recipient: r
            }]
        );
    }

    #[test]
    fn gates_run_in_order() {
        let f = fixture();
        let r = Address::random();
        let mut v = voucher(&f, r, 1);
        // Expired, wrong caller, bad signature and underpaid all at once:
        // expiry is reported first.
        v.terms.amount += 1;
        f.clock.set(v.terms.expires_at);
        let err = f.engine.redeem(Address::random(), &v, 0).unwrap_err();
        assert!(matches!(err, OpenvoucherError::Expired { .. }));

        f.clock.set(NOW);
        let err = f.engine.redeem(Address::random(), &v, 0).unwrap_err();
        assert!(matches!(err, OpenvoucherError::RecipientMismatch { .. }));

        let err = f.engine.redeem(r, &v, 0).unwrap_err();
        assert!(err.is_signature_error());

        let v = voucher(&f, r, 1);
        let err = f.engine.redeem(r, &v, 0).unwrap_err();
        assert!(matches!(err, OpenvoucherError::InsufficientFee { .. }));
    }

    #[test]
    fn refund_policy_returns_change() {
        let f = fixture_with(ExcessPaymentPolicy::Refund);
        let r = Address::random();
        let settlement = f.engine.redeem(r, &voucher(&f, r, 1), 12).unwrap();
        assert_eq!(settlement.change, 7);
        assert_eq!(f.engine.fee_balance(f.deployer), 5);
    }

    #[test]
    fn retain_policy_keeps_excess() {
        let f = fixture_with(ExcessPaymentPolicy::Retain);
        let r = Address::random();
        let settlement = f.engine.redeem(r, &voucher(&f, r, 1), 12).unwrap();
        assert_eq!(settlement.change, 0);
        assert_eq!(f.engine.fee_balance(f.deployer), 12);
    }

    #[test]
    fn failed_transfer_rolls_back() {
        let f = fixture();
        let r = Address::random();
        let v = voucher(&f, r, 9);

        f.ledger.fail_next_transfer();
        let err = f.engine.redeem(r, &v, 5).unwrap_err();

        assert!(matches!(err, OpenvoucherError::TransferFailure { .. }));
        assert!(!f.engine.is_settled(9));
        assert_eq!(f.engine.fee_balance(f.deployer), 0);
        assert_eq!(f.ledger.balance_of(r), 0);
        assert!(f.observer.events().is_empty());

        // Retry with the same voucher succeeds.
        f.engine.redeem(r, &v, 5).unwrap();
        assert!(f.engine.is_settled(9));
    }

    #[test]
    fn fee_overflow_rolls_back() {
        let f = fixture_with(ExcessPaymentPolicy::Retain);
        let r = Address::random();
        f.engine.redeem(r, &voucher(&f, r, 1), u128::MAX).unwrap();

        let err = f.engine.redeem(r, &voucher(&f, r, 2), 5).unwrap_err();
        assert!(matches!(err, OpenvoucherError::TransferFailure { .. }));
        assert!(!f.engine.is_settled(2));
        assert_eq!(f.ledger.balance_of(r), 1_000);
    }

    #[test]
    fn operator_from_config_overrides_deployer() {
        let signer = AuthoritySigner::random();
        let custody = Address::random();
        let operator = Address::random();
        let ledger = Arc::new(InMemoryAssetLedger::new(custody));
        let config = SettlementConfig::new(signer.address(), custody).with_operator(operator);
        let engine = SettlementEngine::new(Address::random(), &config, ledger).unwrap();
        assert_eq!(engine.operator(), operator);
        assert_eq!(engine.authority(), signer.address());
        assert_eq!(engine.custody(), custody);
    }

    #[test]
    fn zero_authority_is_rejected() {
        let ledger = Arc::new(InMemoryAssetLedger::new(Address::random()));
        let config = SettlementConfig::new(Address::ZERO, Address::random());
        let err = SettlementEngine::new(Address::random(), &config, ledger).unwrap_err();
        assert!(matches!(err, OpenvoucherError::Configuration(_)));
    }

    #[test]
    fn restored_snapshot_blocks_replay() {
        let f = fixture();
        let r = Address::random();
        let v = voucher(&f, r, 77);
        f.engine.redeem(r, &v, 5).unwrap();
        let snapshot = f.engine.replay_snapshot();

        let restarted = SettlementEngine::new(
            f.deployer,
            &SettlementConfig::new(f.signer.address(), f.ledger.holder()),
            f.ledger.clone(),
        )
        .unwrap()
        .with_clock(f.clock.clone())
        .with_replay_snapshot(&snapshot);

        let err = restarted.redeem(r, &v, 5).unwrap_err();
        assert!(matches!(err, OpenvoucherError::AlreadyProcessed(77)));
    }
}
