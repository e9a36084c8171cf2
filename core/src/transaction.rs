//! Transaction skeletons
//!
//! A skeleton lists what a protocol consumes and produces. Fee inputs,
//! change, collateral and witnesses are left to the external ledger layer.

use crate::constants::{ONE_HOUR, TIME_EPSILON};
use crate::datum;
use crate::error::{InvariantViolation, Result};
use crate::multisig::Resolution;
use crate::payout::VendorDatum;
use crate::redeemer::Redeemer;
use crate::utxo::{
    Address, Credential, KeyHash, OutputReference, Timestamp, TxHash, UnspentOutput,
};
use crate::value::AssetBundle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use strongbox_metadata::TxMetadata;

/// Protocol a skeleton was built for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    Reorganize,
    Fund,
    Disburse,
    SweepTreasury,
    WithdrawRewards,
    Adjudicate,
    Modify,
    Cancel,
    VendorWithdraw,
    SweepVendor,
    RecoverMalformed,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Reorganize => "reorganize",
            Operation::Fund => "fund",
            Operation::Disburse => "disburse",
            Operation::SweepTreasury => "treasury sweep",
            Operation::WithdrawRewards => "treasury withdraw",
            Operation::Adjudicate => "adjudicate",
            Operation::Modify => "modify",
            Operation::Cancel => "cancel",
            Operation::VendorWithdraw => "vendor withdraw",
            Operation::SweepVendor => "vendor sweep",
            Operation::RecoverMalformed => "malformed recovery",
        };
        f.write_str(name)
    }
}

/// Validity interval: `valid_from` inclusive, `valid_until` exclusive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityWindow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<Timestamp>,
}

impl ValidityWindow {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn between(from: Timestamp, until: Timestamp) -> Self {
        Self {
            valid_from: Some(from),
            valid_until: Some(until),
        }
    }

    /// `[now, now + span)`
    pub fn starting_at(now: Timestamp, span: Timestamp) -> Self {
        Self::between(now, now.saturating_add(span))
    }

    /// Up to an hour from `now`, ending strictly before `deadline`
    pub fn before_deadline(
        now: Timestamp,
        deadline: Timestamp,
    ) -> std::result::Result<Self, InvariantViolation> {
        let until = now
            .saturating_add(ONE_HOUR)
            .min(deadline.saturating_sub(TIME_EPSILON));
        if now >= until {
            return Err(InvariantViolation::DeadlinePassed { now, deadline });
        }
        Ok(Self::between(now, until))
    }

    /// An hour from `now`, which must lie strictly after `expiration`
    pub fn after_expiration(
        now: Timestamp,
        expiration: Timestamp,
    ) -> std::result::Result<Self, InvariantViolation> {
        if now <= expiration {
            return Err(InvariantViolation::NotYetExpired { now, expiration });
        }
        Ok(Self::starting_at(now, ONE_HOUR))
    }

    pub fn ensure_non_empty(&self) -> std::result::Result<(), InvariantViolation> {
        match (self.valid_from, self.valid_until) {
            (Some(from), Some(until)) if from >= until => {
                Err(InvariantViolation::EmptyValidityWindow { from, until })
            }
            _ => Ok(()),
        }
    }

    /// True iff the whole window lies strictly before `deadline`
    pub fn is_entirely_before(&self, deadline: Timestamp) -> bool {
        matches!(self.valid_until, Some(until) if until <= deadline)
    }

    /// True iff the whole window lies strictly after `moment`
    pub fn is_entirely_after(&self, moment: Timestamp) -> bool {
        matches!(self.valid_from, Some(from) if from > moment)
    }
}

/// Check that every input sits at `address`
pub fn ensure_inputs_at(
    inputs: &[UnspentOutput],
    address: &Address,
) -> std::result::Result<(), InvariantViolation> {
    if inputs.is_empty() {
        return Err(InvariantViolation::NoInputs);
    }
    match inputs.iter().find(|utxo| &utxo.address != address) {
        Some(utxo) => Err(InvariantViolation::UnexpectedAddress {
            reference: utxo.reference,
            expected: address.clone(),
            actual: utxo.address.clone(),
        }),
        None => Ok(()),
    }
}

/// Datum attached to a produced output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OutputDatum {
    /// No datum at all
    #[default]
    None,
    /// The empty datum carried by plain treasury outputs
    Void,
    Vendor(VendorDatum),
    /// Opaque datum bytes carried over or supplied by the caller
    Inline(#[serde(with = "hex::serde")] Vec<u8>),
}

impl OutputDatum {
    /// Carry an input's datum over verbatim
    pub fn verbatim(input_datum: Option<&Vec<u8>>) -> Self {
        match input_datum {
            Some(bytes) if datum::is_void(bytes) => OutputDatum::Void,
            Some(bytes) => OutputDatum::Inline(bytes.clone()),
            None => OutputDatum::None,
        }
    }

    /// Inline bytes as they would appear on chain
    pub fn to_bytes(&self) -> Result<Option<Vec<u8>>> {
        match self {
            OutputDatum::None => Ok(None),
            OutputDatum::Void => Ok(Some(datum::void())),
            OutputDatum::Vendor(vendor) => Ok(Some(vendor.to_bytes()?)),
            OutputDatum::Inline(bytes) => Ok(Some(bytes.clone())),
        }
    }
}

/// Output produced by a skeleton
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    pub address: Address,
    pub value: AssetBundle,
    pub datum: OutputDatum,
}

impl TxOutput {
    pub fn new(address: Address, value: AssetBundle, datum: OutputDatum) -> Self {
        Self {
            address,
            value,
            datum,
        }
    }
}

/// Script-locked input consumed under a redeemer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptInput {
    pub utxo: UnspentOutput,
    pub redeemer: Redeemer,
}

/// Reward-account withdrawal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub account: Credential,
    pub amount: u64,
}

/// What a protocol hands to the ledger layer for balancing and signing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxSkeleton {
    pub operation: Operation,
    pub inputs: Vec<ScriptInput>,
    pub reference_inputs: Vec<OutputReference>,
    pub outputs: Vec<TxOutput>,
    pub validity: ValidityWindow,
    pub required_signers: BTreeSet<KeyHash>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub withdrawals: Vec<Withdrawal>,
    /// Base-asset amount donated to the protocol-level treasury
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donation: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<TxMetadata>,
}

impl TxSkeleton {
    /// Sum of every consumed input
    pub fn consumed(&self) -> AssetBundle {
        let mut total: AssetBundle = self.inputs.iter().map(|input| &input.utxo.value).sum();
        for withdrawal in &self.withdrawals {
            total += &AssetBundle::from_base(withdrawal.amount as i128);
        }
        total
    }

    /// Sum of every produced output plus the donation
    pub fn produced(&self) -> AssetBundle {
        let mut total: AssetBundle = self.outputs.iter().map(|output| &output.value).sum();
        if let Some(donation) = self.donation {
            total += &AssetBundle::from_base(donation as i128);
        }
        total
    }

    /// Outputs paying to `address`
    pub fn outputs_to<'a>(&'a self, address: &Address) -> impl Iterator<Item = &'a TxOutput> {
        let address = address.clone();
        self.outputs
            .iter()
            .filter(move |output| output.address == address)
    }

    /// The produced outputs as they appear on chain once submitted as `tx_hash`
    pub fn unspent_outputs(&self, tx_hash: TxHash) -> Result<Vec<UnspentOutput>> {
        self.outputs
            .iter()
            .enumerate()
            .map(|(index, output)| {
                let mut utxo = UnspentOutput::new(
                    OutputReference::new(tx_hash, index as u32),
                    output.address.clone(),
                    output.value.clone(),
                );
                utxo.datum = output.datum.to_bytes()?;
                Ok(utxo)
            })
            .collect()
    }

    /// Check what the validator will re-check: positive outputs, value
    /// conservation, a non-empty window and no input spent twice.
    pub fn verify(&self) -> std::result::Result<(), InvariantViolation> {
        for (index, output) in self.outputs.iter().enumerate() {
            if !output.value.is_valid_output() {
                return Err(InvariantViolation::InvalidOutputValue {
                    index,
                    value: output.value.clone(),
                });
            }
        }

        let mut seen = BTreeSet::new();
        for input in &self.inputs {
            if !seen.insert(input.utxo.reference) {
                return Err(InvariantViolation::DuplicateInput {
                    reference: input.utxo.reference,
                });
            }
        }

        let consumed = self.consumed();
        let produced = self.produced();
        if consumed != produced {
            return Err(InvariantViolation::ValueNotConserved { consumed, produced });
        }

        self.validity.ensure_non_empty()
    }
}

/// Incremental construction of a [`TxSkeleton`], verified on `finish`
#[derive(Debug)]
pub struct SkeletonBuilder {
    skeleton: TxSkeleton,
}

impl SkeletonBuilder {
    pub fn new(operation: Operation) -> Self {
        Self {
            skeleton: TxSkeleton {
                operation,
                inputs: Vec::new(),
                reference_inputs: Vec::new(),
                outputs: Vec::new(),
                validity: ValidityWindow::unbounded(),
                required_signers: BTreeSet::new(),
                withdrawals: Vec::new(),
                donation: None,
                metadata: None,
            },
        }
    }

    pub fn spend(mut self, utxo: UnspentOutput, redeemer: Redeemer) -> Self {
        self.skeleton.inputs.push(ScriptInput { utxo, redeemer });
        self
    }

    pub fn reference(mut self, references: impl IntoIterator<Item = OutputReference>) -> Self {
        self.skeleton.reference_inputs.extend(references);
        self
    }

    pub fn pay(mut self, address: Address, value: AssetBundle, datum: OutputDatum) -> Self {
        self.skeleton
            .outputs
            .push(TxOutput::new(address, value, datum));
        self
    }

    /// Pay only when `value` is not empty
    pub fn pay_if_any(self, address: Address, value: AssetBundle, datum: OutputDatum) -> Self {
        if value.is_empty() {
            self
        } else {
            self.pay(address, value, datum)
        }
    }

    pub fn withdraw(mut self, account: Credential, amount: u64) -> Self {
        self.skeleton.withdrawals.push(Withdrawal { account, amount });
        self
    }

    pub fn donate(mut self, amount: u64) -> Self {
        self.skeleton.donation = Some(amount);
        self
    }

    pub fn validity(mut self, window: ValidityWindow) -> Self {
        self.skeleton.validity = window;
        self
    }

    pub fn signer(mut self, key_hash: KeyHash) -> Self {
        self.skeleton.required_signers.insert(key_hash);
        self
    }

    /// Require the signers of a resolved permission
    pub fn authorize(mut self, resolution: &Resolution) -> Self {
        self.skeleton
            .required_signers
            .extend(resolution.signers.iter().copied());
        self
    }

    pub fn metadata(mut self, metadata: Option<TxMetadata>) -> Self {
        self.skeleton.metadata = metadata;
        self
    }

    pub fn finish(self) -> std::result::Result<TxSkeleton, InvariantViolation> {
        self.skeleton.verify()?;
        log::info!(
            "built {} skeleton: {} inputs, {} outputs, {} signers",
            self.skeleton.operation,
            self.skeleton.inputs.len(),
            self.skeleton.outputs.len(),
            self.skeleton.required_signers.len()
        );
        Ok(self.skeleton)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redeemer::TreasuryRedeemer;
    use crate::utxo::ScriptHash;

    fn treasury() -> Address {
        Address::script(ScriptHash([1; 28]))
    }

    fn utxo(index: u32, amount: i128) -> UnspentOutput {
        UnspentOutput::new(
            OutputReference::new(TxHash([3; 32]), index),
            treasury(),
            AssetBundle::from_base(amount),
        )
    }

    #[test]
    fn test_balanced_skeleton_verifies() {
        let skeleton = SkeletonBuilder::new(Operation::Reorganize)
            .spend(utxo(0, 60), Redeemer::Treasury(TreasuryRedeemer::Reorganize))
            .spend(utxo(1, 40), Redeemer::Treasury(TreasuryRedeemer::Reorganize))
            .pay(treasury(), AssetBundle::from_base(100), OutputDatum::Void)
            .finish()
            .unwrap();
        assert_eq!(skeleton.consumed(), skeleton.produced());
    }

    #[test]
    fn test_unbalanced_skeleton_is_rejected() {
        let result = SkeletonBuilder::new(Operation::Reorganize)
            .spend(utxo(0, 60), Redeemer::Treasury(TreasuryRedeemer::Reorganize))
            .pay(treasury(), AssetBundle::from_base(61), OutputDatum::Void)
            .finish();
        assert!(matches!(
            result,
            Err(InvariantViolation::ValueNotConserved { .. })
        ));
    }

    #[test]
    fn test_withdrawal_and_donation_count_towards_balance() {
        let skeleton = SkeletonBuilder::new(Operation::SweepTreasury)
            .spend(utxo(0, 100), Redeemer::Treasury(TreasuryRedeemer::SweepTreasury))
            .withdraw(Credential::Script(ScriptHash([1; 28])), 20)
            .donate(120)
            .finish()
            .unwrap();
        assert_eq!(skeleton.produced(), AssetBundle::from_base(120));
    }

    #[test]
    fn test_duplicate_input_is_rejected() {
        let result = SkeletonBuilder::new(Operation::Reorganize)
            .spend(utxo(0, 50), Redeemer::Treasury(TreasuryRedeemer::Reorganize))
            .spend(utxo(0, 50), Redeemer::Treasury(TreasuryRedeemer::Reorganize))
            .pay(treasury(), AssetBundle::from_base(100), OutputDatum::Void)
            .finish();
        assert!(matches!(result, Err(InvariantViolation::DuplicateInput { .. })));
    }

    #[test]
    fn test_zero_output_is_rejected() {
        let result = SkeletonBuilder::new(Operation::Reorganize)
            .spend(utxo(0, 50), Redeemer::Treasury(TreasuryRedeemer::Reorganize))
            .pay(treasury(), AssetBundle::from_base(50), OutputDatum::Void)
            .pay(treasury(), AssetBundle::new(), OutputDatum::Void)
            .finish();
        assert!(matches!(
            result,
            Err(InvariantViolation::InvalidOutputValue { index: 1, .. })
        ));
    }

    #[test]
    fn test_window_predicates() {
        let window = ValidityWindow::between(100, 200);
        assert!(window.is_entirely_before(200));
        assert!(!window.is_entirely_before(199));
        assert!(window.is_entirely_after(99));
        assert!(!window.is_entirely_after(100));
        assert!(!ValidityWindow::unbounded().is_entirely_before(u64::MAX));
        assert!(ValidityWindow::between(5, 5).ensure_non_empty().is_err());
    }

    #[test]
    fn test_outputs_to_outlives_address_argument() {
        let skeleton = SkeletonBuilder::new(Operation::Reorganize)
            .spend(utxo(0, 100), Redeemer::Treasury(TreasuryRedeemer::Reorganize))
            .pay(treasury(), AssetBundle::from_base(70), OutputDatum::Void)
            .pay(
                Address::script(ScriptHash([2; 28])),
                AssetBundle::from_base(30),
                OutputDatum::None,
            )
            .finish()
            .unwrap();

        let to_treasury: Vec<&TxOutput> = skeleton.outputs_to(&treasury()).collect();
        let elsewhere: Vec<&TxOutput> = skeleton
            .outputs_to(&Address::script(ScriptHash([2; 28])))
            .collect();
        assert_eq!(to_treasury.len(), 1);
        assert_eq!(to_treasury[0].value, AssetBundle::from_base(70));
        assert_eq!(elsewhere[0].value, AssetBundle::from_base(30));
    }

    #[test]
    fn test_verbatim_datum_keeps_bytes() {
        assert_eq!(OutputDatum::verbatim(Some(&datum::void())), OutputDatum::Void);
        assert_eq!(
            OutputDatum::verbatim(Some(&vec![0x01, 0x02])),
            OutputDatum::Inline(vec![0x01, 0x02])
        );
        assert_eq!(OutputDatum::verbatim(None), OutputDatum::None);
        for bytes in [datum::void(), vec![0x01, 0x02]] {
            let relocked = OutputDatum::verbatim(Some(&bytes));
            assert_eq!(relocked.to_bytes().unwrap(), Some(bytes));
        }
    }

    #[test]
    fn test_unspent_outputs_carry_datum_bytes() {
        let skeleton = SkeletonBuilder::new(Operation::Reorganize)
            .spend(utxo(0, 100), Redeemer::Treasury(TreasuryRedeemer::Reorganize))
            .pay(treasury(), AssetBundle::from_base(60), OutputDatum::Void)
            .pay(treasury(), AssetBundle::from_base(40), OutputDatum::None)
            .finish()
            .unwrap();

        let outputs = skeleton.unspent_outputs(TxHash([8; 32])).unwrap();
        assert_eq!(outputs[1].reference, OutputReference::new(TxHash([8; 32]), 1));
        assert_eq!(outputs[0].datum, Some(datum::void()));
        assert_eq!(outputs[1].datum, None);
    }

    #[test]
    fn test_deadline_windows() {
        let window = ValidityWindow::before_deadline(0, 10 * ONE_HOUR).unwrap();
        assert_eq!(window, ValidityWindow::between(0, ONE_HOUR));

        let window = ValidityWindow::before_deadline(0, 30_000).unwrap();
        assert_eq!(window.valid_until, Some(29_000));
        assert!(window.is_entirely_before(30_000));

        assert!(matches!(
            ValidityWindow::before_deadline(29_500, 30_000),
            Err(InvariantViolation::DeadlinePassed { .. })
        ));

        assert!(matches!(
            ValidityWindow::after_expiration(100, 100),
            Err(InvariantViolation::NotYetExpired { .. })
        ));
        let window = ValidityWindow::after_expiration(101, 100).unwrap();
        assert!(window.is_entirely_after(100));
    }

    #[test]
    fn test_inputs_must_sit_at_address() {
        assert_eq!(
            ensure_inputs_at(&[], &treasury()),
            Err(InvariantViolation::NoInputs)
        );
        assert!(ensure_inputs_at(&[utxo(0, 1)], &treasury()).is_ok());

        let stray = UnspentOutput::new(
            OutputReference::new(TxHash([4; 32]), 0),
            Address::script(ScriptHash([2; 28])),
            AssetBundle::from_base(1),
        );
        assert!(matches!(
            ensure_inputs_at(&[utxo(0, 1), stray], &treasury()),
            Err(InvariantViolation::UnexpectedAddress { .. })
        ));
    }
}
