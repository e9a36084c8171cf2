//! Lock a payout schedule for a vendor

use crate::TreasuryContext;
use serde::{Deserialize, Serialize};
use strongbox_core::{
    ensure_inputs_at, resolve_signers, AssetBundle, BranchSelector, InvariantViolation,
    MultisigScript, Operation, OperationContext, OutputDatum, Payout, Result, SkeletonBuilder,
    Timestamp, TreasuryRedeemer, TxSkeleton, UnspentOutput, ValidityWindow, VendorDatum,
};
use strongbox_metadata::TxMetadata;

/// One scheduled payment of a funding request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub maturation: Timestamp,
    pub value: AssetBundle,
}

impl ScheduleEntry {
    pub fn new(maturation: Timestamp, value: AssetBundle) -> Self {
        Self { maturation, value }
    }
}

/// Parameters for funding a vendor
#[derive(Debug, Clone)]
pub struct FundParams {
    pub now: Timestamp,
    pub input: UnspentOutput,
    /// The vendor's own authorization policy
    pub vendor: MultisigScript,
    pub schedule: Vec<ScheduleEntry>,
    pub metadata: Option<TxMetadata>,
}

/// Move part of a treasury output to the vendor script as Active payouts
pub fn fund(
    context: &TreasuryContext,
    params: FundParams,
    selector: &mut dyn BranchSelector,
) -> Result<TxSkeleton> {
    build(context, params, selector).during(Operation::Fund)
}

fn build(
    context: &TreasuryContext,
    params: FundParams,
    selector: &mut dyn BranchSelector,
) -> Result<TxSkeleton> {
    let address = context.address();
    ensure_inputs_at(std::slice::from_ref(&params.input), &address)?;
    params.vendor.validate()?;
    if params.schedule.is_empty() {
        return Err(InvariantViolation::EmptySchedule.into());
    }

    let upperbound = context.config.payout_upperbound;
    for (index, entry) in params.schedule.iter().enumerate() {
        if !entry.value.is_valid_output() {
            return Err(InvariantViolation::InvalidPayoutValue {
                index,
                value: entry.value.clone(),
            }
            .into());
        }
        if entry.maturation > upperbound {
            return Err(InvariantViolation::MaturationBeyondUpperbound {
                maturation: entry.maturation,
                payout_upperbound: upperbound,
            }
            .into());
        }
    }

    let payouts: Vec<Payout> = params
        .schedule
        .into_iter()
        .map(|entry| Payout::new(entry.maturation, entry.value))
        .collect();
    let datum = VendorDatum::new(params.vendor, payouts);
    let total = datum.total_value();
    let remainder = params.input.value.remainder(&total)?;

    let resolution = resolve_signers("fund", &context.config.permissions.fund, selector)?;
    let window = ValidityWindow::before_deadline(params.now, context.config.expiration)?;
    let window = resolution.constrain(window)?;

    log::debug!(
        "funding {} payouts worth {}, remainder {}",
        datum.payouts.len(),
        total,
        remainder
    );

    let skeleton = SkeletonBuilder::new(Operation::Fund)
        .spend(
            params.input,
            TreasuryRedeemer::Fund {
                amount: total.clone(),
            }
            .into(),
        )
        .reference(context.deployment.treasury_references())
        .pay(
            context.deployment.vendor_address(),
            total,
            OutputDatum::Vendor(datum),
        )
        .pay_if_any(address, remainder, OutputDatum::Void)
        .validity(window)
        .authorize(&resolution)
        .metadata(params.metadata)
        .finish()?;
    Ok(skeleton)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;
    use strongbox_core::{
        ConfigurationError, FirstBranches, PayoutStatus, PresetSelection, Redeemer,
    };

    fn params(context: &TreasuryContext, amount: i128, schedule: Vec<ScheduleEntry>) -> FundParams {
        FundParams {
            now: NOW,
            input: treasury_utxo(context, 0, amount),
            vendor: MultisigScript::signature(key(9)),
            schedule,
            metadata: None,
        }
    }

    #[test]
    fn test_fund_with_remainder() {
        let context = context();
        let schedule = vec![
            ScheduleEntry::new(NOW + DAY, AssetBundle::from_base(100)),
            ScheduleEntry::new(NOW + 2 * DAY, AssetBundle::from_base(150)),
        ];
        let skeleton =
            fund(&context, params(&context, 1_000, schedule), &mut FirstBranches).unwrap();

        assert_eq!(skeleton.outputs.len(), 2);
        let vendor_output = &skeleton.outputs[0];
        assert_eq!(vendor_output.address, context.deployment.vendor_address());
        assert_eq!(vendor_output.value, AssetBundle::from_base(250));
        match &vendor_output.datum {
            OutputDatum::Vendor(datum) => {
                assert_eq!(datum.payouts.len(), 2);
                assert!(datum.payouts.iter().all(|p| p.status == PayoutStatus::Active));
                assert_eq!(datum.payouts[1].maturation, NOW + 2 * DAY);
            }
            other => panic!("unexpected datum {:?}", other),
        }
        assert_eq!(skeleton.outputs[1].value, AssetBundle::from_base(750));
        assert_eq!(skeleton.outputs[1].datum, OutputDatum::Void);
        assert_eq!(
            skeleton.inputs[0].redeemer,
            Redeemer::from(TreasuryRedeemer::Fund {
                amount: AssetBundle::from_base(250)
            })
        );
    }

    #[test]
    fn test_fund_signers_follow_selection() {
        let context = context();
        let schedule = vec![ScheduleEntry::new(NOW + DAY, AssetBundle::from_base(10))];
        let mut selector = PresetSelection::new().choose("fund", &[], &[0, 2]);
        let skeleton = fund(&context, params(&context, 10, schedule), &mut selector).unwrap();

        assert_eq!(
            skeleton.required_signers.iter().copied().collect::<Vec<_>>(),
            vec![key(1), key(3)]
        );
    }

    #[test]
    fn test_window_ends_before_expiration() {
        let context = context();
        let mut p = params(
            &context,
            10,
            vec![ScheduleEntry::new(NOW + DAY, AssetBundle::from_base(10))],
        );
        p.now = context.config.expiration - 10_000;
        let skeleton = fund(&context, p, &mut FirstBranches).unwrap();

        assert_eq!(
            skeleton.validity.valid_until,
            Some(context.config.expiration - strongbox_core::constants::TIME_EPSILON)
        );
    }

    #[test]
    fn test_overdrawn_input() {
        let context = context();
        let schedule = vec![ScheduleEntry::new(NOW + DAY, AssetBundle::from_base(501))];
        let err = fund(&context, params(&context, 500, schedule), &mut FirstBranches).unwrap_err();
        assert!(matches!(
            err.invariant(),
            Some(InvariantViolation::NegativeRemainder { .. })
        ));
    }

    #[test]
    fn test_maturation_beyond_upperbound() {
        let context = context();
        let late = context.config.payout_upperbound + 1;
        let schedule = vec![ScheduleEntry::new(late, AssetBundle::from_base(1))];
        let err = fund(&context, params(&context, 500, schedule), &mut FirstBranches).unwrap_err();
        assert!(matches!(
            err.invariant(),
            Some(InvariantViolation::MaturationBeyondUpperbound { .. })
        ));
    }

    #[test]
    fn test_schedule_checks() {
        let context = context();
        let err = fund(&context, params(&context, 500, vec![]), &mut FirstBranches).unwrap_err();
        assert_eq!(err.invariant(), Some(&InvariantViolation::EmptySchedule));

        let schedule = vec![ScheduleEntry::new(NOW + DAY, AssetBundle::new())];
        let err = fund(&context, params(&context, 500, schedule), &mut FirstBranches).unwrap_err();
        assert!(matches!(
            err.invariant(),
            Some(InvariantViolation::InvalidPayoutValue { index: 0, .. })
        ));
    }

    #[test]
    fn test_too_few_branches_selected() {
        let context = context();
        let schedule = vec![ScheduleEntry::new(NOW + DAY, AssetBundle::from_base(10))];
        let mut selector = PresetSelection::new().choose("fund", &[], &[1]);
        let err = fund(&context, params(&context, 10, schedule), &mut selector).unwrap_err();
        assert!(matches!(
            err.configuration(),
            Some(ConfigurationError::InsufficientSelection { .. })
        ));
    }
}
