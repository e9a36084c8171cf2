//! Donate an expired treasury's funds to the protocol-level treasury

use crate::TreasuryContext;
use strongbox_core::{
    ensure_inputs_at, AssetBundle, InvariantViolation, Operation, OperationContext, OutputDatum,
    Result, SkeletonBuilder, Timestamp, TreasuryRedeemer, TxSkeleton, UnspentOutput,
    ValidityWindow,
};

/// Parameters for a treasury sweep
#[derive(Debug, Clone)]
pub struct SweepParams {
    pub now: Timestamp,
    pub input: UnspentOutput,
    /// Base-asset amount to donate; the whole base amount when absent
    pub amount: Option<u64>,
}

/// Anyone may sweep once the treasury has expired; whatever is not donated
/// is relocked at the treasury with the input's datum unchanged.
pub fn sweep(context: &TreasuryContext, params: SweepParams) -> Result<TxSkeleton> {
    build(context, params).during(Operation::SweepTreasury)
}

fn build(context: &TreasuryContext, params: SweepParams) -> Result<TxSkeleton> {
    let address = context.address();
    ensure_inputs_at(std::slice::from_ref(&params.input), &address)?;
    let window = ValidityWindow::after_expiration(params.now, context.config.expiration)?;

    let available = params.input.value.base_amount();
    let donation = match params.amount {
        Some(amount) if i128::from(amount) > available => {
            return Err(InvariantViolation::DonationExceedsBase {
                requested: i128::from(amount),
                available,
            }
            .into());
        }
        Some(amount) => amount,
        None => u64::try_from(available).unwrap_or(0),
    };

    let remainder = params
        .input
        .value
        .remainder(&AssetBundle::from_base(i128::from(donation)))?;
    let relocked = OutputDatum::verbatim(params.input.datum.as_ref());
    log::debug!("sweeping {} to the protocol treasury, relocking {}", donation, remainder);

    let mut builder = SkeletonBuilder::new(Operation::SweepTreasury)
        .spend(params.input, TreasuryRedeemer::SweepTreasury.into())
        .reference(context.deployment.treasury_references())
        .pay_if_any(address, remainder, relocked)
        .validity(window);
    if donation > 0 {
        builder = builder.donate(donation);
    }
    Ok(builder.finish()?)
}
