//! Pay treasury funds straight to an external recipient

use crate::TreasuryContext;
use strongbox_core::{
    ensure_inputs_at, resolve_signers, Address, AssetBundle, BranchSelector, Operation,
    OperationContext, OutputDatum, Result, SkeletonBuilder, Timestamp, TreasuryRedeemer,
    TxSkeleton, UnspentOutput, ValidityWindow,
};
use strongbox_metadata::TxMetadata;

/// Parameters for a disbursement
#[derive(Debug, Clone)]
pub struct DisburseParams {
    pub now: Timestamp,
    pub input: UnspentOutput,
    pub recipient: Address,
    pub amount: AssetBundle,
    /// Datum attached to the recipient's output
    pub datum: OutputDatum,
    /// Terminal clean-up after expiration instead of a normal disbursement
    pub after: bool,
    pub metadata: Option<TxMetadata>,
}

pub fn disburse(
    context: &TreasuryContext,
    params: DisburseParams,
    selector: &mut dyn BranchSelector,
) -> Result<TxSkeleton> {
    build(context, params, selector).during(Operation::Disburse)
}

fn build(
    context: &TreasuryContext,
    params: DisburseParams,
    selector: &mut dyn BranchSelector,
) -> Result<TxSkeleton> {
    let address = context.address();
    ensure_inputs_at(std::slice::from_ref(&params.input), &address)?;
    let remainder = params.input.value.remainder(&params.amount)?;

    let expiration = context.config.expiration;
    let window = if params.after {
        ValidityWindow::after_expiration(params.now, expiration)?
    } else {
        ValidityWindow::before_deadline(params.now, expiration)?
    };
    let resolution = resolve_signers("disburse", &context.config.permissions.disburse, selector)?;
    let window = resolution.constrain(window)?;

    log::debug!(
        "disbursing {} to {}{}",
        params.amount,
        params.recipient,
        if params.after { " after expiration" } else { "" }
    );

    let skeleton = SkeletonBuilder::new(Operation::Disburse)
        .spend(
            params.input,
            TreasuryRedeemer::Disburse {
                amount: params.amount.clone(),
            }
            .into(),
        )
        .reference(context.deployment.treasury_references())
        .pay(params.recipient, params.amount, params.datum)
        .pay_if_any(address, remainder, OutputDatum::Void)
        .validity(window)
        .authorize(&resolution)
        .metadata(params.metadata)
        .finish()?;
    Ok(skeleton)
}
