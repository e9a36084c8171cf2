//! Split or merge treasury outputs without moving value elsewhere

use crate::TreasuryContext;
use strongbox_core::{
    ensure_inputs_at, resolve_signers, AssetBundle, BranchSelector, InvariantViolation, Operation,
    OperationContext, OutputDatum, Result, SkeletonBuilder, Timestamp, TreasuryRedeemer,
    TxSkeleton, UnspentOutput, ValidityWindow,
};
use strongbox_metadata::TxMetadata;

/// Parameters for a reorganization
#[derive(Debug, Clone)]
pub struct ReorganizeParams {
    pub now: Timestamp,
    pub inputs: Vec<UnspentOutput>,
    /// Bundles of the new treasury outputs, in order
    pub outputs: Vec<AssetBundle>,
    pub metadata: Option<TxMetadata>,
}

/// Consume treasury outputs and relock exactly the same total as `outputs`
pub fn reorganize(
    context: &TreasuryContext,
    params: ReorganizeParams,
    selector: &mut dyn BranchSelector,
) -> Result<TxSkeleton> {
    build(context, params, selector).during(Operation::Reorganize)
}

fn build(
    context: &TreasuryContext,
    params: ReorganizeParams,
    selector: &mut dyn BranchSelector,
) -> Result<TxSkeleton> {
    let address = context.address();
    ensure_inputs_at(&params.inputs, &address)?;
    if params.outputs.is_empty() {
        return Err(InvariantViolation::NoOutputs.into());
    }

    let consumed: AssetBundle = params.inputs.iter().map(|utxo| &utxo.value).sum();
    let produced: AssetBundle = params.outputs.iter().sum();
    if consumed != produced {
        return Err(InvariantViolation::ValueNotConserved { consumed, produced }.into());
    }

    let resolution = resolve_signers(
        "reorganize",
        &context.config.permissions.reorganize,
        selector,
    )?;
    let window = ValidityWindow::before_deadline(params.now, context.config.expiration)?;
    let window = resolution.constrain(window)?;

    let mut builder = SkeletonBuilder::new(Operation::Reorganize)
        .reference(context.deployment.treasury_references())
        .validity(window)
        .authorize(&resolution)
        .metadata(params.metadata);
    for utxo in params.inputs {
        builder = builder.spend(utxo, TreasuryRedeemer::Reorganize.into());
    }
    for value in params.outputs {
        builder = builder.pay(address.clone(), value, OutputDatum::Void);
    }
    Ok(builder.finish()?)
}
