//! Withdraw staking rewards back into the treasury

use crate::TreasuryContext;
use strongbox_core::{
    AssetBundle, InvariantViolation, KeyHash, Ledger, Operation, OperationContext, OutputDatum,
    Result, SkeletonBuilder, TxSkeleton,
};
use strongbox_metadata::TxMetadata;

/// Parameters for a reward withdrawal
#[derive(Debug, Clone)]
pub struct WithdrawParams {
    /// Key of whoever builds and signs the transaction
    pub author: KeyHash,
    /// How to split the rewards across new treasury outputs; one output
    /// holding everything when empty
    pub amounts: Vec<u64>,
    pub metadata: TxMetadata,
}

/// Query the reward balance of the treasury script and relock all of it
pub async fn withdraw<L: Ledger + ?Sized>(
    context: &TreasuryContext,
    ledger: &L,
    params: WithdrawParams,
) -> Result<TxSkeleton> {
    let account = context.deployment.treasury_reward_account();
    let balance = ledger
        .reward_balance(&account)
        .await
        .during(Operation::WithdrawRewards)?;
    withdraw_balance(context, balance, params)
}

/// Build the withdrawal for a known reward balance
pub fn withdraw_balance(
    context: &TreasuryContext,
    balance: u64,
    params: WithdrawParams,
) -> Result<TxSkeleton> {
    build(context, balance, params).during(Operation::WithdrawRewards)
}

fn build(context: &TreasuryContext, balance: u64, params: WithdrawParams) -> Result<TxSkeleton> {
    if balance == 0 {
        return Err(InvariantViolation::NothingToWithdraw.into());
    }

    let amounts = if params.amounts.is_empty() {
        vec![balance]
    } else {
        params.amounts
    };
    let requested = amounts
        .iter()
        .fold(0u64, |total, amount| total.saturating_add(*amount));
    if requested != balance {
        return Err(InvariantViolation::WithdrawalMismatch {
            available: balance,
            requested,
        }
        .into());
    }

    let address = context.address();
    let mut builder = SkeletonBuilder::new(Operation::WithdrawRewards)
        .reference(context.deployment.treasury_references())
        .withdraw(context.deployment.treasury_reward_account(), balance)
        .signer(params.author)
        .metadata(Some(params.metadata));
    for amount in amounts {
        builder = builder.pay(
            address.clone(),
            AssetBundle::from_base(i128::from(amount)),
            OutputDatum::Void,
        );
    }
    Ok(builder.finish()?)
}
