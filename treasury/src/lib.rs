//! Strongbox Treasury Protocols
//!
//! Builds the transactions that spend outputs locked at the treasury script:
//! - reorganize: split or merge treasury outputs
//! - fund: lock a payout schedule at the vendor script
//! - disburse: pay an external recipient directly
//! - sweep: donate an expired treasury to the protocol-level treasury
//! - withdraw: move staking rewards back into treasury outputs
//!
//! Every builder returns a verified [`TxSkeleton`](strongbox_core::TxSkeleton)
//! or an error naming the operation that failed.

pub mod context;
pub mod disburse;
pub mod fund;
pub mod reorganize;
pub mod sweep;
pub mod withdraw;

pub use context::TreasuryContext;
pub use disburse::{disburse, DisburseParams};
pub use fund::{fund, FundParams, ScheduleEntry};
pub use reorganize::{reorganize, ReorganizeParams};
pub use sweep::{sweep, SweepParams};
pub use withdraw::{withdraw, withdraw_balance, WithdrawParams};

#[cfg(test)]
pub(crate) mod testing {
    use crate::TreasuryContext;
    use strongbox_core::{
        datum, registry_asset, Address, AssetBundle, AssetClass, AssetName, KeyHash,
        MultisigScript, OutputReference, PolicyId, ResolvedRegistry, ScriptDeployment, ScriptHash,
        ScriptRegistry, Timestamp, TreasuryConfiguration, TreasuryPermissions, TxHash,
        UnspentOutput,
    };

    pub const NOW: Timestamp = 1_700_000_000_000;
    pub const DAY: Timestamp = 24 * 60 * 60 * 1000;
    pub const POLICY: PolicyId = PolicyId([7; 28]);

    pub fn key(n: u8) -> KeyHash {
        KeyHash([n; 28])
    }

    fn sig(n: u8) -> MultisigScript {
        MultisigScript::signature(key(n))
    }

    pub fn token_class() -> AssetClass {
        AssetClass::token(PolicyId([8; 28]), AssetName::new(b"USDM".to_vec()))
    }

    pub fn context() -> TreasuryContext {
        let scripts = ScriptRegistry {
            treasury: ScriptHash([1; 28]),
            vendor: ScriptHash([2; 28]),
        };
        let holder = Address::key(key(99));
        let registry = UnspentOutput::new(
            OutputReference::new(TxHash([10; 32]), 0),
            holder.clone(),
            AssetBundle::from_base(2_000_000).with(registry_asset(POLICY), 1),
        );
        let deployment = ScriptDeployment {
            registry: ResolvedRegistry {
                utxo: registry,
                scripts,
            },
            treasury_script: UnspentOutput::new(
                OutputReference::new(TxHash([11; 32]), 0),
                holder.clone(),
                AssetBundle::from_base(20_000_000),
            )
            .with_script_ref(scripts.treasury),
            vendor_script: UnspentOutput::new(
                OutputReference::new(TxHash([11; 32]), 1),
                holder,
                AssetBundle::from_base(20_000_000),
            )
            .with_script_ref(scripts.vendor),
        };

        let config = TreasuryConfiguration {
            registry_token: POLICY,
            permissions: TreasuryPermissions {
                reorganize: sig(1),
                sweep: sig(1),
                fund: MultisigScript::at_least(2, vec![sig(1), sig(2), sig(3)]),
                disburse: MultisigScript::any_of(vec![
                    sig(2),
                    MultisigScript::all_of(vec![sig(3), sig(4)]),
                ]),
            },
            expiration: NOW + 30 * DAY,
            payout_upperbound: NOW + 60 * DAY,
        };
        TreasuryContext::new(config, deployment)
    }

    pub fn treasury_utxo(context: &TreasuryContext, index: u32, amount: i128) -> UnspentOutput {
        UnspentOutput::new(
            OutputReference::new(TxHash([20; 32]), index),
            context.address(),
            AssetBundle::from_base(amount),
        )
        .with_datum(datum::void())
    }

    pub fn vendor_utxo(
        context: &TreasuryContext,
        index: u32,
        amount: i128,
        datum: Option<Vec<u8>>,
    ) -> UnspentOutput {
        let mut utxo = UnspentOutput::new(
            OutputReference::new(TxHash([21; 32]), index),
            context.deployment.vendor_address(),
            AssetBundle::from_base(amount),
        );
        utxo.datum = datum;
        utxo
    }
}
