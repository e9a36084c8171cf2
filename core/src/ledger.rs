//! Ledger collaborator
//!
//! Read-only view of the chain the protocols depend on. Submission is left
//! to the caller.

use crate::error::{Error, ResolutionError, Result};
use crate::transaction::TxSkeleton;
use crate::utxo::{
    Address, Credential, OutputReference, ScriptHash, Timestamp, TxHash, UnspentOutput,
};
use crate::value::AssetClass;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::RwLock;

/// Queries the protocols need from the ledger
#[async_trait::async_trait]
pub trait Ledger: Send + Sync {
    /// Every unspent output at `address`
    async fn unspent_outputs(&self, address: &Address) -> Result<Vec<UnspentOutput>>;

    /// The unspent output holding `asset`, if any
    async fn unspent_output_by_asset(&self, asset: &AssetClass) -> Result<Option<UnspentOutput>>;

    /// Resolve references into outputs, failing on the first missing one
    async fn resolve_outputs(&self, references: &[OutputReference]) -> Result<Vec<UnspentOutput>>;

    /// The output carrying `script` as a reference script
    async fn resolve_script_reference(&self, script: &ScriptHash) -> Result<Option<UnspentOutput>>;

    /// Current chain time
    async fn chain_time(&self) -> Result<Timestamp>;

    /// Balance of a reward account, in base-asset units
    async fn reward_balance(&self, account: &Credential) -> Result<u64>;
}

/// Serializable ledger state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub time: Timestamp,
    #[serde(default)]
    pub utxos: Vec<UnspentOutput>,
    /// Reward balances keyed by the credential's display form
    #[serde(default)]
    pub rewards: HashMap<String, u64>,
}

/// In-memory ledger used by tests and by snapshot files
#[derive(Debug, Default)]
pub struct MemoryLedger {
    state: RwLock<LedgerSnapshot>,
}

impl MemoryLedger {
    pub fn new(time: Timestamp) -> Self {
        Self::from_snapshot(LedgerSnapshot {
            time,
            ..Default::default()
        })
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            state: RwLock::new(snapshot),
        }
    }

    /// Load a JSON snapshot file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            Error::Ledger(format!(
                "Failed to read snapshot {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let snapshot: LedgerSnapshot = serde_json::from_str(&data)
            .map_err(|e| Error::Ledger(format!("Failed to parse snapshot: {}", e)))?;

        log::debug!(
            "loaded ledger snapshot with {} outputs at time {}",
            snapshot.utxos.len(),
            snapshot.time
        );
        Ok(Self::from_snapshot(snapshot))
    }

    pub async fn add_output(&self, utxo: UnspentOutput) {
        self.state.write().await.utxos.push(utxo);
    }

    pub async fn set_time(&self, time: Timestamp) {
        self.state.write().await.time = time;
    }

    pub async fn set_reward_balance(&self, account: &Credential, amount: u64) {
        self.state
            .write()
            .await
            .rewards
            .insert(account.to_string(), amount);
    }

    /// Mark outputs as spent
    pub async fn spend(&self, references: &[OutputReference]) {
        self.state
            .write()
            .await
            .utxos
            .retain(|utxo| !references.contains(&utxo.reference));
    }

    /// Apply a skeleton as if it had been submitted as `tx_hash`
    pub async fn apply(
        &self,
        skeleton: &TxSkeleton,
        tx_hash: TxHash,
    ) -> Result<Vec<UnspentOutput>> {
        let produced = skeleton.unspent_outputs(tx_hash)?;
        let spent: Vec<OutputReference> = skeleton
            .inputs
            .iter()
            .map(|input| input.utxo.reference)
            .collect();

        let mut state = self.state.write().await;
        state.utxos.retain(|utxo| !spent.contains(&utxo.reference));
        state.utxos.extend(produced.iter().cloned());
        for withdrawal in &skeleton.withdrawals {
            if let Some(balance) = state.rewards.get_mut(&withdrawal.account.to_string()) {
                *balance = balance.saturating_sub(withdrawal.amount);
            }
        }
        Ok(produced)
    }

    pub async fn snapshot(&self) -> LedgerSnapshot {
        self.state.read().await.clone()
    }
}

#[async_trait::async_trait]
impl Ledger for MemoryLedger {
    async fn unspent_outputs(&self, address: &Address) -> Result<Vec<UnspentOutput>> {
        let state = self.state.read().await;
        Ok(state
            .utxos
            .iter()
            .filter(|utxo| &utxo.address == address)
            .cloned()
            .collect())
    }

    async fn unspent_output_by_asset(&self, asset: &AssetClass) -> Result<Option<UnspentOutput>> {
        let state = self.state.read().await;
        Ok(state
            .utxos
            .iter()
            .find(|utxo| utxo.value.amount_of(asset) > 0)
            .cloned())
    }

    async fn resolve_outputs(&self, references: &[OutputReference]) -> Result<Vec<UnspentOutput>> {
        let state = self.state.read().await;
        references
            .iter()
            .map(|reference| {
                state
                    .utxos
                    .iter()
                    .find(|utxo| &utxo.reference == reference)
                    .cloned()
                    .ok_or_else(|| {
                        ResolutionError::OutputNotFound {
                            reference: *reference,
                        }
                        .into()
                    })
            })
            .collect()
    }

    async fn resolve_script_reference(&self, script: &ScriptHash) -> Result<Option<UnspentOutput>> {
        let state = self.state.read().await;
        Ok(state
            .utxos
            .iter()
            .find(|utxo| utxo.script_ref.as_ref() == Some(script))
            .cloned())
    }

    async fn chain_time(&self) -> Result<Timestamp> {
        Ok(self.state.read().await.time)
    }

    async fn reward_balance(&self, account: &Credential) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state
            .rewards
            .get(&account.to_string())
            .copied()
            .unwrap_or(0))
    }
}
