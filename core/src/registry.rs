//! Registry resolution
//!
//! A uniquely minted registry token sits on an output whose datum names
//! the treasury and vendor script hashes. Every protocol references that
//! output so the validator can check that "the treasury" and "the vendor"
//! are the registered scripts, not a look-alike with another configuration.
//! Nothing here is cached; each call re-queries the ledger.

use crate::constants::REGISTRY_TOKEN_NAME;
use crate::datum;
use crate::error::{ResolutionError, Result};
use crate::ledger::Ledger;
use crate::utxo::{
    Address, AssetName, Credential, OutputReference, PolicyId, ScriptHash, UnspentOutput,
};
use crate::value::AssetClass;
use serde::{Deserialize, Serialize};

/// Script hashes recorded in the registry datum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptRegistry {
    pub treasury: ScriptHash,
    pub vendor: ScriptHash,
}

impl ScriptRegistry {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        datum::to_cbor(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        datum::from_cbor(bytes)
    }
}

/// The registry output and the hashes read from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRegistry {
    pub utxo: UnspentOutput,
    pub scripts: ScriptRegistry,
}

/// Asset class of the registry token for `policy`
pub fn registry_asset(policy: PolicyId) -> AssetClass {
    AssetClass::token(policy, AssetName::new(REGISTRY_TOKEN_NAME))
}

/// Locate the registry output for `registry_token` and read its datum
pub async fn resolve_registry<L: Ledger + ?Sized>(
    ledger: &L,
    registry_token: PolicyId,
) -> Result<ResolvedRegistry> {
    let asset = registry_asset(registry_token);
    let utxo = ledger
        .unspent_output_by_asset(&asset)
        .await?
        .ok_or(ResolutionError::RegistryNotFound {
            policy: registry_token,
        })?;

    let bytes = utxo
        .datum
        .as_ref()
        .ok_or_else(|| ResolutionError::RegistryDatum {
            reference: utxo.reference,
            reason: "missing datum".to_string(),
        })?;
    let scripts = ScriptRegistry::from_bytes(bytes).map_err(|e| ResolutionError::RegistryDatum {
        reference: utxo.reference,
        reason: e.to_string(),
    })?;

    log::debug!(
        "registry {} at {}: treasury {}, vendor {}",
        registry_token,
        utxo.reference,
        scripts.treasury,
        scripts.vendor
    );
    Ok(ResolvedRegistry { utxo, scripts })
}

/// Registry plus the reference-script outputs of both scripts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptDeployment {
    pub registry: ResolvedRegistry,
    pub treasury_script: UnspentOutput,
    pub vendor_script: UnspentOutput,
}

impl ScriptDeployment {
    /// Resolve the registry and both reference scripts
    pub async fn resolve<L: Ledger + ?Sized>(ledger: &L, registry_token: PolicyId) -> Result<Self> {
        let registry = resolve_registry(ledger, registry_token).await?;
        let treasury_script = resolve_script(ledger, registry.scripts.treasury).await?;
        let vendor_script = resolve_script(ledger, registry.scripts.vendor).await?;

        Ok(Self {
            registry,
            treasury_script,
            vendor_script,
        })
    }

    pub fn treasury_hash(&self) -> ScriptHash {
        self.registry.scripts.treasury
    }

    pub fn vendor_hash(&self) -> ScriptHash {
        self.registry.scripts.vendor
    }

    pub fn treasury_address(&self) -> Address {
        Address::script(self.treasury_hash())
    }

    pub fn vendor_address(&self) -> Address {
        Address::script(self.vendor_hash())
    }

    /// Reward account of the treasury script
    pub fn treasury_reward_account(&self) -> Credential {
        Credential::Script(self.treasury_hash())
    }

    /// Reference inputs for a transaction spending treasury outputs
    pub fn treasury_references(&self) -> Vec<OutputReference> {
        vec![self.registry.utxo.reference, self.treasury_script.reference]
    }

    /// Reference inputs for a transaction spending vendor outputs
    pub fn vendor_references(&self) -> Vec<OutputReference> {
        vec![self.registry.utxo.reference, self.vendor_script.reference]
    }
}

async fn resolve_script<L: Ledger + ?Sized>(
    ledger: &L,
    script: ScriptHash,
) -> Result<UnspentOutput> {
    ledger
        .resolve_script_reference(&script)
        .await?
        .ok_or_else(|| ResolutionError::ScriptReferenceNotFound { script }.into())
}
