//! Resolved treasury instance

use strongbox_core::{
    Address, Ledger, Result, ScriptDeployment, TreasuryConfiguration, UnspentOutput,
};

/// A treasury configuration together with its on-chain deployment
#[derive(Debug, Clone)]
pub struct TreasuryContext {
    pub config: TreasuryConfiguration,
    pub deployment: ScriptDeployment,
}

impl TreasuryContext {
    pub fn new(config: TreasuryConfiguration, deployment: ScriptDeployment) -> Self {
        Self { config, deployment }
    }

    /// Validate `config` and resolve its registry and reference scripts
    pub async fn load<L: Ledger + ?Sized>(
        ledger: &L,
        config: TreasuryConfiguration,
    ) -> Result<Self> {
        config.validate()?;
        let deployment = ScriptDeployment::resolve(ledger, config.registry_token).await?;
        log::debug!(
            "loaded treasury {} (expires {})",
            deployment.treasury_hash(),
            config.expiration
        );
        Ok(Self::new(config, deployment))
    }

    pub fn address(&self) -> Address {
        self.deployment.treasury_address()
    }

    /// Every output currently locked at the treasury address
    pub async fn unspent_outputs<L: Ledger + ?Sized>(
        &self,
        ledger: &L,
    ) -> Result<Vec<UnspentOutput>> {
        ledger.unspent_outputs(&self.address()).await
    }
}
