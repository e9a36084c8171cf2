//! Treasury and vendor configuration
//!
//! A configuration is baked into its script, so it never changes once the
//! instance is published. Changing it means a different script address.

use crate::datum;
use crate::error::{ConfigurationError, Result};
use crate::multisig::MultisigScript;
use crate::utxo::{PolicyId, Timestamp};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};

/// Permissions guarding the treasury actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryPermissions {
    pub reorganize: MultisigScript,
    /// Consumed by the validator only; the sweep builder is open to anyone
    pub sweep: MultisigScript,
    pub fund: MultisigScript,
    pub disburse: MultisigScript,
}

impl TreasuryPermissions {
    fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        self.reorganize.validate()?;
        self.sweep.validate()?;
        self.fund.validate()?;
        self.disburse.validate()
    }
}

/// Configuration of one treasury script instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreasuryConfiguration {
    pub registry_token: PolicyId,
    pub permissions: TreasuryPermissions,
    /// After this time the treasury can only be swept or cleaned up
    pub expiration: Timestamp,
    /// Latest maturation any funded payout may carry
    pub payout_upperbound: Timestamp,
}

impl TreasuryConfiguration {
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        self.permissions.validate()?;
        if self.payout_upperbound < self.expiration {
            return Err(ConfigurationError::PayoutBoundBeforeExpiration {
                expiration: self.expiration,
                payout_upperbound: self.payout_upperbound,
            });
        }
        Ok(())
    }

    /// Hex SHA3-256 digest of the CBOR-encoded configuration
    pub fn instance_id(&self) -> Result<String> {
        let bytes = datum::to_cbor(self)?;
        let mut hasher = Sha3_256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// Permissions guarding vendor adjudication and modification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorPermissions {
    pub pause: MultisigScript,
    pub resume: MultisigScript,
    pub modify: MultisigScript,
}

/// Configuration of the vendor script paired with a treasury
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorConfiguration {
    pub registry_token: PolicyId,
    pub permissions: VendorPermissions,
    /// After this time remaining payouts can be swept
    pub expiration: Timestamp,
}

impl VendorConfiguration {
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        self.permissions.pause.validate()?;
        self.permissions.resume.validate()?;
        self.permissions.modify.validate()
    }

    /// Validate alongside the treasury this vendor script pays out for
    pub fn validate_against(
        &self,
        treasury: &TreasuryConfiguration,
    ) -> std::result::Result<(), ConfigurationError> {
        self.validate()?;
        if self.registry_token != treasury.registry_token {
            return Err(ConfigurationError::RegistryMismatch {
                treasury: treasury.registry_token,
                vendor: self.registry_token,
            });
        }
        if self.expiration < treasury.payout_upperbound {
            return Err(ConfigurationError::VendorExpiresEarly {
                vendor_expiration: self.expiration,
                payout_upperbound: treasury.payout_upperbound,
            });
        }
        Ok(())
    }
}
