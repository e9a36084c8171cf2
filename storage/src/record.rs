//! Stored instance records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strongbox_core::{TreasuryConfiguration, VendorConfiguration};

/// A published treasury instance and its paired vendor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub id: String,
    pub label: String,
    pub treasury: TreasuryConfiguration,
    pub vendor: VendorConfiguration,
    pub created_at: DateTime<Utc>,
}

impl InstanceRecord {
    /// Validate the pair and derive the instance id from the treasury
    pub fn new(
        label: impl Into<String>,
        treasury: TreasuryConfiguration,
        vendor: VendorConfiguration,
    ) -> strongbox_core::Result<Self> {
        treasury.validate()?;
        vendor.validate_against(&treasury)?;
        Ok(Self {
            id: treasury.instance_id()?,
            label: label.into(),
            treasury,
            vendor,
            created_at: Utc::now(),
        })
    }
}
