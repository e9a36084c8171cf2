//! Payout lifecycle
//!
//! A vendor output carries a [`VendorDatum`]: the vendor's own permission
//! and the list of scheduled payouts. Each payout is either Active or
//! Paused; an Active payout whose maturation has passed is claimable.
//!
//! ```text
//! fund ──► [Active] ◄──resume── [Paused]
//!             │    ──pause──►      │
//!             │ matured            │
//!             ▼                    │
//!        withdraw (removed)   sweep (returned to treasury)
//! ```

use crate::datum;
use crate::error::{Error, InvariantViolation, Result};
use crate::multisig::MultisigScript;
use crate::utxo::{OutputReference, Timestamp};
use crate::value::AssetBundle;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a scheduled payout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Active,
    Paused,
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayoutStatus::Active => f.write_str("active"),
            PayoutStatus::Paused => f.write_str("paused"),
        }
    }
}

/// A single scheduled payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub maturation: Timestamp,
    pub value: AssetBundle,
    pub status: PayoutStatus,
}

impl Payout {
    /// New Active payout
    pub fn new(maturation: Timestamp, value: AssetBundle) -> Self {
        Self {
            maturation,
            value,
            status: PayoutStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == PayoutStatus::Active
    }

    /// Active and matured strictly before `now`
    pub fn is_claimable(&self, now: Timestamp) -> bool {
        self.is_active() && self.maturation < now
    }
}

/// Datum attached to every vendor output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorDatum {
    /// The recipient's own authorization policy
    pub vendor: MultisigScript,
    pub payouts: Vec<Payout>,
}

impl VendorDatum {
    pub fn new(vendor: MultisigScript, payouts: Vec<Payout>) -> Self {
        Self { vendor, payouts }
    }

    /// Sum of every payout's owed value
    pub fn total_value(&self) -> AssetBundle {
        self.payouts.iter().map(|payout| &payout.value).sum()
    }

    /// Check the vendor permission and that every payout owes something
    pub fn validate(&self) -> Result<()> {
        self.vendor.validate()?;
        for (index, payout) in self.payouts.iter().enumerate() {
            if !payout.value.is_valid_output() {
                return Err(InvariantViolation::InvalidPayoutValue {
                    index,
                    value: payout.value.clone(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Split into (claimable, retained), preserving order
    pub fn partition_claimable(&self, now: Timestamp) -> (Vec<Payout>, Vec<Payout>) {
        self.payouts
            .iter()
            .cloned()
            .partition(|payout| payout.is_claimable(now))
    }

    /// Split into (retained, returned) for a sweep: matured Active payouts
    /// stay with the vendor, everything else goes back to the treasury
    pub fn partition_for_sweep(&self, now: Timestamp) -> (Vec<Payout>, Vec<Payout>) {
        self.partition_claimable(now)
    }

    /// Same vendor, different payouts
    pub fn with_payouts(&self, payouts: Vec<Payout>) -> VendorDatum {
        VendorDatum {
            vendor: self.vendor.clone(),
            payouts,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        datum::to_cbor(self)
    }

    /// Parse and validate; failure marks the output as malformed
    pub fn from_bytes(bytes: &[u8]) -> Result<VendorDatum> {
        let datum: VendorDatum = datum::from_cbor(bytes)?;
        datum.validate()?;
        Ok(datum)
    }

    /// Parse the datum of a vendor output, reporting where it failed
    pub fn from_output(
        reference: OutputReference,
        bytes: Option<&Vec<u8>>,
    ) -> std::result::Result<VendorDatum, InvariantViolation> {
        let bytes = bytes.ok_or_else(|| InvariantViolation::MalformedDatum {
            reference,
            reason: "missing datum".to_string(),
        })?;
        VendorDatum::from_bytes(bytes).map_err(|e| InvariantViolation::MalformedDatum {
            reference,
            reason: describe(&e),
        })
    }
}

fn describe(error: &Error) -> String {
    match error.root() {
        Error::Codec(reason) => reason.clone(),
        other => other.to_string(),
    }
}
