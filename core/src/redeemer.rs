//! Redeemers attached to consumed script inputs

use crate::payout::PayoutStatus;
use crate::value::AssetBundle;
use serde::{Deserialize, Serialize};

/// Redeemers accepted by the treasury script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TreasuryRedeemer {
    Reorganize,
    Fund { amount: AssetBundle },
    Disburse { amount: AssetBundle },
    SweepTreasury,
}

/// Redeemers accepted by the vendor script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum VendorRedeemer {
    Adjudicate { statuses: Vec<PayoutStatus> },
    Modify,
    Withdraw,
    SweepVendor,
    Malformed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Redeemer {
    Treasury(TreasuryRedeemer),
    Vendor(VendorRedeemer),
}

impl From<TreasuryRedeemer> for Redeemer {
    fn from(redeemer: TreasuryRedeemer) -> Self {
        Redeemer::Treasury(redeemer)
    }
}

impl From<VendorRedeemer> for Redeemer {
    fn from(redeemer: VendorRedeemer) -> Self {
        Redeemer::Vendor(redeemer)
    }
}
