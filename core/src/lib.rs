//! Strongbox Core Library
//!
//! Shared types and logic for the script-controlled treasury:
//! - Asset bundle arithmetic
//! - Multisig permission model and signer resolution
//! - Payout lifecycle and vendor datum
//! - Registry resolution against the ledger collaborator
//! - Transaction skeletons handed to the external ledger layer

pub mod config;
pub mod datum;
pub mod error;
pub mod ledger;
pub mod multisig;
pub mod payout;
pub mod redeemer;
pub mod registry;
pub mod transaction;
pub mod utxo;
pub mod value;

// Re-export main types
pub use config::{
    TreasuryConfiguration, TreasuryPermissions, VendorConfiguration, VendorPermissions,
};
pub use error::{
    ConfigurationError, Error, ErrorKind, InvariantViolation, OperationContext, ResolutionError,
    Result,
};
pub use ledger::{Ledger, LedgerSnapshot, MemoryLedger};
pub use multisig::{
    resolve_signers, BranchSelector, FirstBranches, KeyringSelector, MultisigScript,
    PresetSelection, Resolution, SelectionRequest,
};
pub use payout::{Payout, PayoutStatus, VendorDatum};
pub use redeemer::{Redeemer, TreasuryRedeemer, VendorRedeemer};
pub use registry::{
    registry_asset, resolve_registry, ResolvedRegistry, ScriptDeployment, ScriptRegistry,
};
pub use transaction::{
    ensure_inputs_at, Operation, OutputDatum, ScriptInput, SkeletonBuilder, TxOutput, TxSkeleton,
    ValidityWindow, Withdrawal,
};
pub use utxo::{
    Address, AssetName, Credential, KeyHash, OutputReference, PolicyId, ScriptHash, Timestamp,
    TxHash, UnspentOutput,
};
pub use value::{AssetBundle, AssetClass};

/// Protocol constants
pub mod constants {
    use crate::utxo::Timestamp;

    /// One hour in milliseconds, the default validity span
    pub const ONE_HOUR: Timestamp = 60 * 60 * 1000;

    /// Validity span for adjudication and modification (36 hours)
    pub const ADJUDICATION_WINDOW: Timestamp = 36 * ONE_HOUR;

    /// Margin used to keep a bound strictly before or after a deadline.
    /// One second, so the bound survives slot rounding.
    pub const TIME_EPSILON: Timestamp = 1_000;

    /// Asset name of the registry token
    pub const REGISTRY_TOKEN_NAME: &[u8] = b"REGISTRY";

    /// Unit string used for the base asset
    pub const BASE_UNIT: &str = "lovelace";
}
