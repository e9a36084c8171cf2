//! Error types
//!
//! Three families of fatal errors surface from the core:
//! - configuration errors (malformed or unsatisfiable permissions)
//! - resolution errors (registry output or reference script missing)
//! - invariant violations (the requested transaction would be rejected)
//!
//! None of them are retried internally.

use crate::transaction::Operation;
use crate::utxo::{Address, OutputReference, PolicyId, ScriptHash, Timestamp};
use crate::value::AssetBundle;
use thiserror::Error;

/// Malformed or unsatisfiable permission configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Empty {kind} script list at {path}")]
    EmptyScriptList { kind: &'static str, path: String },

    #[error("Threshold {required} exceeds {available} scripts at {path}")]
    ThresholdTooHigh {
        required: u32,
        available: usize,
        path: String,
    },

    #[error("Insufficient branches selected for {permission} at {path}: required {required}, selected {selected}")]
    InsufficientSelection {
        permission: String,
        path: String,
        required: usize,
        selected: usize,
    },

    #[error("Branch {index} out of range for {permission} at {path} ({available} branches)")]
    BranchOutOfRange {
        permission: String,
        path: String,
        index: usize,
        available: usize,
    },

    #[error("Branch {index} selected twice for {permission} at {path}")]
    DuplicateBranch {
        permission: String,
        path: String,
        index: usize,
    },

    #[error("No branch selection available for {permission} at {path}")]
    SelectionUnavailable { permission: String, path: String },

    #[error("Payout upper bound {payout_upperbound} precedes expiration {expiration}")]
    PayoutBoundBeforeExpiration {
        expiration: Timestamp,
        payout_upperbound: Timestamp,
    },

    #[error("Vendor expiration {vendor_expiration} precedes treasury payout upper bound {payout_upperbound}")]
    VendorExpiresEarly {
        vendor_expiration: Timestamp,
        payout_upperbound: Timestamp,
    },

    #[error("Registry token mismatch: treasury uses {treasury}, vendor uses {vendor}")]
    RegistryMismatch { treasury: PolicyId, vendor: PolicyId },
}

/// On-chain state the operation depends on could not be found
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    #[error("Registry output not found for policy {policy}")]
    RegistryNotFound { policy: PolicyId },

    #[error("Registry datum at {reference} is unusable: {reason}")]
    RegistryDatum {
        reference: OutputReference,
        reason: String,
    },

    #[error("Reference script not found for {script}")]
    ScriptReferenceNotFound { script: ScriptHash },

    #[error("Output not found: {reference}")]
    OutputNotFound { reference: OutputReference },
}

/// The requested transaction would break an invariant the validator enforces
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    #[error("Negative remainder: {available} cannot cover {consumed}")]
    NegativeRemainder {
        available: AssetBundle,
        consumed: AssetBundle,
    },

    #[error("Value not conserved: consumed {consumed}, produced {produced}")]
    ValueNotConserved {
        consumed: AssetBundle,
        produced: AssetBundle,
    },

    #[error("Invalid output value {value} at output {index}")]
    InvalidOutputValue { index: usize, value: AssetBundle },

    #[error("Invalid payout value {value} at payout {index}")]
    InvalidPayoutValue { index: usize, value: AssetBundle },

    #[error("No inputs supplied")]
    NoInputs,

    #[error("No outputs requested")]
    NoOutputs,

    #[error("Empty payout schedule")]
    EmptySchedule,

    #[error("Input {reference} sits at {actual}, expected {expected}")]
    UnexpectedAddress {
        reference: OutputReference,
        expected: Address,
        actual: Address,
    },

    #[error("Input {reference} spent twice")]
    DuplicateInput { reference: OutputReference },

    #[error("Status count mismatch: datum has {expected} payouts, got {actual} statuses")]
    StatusCountMismatch { expected: usize, actual: usize },

    #[error("Cannot pause payout {index}: matures at {maturation}, before window end {window_end}")]
    PausingMaturedPayout {
        index: usize,
        maturation: Timestamp,
        window_end: Timestamp,
    },

    #[error("Adjudication changes no payout status")]
    NoStatusChange,

    #[error("Payout matures at {maturation}, after the payout upper bound {payout_upperbound}")]
    MaturationBeyondUpperbound {
        maturation: Timestamp,
        payout_upperbound: Timestamp,
    },

    #[error("Deadline passed: now {now}, deadline {deadline}")]
    DeadlinePassed { now: Timestamp, deadline: Timestamp },

    #[error("Not yet expired: now {now}, expiration {expiration}")]
    NotYetExpired { now: Timestamp, expiration: Timestamp },

    #[error("Empty validity window: from {from} until {until}")]
    EmptyValidityWindow { from: Timestamp, until: Timestamp },

    #[error("Donation of {requested} exceeds base amount {available}")]
    DonationExceedsBase { requested: i128, available: i128 },

    #[error("Withdrawal split {requested} does not match reward balance {available}")]
    WithdrawalMismatch { available: u64, requested: u64 },

    #[error("Nothing to withdraw from the reward account")]
    NothingToWithdraw,

    #[error("Datum at {reference} is malformed: {reason}")]
    MalformedDatum {
        reference: OutputReference,
        reason: String,
    },

    #[error("Datum at {reference} is well formed and must follow the normal lifecycle")]
    WellFormedDatum { reference: OutputReference },
}

/// Taxonomy family of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Resolution,
    Invariant,
    Codec,
    Ledger,
}

/// Main error type for the core
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("{operation} failed: {source}")]
    Operation {
        operation: Operation,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Taxonomy family, looking through operation context
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Configuration(_) => ErrorKind::Configuration,
            Error::Resolution(_) => ErrorKind::Resolution,
            Error::Invariant(_) => ErrorKind::Invariant,
            Error::Codec(_) => ErrorKind::Codec,
            Error::Ledger(_) => ErrorKind::Ledger,
            Error::Operation { source, .. } => source.kind(),
        }
    }

    /// Innermost error, without operation context
    pub fn root(&self) -> &Error {
        match self {
            Error::Operation { source, .. } => source.root(),
            other => other,
        }
    }

    /// The invariant violation behind this error, if any
    pub fn invariant(&self) -> Option<&InvariantViolation> {
        match self.root() {
            Error::Invariant(violation) => Some(violation),
            _ => None,
        }
    }

    /// The configuration error behind this error, if any
    pub fn configuration(&self) -> Option<&ConfigurationError> {
        match self.root() {
            Error::Configuration(error) => Some(error),
            _ => None,
        }
    }

    /// The resolution error behind this error, if any
    pub fn resolution(&self) -> Option<&ResolutionError> {
        match self.root() {
            Error::Resolution(error) => Some(error),
            _ => None,
        }
    }
}

/// Attaches the failing operation to an error
pub trait OperationContext<T> {
    fn during(self, operation: Operation) -> Result<T>;
}

impl<T, E: Into<Error>> OperationContext<T> for std::result::Result<T, E> {
    fn during(self, operation: Operation) -> Result<T> {
        self.map_err(|e| Error::Operation {
            operation,
            source: Box::new(e.into()),
        })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_looks_through_operation() {
        let result: std::result::Result<(), InvariantViolation> = Err(InvariantViolation::NoInputs);
        let err = result.during(Operation::Reorganize).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Invariant);
        assert_eq!(err.invariant(), Some(&InvariantViolation::NoInputs));
        assert!(err.to_string().starts_with("reorganize failed"));
    }

    #[test]
    fn test_message_carries_values() {
        let err = Error::from(InvariantViolation::StatusCountMismatch {
            expected: 3,
            actual: 2,
        });
        let message = err.to_string();
        assert!(message.contains("3"));
        assert!(message.contains("2"));
    }
}
