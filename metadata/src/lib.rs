//! Strongbox transaction metadata
//!
//! Treasury and vendor transactions carry a human-readable record of why
//! they happened. The record is a nested structure stored under a fixed
//! auxiliary-data label. The ledger caps text at 64 bytes per string, so
//! longer strings are split into lists of chunks and joined again on decode.

pub mod chunk;
pub mod codec;
pub mod error;
pub mod event;
pub mod metadatum;

pub use codec::{decode, encode};
pub use error::{MetadataError, Result};
pub use event::{Event, MilestoneNote, StatusNote, TxMetadata, WithdrawNote};
pub use metadatum::Metadatum;

/// Auxiliary-data label the treasury records live under
pub const METADATA_LABEL: u64 = 1694;

/// Maximum byte length of a single metadata string
pub const CHUNK_SIZE: usize = 64;

/// Hash algorithm advertised when the caller does not pick one
pub const DEFAULT_HASH_ALGORITHM: &str = "blake2b-256";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_constants() {
        assert_eq!(METADATA_LABEL, 1694);
        assert_eq!(CHUNK_SIZE, 64);
        assert_eq!(DEFAULT_HASH_ALGORITHM, "blake2b-256");
    }
}
