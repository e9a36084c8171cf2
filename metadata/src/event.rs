//! Event records attached to treasury and vendor transactions

use crate::chunk;
use crate::codec::{decode, encode};
use crate::error::{MetadataError, Result};
use crate::metadatum::{decode_auxiliary, encode_auxiliary, Metadatum};
use crate::{DEFAULT_HASH_ALGORITHM, METADATA_LABEL};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Descriptive note for one payout of a funded schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneNote {
    #[serde(deserialize_with = "chunk::string")]
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "chunk::optional")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "chunk::optional")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "chunk::optional")]
    pub acceptance_criteria: Option<String>,
}

/// Reason given for pausing or resuming one payout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusNote {
    pub index: u64,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "chunk::optional")]
    pub reason: Option<String>,
}

/// Evidence supplied when claiming one payout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawNote {
    pub index: u64,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "chunk::optional")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "chunk::strings")]
    pub evidence: Vec<String>,
}

/// Body of a metadata record, discriminated by `event`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum Event {
    /// A treasury instance was announced
    #[serde(rename_all = "camelCase")]
    Publish {
        #[serde(deserialize_with = "chunk::string")]
        label: String,
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            deserialize_with = "chunk::optional"
        )]
        description: Option<String>,
        expiration: u64,
        payout_upperbound: u64,
        vendor_expiration: u64,
    },
    /// The registry and scripts of an instance were deployed
    Initialize {
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            deserialize_with = "chunk::optional"
        )]
        reason: Option<String>,
    },
    Reorganize {
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            deserialize_with = "chunk::optional"
        )]
        reason: Option<String>,
    },
    /// A payout schedule was locked for a vendor
    Fund {
        #[serde(deserialize_with = "chunk::string")]
        identifier: String,
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            deserialize_with = "chunk::optional"
        )]
        label: Option<String>,
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            deserialize_with = "chunk::optional"
        )]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        milestones: Vec<MilestoneNote>,
    },
    Disburse {
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            deserialize_with = "chunk::optional"
        )]
        label: Option<String>,
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            deserialize_with = "chunk::optional"
        )]
        description: Option<String>,
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            deserialize_with = "chunk::optional"
        )]
        justification: Option<String>,
    },
    Pause {
        milestones: Vec<StatusNote>,
    },
    Resume {
        milestones: Vec<StatusNote>,
    },
    Modify {
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            deserialize_with = "chunk::optional"
        )]
        reason: Option<String>,
    },
    /// Payouts were claimed, or proof of delivery attached
    Withdraw {
        milestones: Vec<WithdrawNote>,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::Publish { .. } => "publish",
            Event::Initialize { .. } => "initialize",
            Event::Reorganize { .. } => "reorganize",
            Event::Fund { .. } => "fund",
            Event::Disburse { .. } => "disburse",
            Event::Pause { .. } => "pause",
            Event::Resume { .. } => "resume",
            Event::Modify { .. } => "modify",
            Event::Withdraw { .. } => "withdraw",
        }
    }
}

/// The full record stored under [`METADATA_LABEL`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxMetadata {
    #[serde(rename = "@context", deserialize_with = "chunk::string")]
    pub context: String,
    #[serde(
        rename = "hashAlgorithm",
        default = "default_hash_algorithm",
        deserialize_with = "chunk::string"
    )]
    pub hash_algorithm: String,
    pub body: Event,
    /// Identifier of the treasury instance the record belongs to
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "chunk::optional")]
    pub instance: Option<String>,
}

fn default_hash_algorithm() -> String {
    DEFAULT_HASH_ALGORITHM.to_string()
}

impl TxMetadata {
    pub fn new(context: impl Into<String>, body: Event) -> Self {
        Self {
            context: context.into(),
            hash_algorithm: default_hash_algorithm(),
            body,
            instance: None,
        }
    }

    pub fn for_instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }

    pub fn to_metadatum(&self) -> Result<Metadatum> {
        encode(self)
    }

    pub fn from_metadatum(metadatum: &Metadatum) -> Result<Self> {
        decode(metadatum)
    }

    /// Auxiliary-data bytes holding this record under [`METADATA_LABEL`]
    pub fn to_auxiliary_bytes(&self) -> Result<Vec<u8>> {
        let mut entries = BTreeMap::new();
        entries.insert(METADATA_LABEL, self.to_metadatum()?);
        encode_auxiliary(&entries)
    }

    pub fn from_auxiliary_bytes(bytes: &[u8]) -> Result<Self> {
        let entries = decode_auxiliary(bytes)?;
        let metadatum = entries
            .get(&METADATA_LABEL)
            .ok_or(MetadataError::MissingLabel(METADATA_LABEL))?;
        Self::from_metadatum(metadatum)
    }
}
