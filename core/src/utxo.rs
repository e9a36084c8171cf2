//! Ledger primitives: hashes, credentials, addresses and unspent outputs

use crate::value::AssetBundle;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// POSIX time in milliseconds, as reported by the chain
pub type Timestamp = u64;

macro_rules! hash_type {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            /// Length of the hash in bytes
            pub const LENGTH: usize = $len;

            pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
                let mut bytes = [0u8; $len];
                hex::decode_to_slice(s, &mut bytes)?;
                Ok(Self(bytes))
            }

            pub fn as_bytes(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = hex::FromHexError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::from_hex(s)
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&hex::encode(self.0))
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Self::from_hex(&s).map_err(de::Error::custom)
            }
        }
    };
}

hash_type!(
    /// Hash of a verification key (28 bytes)
    KeyHash,
    28
);
hash_type!(
    /// Hash of a script (28 bytes)
    ScriptHash,
    28
);
hash_type!(
    /// Identifier of an asset issuer (minting policy hash, 28 bytes)
    PolicyId,
    28
);
hash_type!(
    /// Transaction identifier (32 bytes)
    TxHash,
    32
);

/// Name of an asset under a policy (at most 32 bytes)
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetName(pub Vec<u8>);

impl AssetName {
    pub const MAX_LENGTH: usize = 32;

    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() > Self::MAX_LENGTH {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        Ok(Self(bytes))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl fmt::Debug for AssetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(text) => write!(f, "AssetName({:?})", text),
            Err(_) => write!(f, "AssetName({})", hex::encode(&self.0)),
        }
    }
}

/// Payment or stake credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Credential {
    Key(KeyHash),
    Script(ScriptHash),
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credential::Key(hash) => write!(f, "key:{}", hash),
            Credential::Script(hash) => write!(f, "script:{}", hash),
        }
    }
}

/// Ledger address: a payment credential and an optional stake credential
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address {
    pub payment: Credential,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stake: Option<Credential>,
}

impl Address {
    pub fn new(payment: Credential, stake: Option<Credential>) -> Self {
        Self { payment, stake }
    }

    /// Address fully controlled by one script (payment and stake)
    pub fn script(hash: ScriptHash) -> Self {
        Self {
            payment: Credential::Script(hash),
            stake: Some(Credential::Script(hash)),
        }
    }

    /// Address paying to a single key with no stake part
    pub fn key(hash: KeyHash) -> Self {
        Self {
            payment: Credential::Key(hash),
            stake: None,
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.stake {
            Some(stake) => write!(f, "{}/{}", self.payment, stake),
            None => write!(f, "{}", self.payment),
        }
    }
}

/// Pointer to a transaction output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutputReference {
    pub tx_hash: TxHash,
    pub index: u32,
}

impl OutputReference {
    pub fn new(tx_hash: TxHash, index: u32) -> Self {
        Self { tx_hash, index }
    }
}

impl fmt::Display for OutputReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tx_hash, self.index)
    }
}

/// An unspent output as reported by the ledger collaborator.
///
/// The datum is kept as the raw inline bytes; parsing is up to the
/// protocol consuming it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentOutput {
    pub reference: OutputReference,
    pub address: Address,
    pub value: AssetBundle,
    #[serde(default, with = "crate::datum::hex_option", skip_serializing_if = "Option::is_none")]
    pub datum: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_ref: Option<ScriptHash>,
}

impl UnspentOutput {
    pub fn new(reference: OutputReference, address: Address, value: AssetBundle) -> Self {
        Self {
            reference,
            address,
            value,
            datum: None,
            script_ref: None,
        }
    }

    pub fn with_datum(mut self, datum: Vec<u8>) -> Self {
        self.datum = Some(datum);
        self
    }

    pub fn with_script_ref(mut self, hash: ScriptHash) -> Self {
        self.script_ref = Some(hash);
        self
    }
}
