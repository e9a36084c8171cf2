//! Datum codec
//!
//! Datums travel as CBOR. The schema is fixed by the validator side, so
//! this module only offers the serialize/parse pair and the empty datum.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encoding of the empty datum (constructor 0, no fields)
const VOID: [u8; 3] = [0xd8, 0x79, 0x80];

/// The empty datum
pub fn void() -> Vec<u8> {
    VOID.to_vec()
}

pub fn is_void(bytes: &[u8]) -> bool {
    bytes == VOID
}

/// Serialize a value to CBOR
pub fn to_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::ser::into_writer(value, &mut bytes)
        .map_err(|e| Error::Codec(format!("Failed to encode datum: {}", e)))?;
    Ok(bytes)
}

/// Parse a value from CBOR
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ciborium::de::from_reader(bytes)
        .map_err(|e| Error::Codec(format!("Failed to decode datum: {}", e)))
}

/// Serde helper for optional raw bytes written as hex
pub mod hex_option {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Vec<u8>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(bytes) => serializer.serialize_some(&hex::encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(text) => hex::decode(text).map(Some).map_err(de::Error::custom),
            None => Ok(None),
        }
    }
}
