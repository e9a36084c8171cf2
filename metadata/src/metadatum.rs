//! Auxiliary-data tree

use crate::error::{MetadataError, Result};
use ciborium::Value;
use std::collections::BTreeMap;

/// A node of transaction metadata as the ledger stores it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Metadatum {
    Int(i64),
    Bytes(Vec<u8>),
    Text(String),
    List(Vec<Metadatum>),
    Map(Vec<(Metadatum, Metadatum)>),
}

impl Metadatum {
    pub fn text(value: impl Into<String>) -> Self {
        Metadatum::Text(value.into())
    }

    /// Look up a text key in a map node
    pub fn get(&self, key: &str) -> Option<&Metadatum> {
        match self {
            Metadatum::Map(entries) => entries
                .iter()
                .find(|(k, _)| matches!(k, Metadatum::Text(text) if text == key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn to_cbor_value(&self) -> Value {
        match self {
            Metadatum::Int(n) => Value::Integer((*n).into()),
            Metadatum::Bytes(bytes) => Value::Bytes(bytes.clone()),
            Metadatum::Text(text) => Value::Text(text.clone()),
            Metadatum::List(items) => {
                Value::Array(items.iter().map(Metadatum::to_cbor_value).collect())
            }
            Metadatum::Map(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.to_cbor_value(), v.to_cbor_value()))
                    .collect(),
            ),
        }
    }

    pub fn from_cbor_value(value: Value) -> Result<Self> {
        match value {
            Value::Integer(n) => {
                let wide = i128::from(n);
                i64::try_from(wide)
                    .map(Metadatum::Int)
                    .map_err(|_| MetadataError::UnsupportedValue(format!("integer {}", wide)))
            }
            Value::Bytes(bytes) => Ok(Metadatum::Bytes(bytes)),
            Value::Text(text) => Ok(Metadatum::Text(text)),
            Value::Array(items) => items
                .into_iter()
                .map(Metadatum::from_cbor_value)
                .collect::<Result<Vec<_>>>()
                .map(Metadatum::List),
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| Ok((Metadatum::from_cbor_value(k)?, Metadatum::from_cbor_value(v)?)))
                .collect::<Result<Vec<_>>>()
                .map(Metadatum::Map),
            other => Err(MetadataError::UnsupportedValue(format!("{:?}", other))),
        }
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&self.to_cbor_value(), &mut bytes)
            .map_err(|e| MetadataError::Cbor(e.to_string()))?;
        Ok(bytes)
    }

    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        let value: Value =
            ciborium::de::from_reader(bytes).map_err(|e| MetadataError::Cbor(e.to_string()))?;
        Metadatum::from_cbor_value(value)
    }
}

/// Auxiliary data of a whole transaction: metadata keyed by label
pub fn encode_auxiliary(entries: &BTreeMap<u64, Metadatum>) -> Result<Vec<u8>> {
    let value = Value::Map(
        entries
            .iter()
            .map(|(label, datum)| (Value::Integer((*label).into()), datum.to_cbor_value()))
            .collect(),
    );
    let mut bytes = Vec::new();
    ciborium::ser::into_writer(&value, &mut bytes).map_err(|e| MetadataError::Cbor(e.to_string()))?;
    Ok(bytes)
}

/// Inverse of [`encode_auxiliary`]
pub fn decode_auxiliary(bytes: &[u8]) -> Result<BTreeMap<u64, Metadatum>> {
    let value: Value =
        ciborium::de::from_reader(bytes).map_err(|e| MetadataError::Cbor(e.to_string()))?;
    let Value::Map(entries) = value else {
        return Err(MetadataError::Schema("auxiliary data is not a map".to_string()));
    };

    let mut decoded = BTreeMap::new();
    for (label, datum) in entries {
        let label = match label {
            Value::Integer(n) => u64::try_from(i128::from(n))
                .map_err(|_| MetadataError::Schema("negative metadata label".to_string()))?,
            other => return Err(MetadataError::Schema(format!("bad label {:?}", other))),
        };
        decoded.insert(label, Metadatum::from_cbor_value(datum)?);
    }
    Ok(decoded)
}
