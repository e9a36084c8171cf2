//! Serde bridge between record types and [`Metadatum`] trees
//!
//! Encoding goes through `serde_json::Value`: strings over the chunk size
//! become lists of chunks, absent optional fields are dropped and anything
//! the ledger cannot store (booleans, floats, nulls) is rejected. Decoding
//! rebuilds the JSON shape and lets the target type's `Deserialize` impl
//! decide, which is where chunk lists are joined back into strings.

use crate::chunk::chunk;
use crate::error::{MetadataError, Result};
use crate::metadatum::Metadatum;
use crate::CHUNK_SIZE;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value};

/// Encode a record into a metadata tree
pub fn encode<T: Serialize>(body: &T) -> Result<Metadatum> {
    let value = serde_json::to_value(body).map_err(|e| MetadataError::Schema(e.to_string()))?;
    from_json(value)
}

/// Decode a metadata tree into a record
pub fn decode<T: DeserializeOwned>(metadatum: &Metadatum) -> Result<T> {
    serde_json::from_value(to_json(metadatum)?).map_err(|e| MetadataError::Schema(e.to_string()))
}

fn from_json(value: Value) -> Result<Metadatum> {
    match value {
        Value::Null => Err(MetadataError::UnsupportedValue("null".to_string())),
        Value::Bool(b) => Err(MetadataError::UnsupportedValue(format!("boolean {}", b))),
        Value::Number(n) => n
            .as_i64()
            .map(Metadatum::Int)
            .ok_or_else(|| MetadataError::UnsupportedValue(format!("number {}", n))),
        Value::String(text) => Ok(text_node(text)),
        Value::Array(items) => items
            .into_iter()
            .map(from_json)
            .collect::<Result<Vec<_>>>()
            .map(Metadatum::List),
        Value::Object(fields) => {
            let mut entries = Vec::with_capacity(fields.len());
            for (key, value) in fields {
                if value.is_null() {
                    continue;
                }
                if key.len() > CHUNK_SIZE {
                    return Err(MetadataError::KeyTooLong {
                        length: key.len(),
                        key,
                    });
                }
                entries.push((Metadatum::Text(key), from_json(value)?));
            }
            Ok(Metadatum::Map(entries))
        }
    }
}

fn text_node(text: String) -> Metadatum {
    if text.len() <= CHUNK_SIZE {
        return Metadatum::Text(text);
    }
    let chunks = chunk(&text);
    log::debug!("chunked {}-byte string into {} parts", text.len(), chunks.len());
    Metadatum::List(chunks.into_iter().map(Metadatum::Text).collect())
}

fn to_json(metadatum: &Metadatum) -> Result<Value> {
    Ok(match metadatum {
        Metadatum::Int(n) => Value::Number(Number::from(*n)),
        Metadatum::Bytes(bytes) => Value::String(hex::encode(bytes)),
        Metadatum::Text(text) => Value::String(text.clone()),
        Metadatum::List(items) => Value::Array(items.iter().map(to_json).collect::<Result<_>>()?),
        Metadatum::Map(entries) => {
            let mut fields = Map::new();
            for (key, value) in entries {
                let Metadatum::Text(key) = key else {
                    return Err(MetadataError::NonTextKey(format!("{:?}", key)));
                };
                fields.insert(key.clone(), to_json(value)?);
            }
            Value::Object(fields)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Note {
        #[serde(deserialize_with = "crate::chunk::string")]
        title: String,
        #[serde(
            default,
            skip_serializing_if = "Option::is_none",
            deserialize_with = "crate::chunk::optional"
        )]
        comment: Option<String>,
        count: u64,
    }

    #[test]
    fn test_long_strings_roundtrip() {
        let note = Note {
            title: "t".repeat(200),
            comment: Some("short".to_string()),
            count: 3,
        };
        let tree = encode(&note).unwrap();
        assert!(matches!(tree.get("title"), Some(Metadatum::List(parts)) if parts.len() == 4));
        assert_eq!(decode::<Note>(&tree).unwrap(), note);
    }

    #[test]
    fn test_absent_option_is_skipped() {
        let note = Note {
            title: "x".to_string(),
            comment: None,
            count: 0,
        };
        let tree = encode(&note).unwrap();
        assert_eq!(tree.get("comment"), None);
        assert_eq!(decode::<Note>(&tree).unwrap(), note);
    }

    #[test]
    fn test_unsupported_values() {
        assert!(matches!(
            encode(&true),
            Err(MetadataError::UnsupportedValue(_))
        ));
        assert!(matches!(
            encode(&1.5f64),
            Err(MetadataError::UnsupportedValue(_))
        ));

        let mut fields = std::collections::BTreeMap::new();
        fields.insert("k".repeat(65), 1u8);
        assert!(matches!(
            encode(&fields),
            Err(MetadataError::KeyTooLong { length: 65, .. })
        ));
    }

    #[test]
    fn test_bytes_decode_as_hex() {
        let tree = Metadatum::List(vec![
            Metadatum::Bytes(vec![0xde, 0xad, 0x00, 0x0f]),
            Metadatum::Bytes(Vec::new()),
        ]);
        let decoded: Vec<String> = decode(&tree).unwrap();
        assert_eq!(decoded, vec!["dead000f".to_string(), String::new()]);
    }

    #[test]
    fn test_non_text_key_is_rejected() {
        let tree = Metadatum::Map(vec![(Metadatum::Int(1), Metadatum::Int(2))]);
        assert!(matches!(
            decode::<serde_json::Value>(&tree),
            Err(MetadataError::NonTextKey(_))
        ));
    }
}
