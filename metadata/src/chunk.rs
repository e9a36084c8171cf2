//! String chunking
//!
//! Splits long strings into pieces of at most [`CHUNK_SIZE`] bytes without
//! cutting through a UTF-8 sequence, and provides serde helpers that accept
//! either form when decoding.

use crate::CHUNK_SIZE;
use serde::{Deserialize, Deserializer};

/// Split `text` into chunks of at most [`CHUNK_SIZE`] bytes
pub fn chunk(text: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();

    for ch in text.chars() {
        if current.len() + ch.len_utf8() > CHUNK_SIZE {
            chunks.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// A string as it may appear on chain: whole, or split into chunks
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Chunked {
    Whole(String),
    Parts(Vec<String>),
}

impl Chunked {
    fn join(self) -> String {
        match self {
            Chunked::Whole(text) => text,
            Chunked::Parts(parts) => parts.concat(),
        }
    }
}

/// `deserialize_with` helper for `String` fields
pub fn string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Chunked::deserialize(deserializer).map(Chunked::join)
}

/// `deserialize_with` helper for `Option<String>` fields
pub fn optional<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Option::<Chunked>::deserialize(deserializer).map(|value| value.map(Chunked::join))
}

/// `deserialize_with` helper for `Vec<String>` fields
pub fn strings<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Vec::<Chunked>::deserialize(deserializer)
        .map(|values| values.into_iter().map(Chunked::join).collect())
}
