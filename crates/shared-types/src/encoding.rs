//! # Canonical Encoding
//!
//! Every object that crosses the wire or gets hashed is encoded with
//! bincode's default (fixed-int, little-endian) configuration.

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::errors::EncodingError;

/// Encode an object into its canonical byte form.
pub fn encode<T: Serialize + ?Sized>(object: &T) -> Result<Vec<u8>, EncodingError> {
    bincode::serialize(object).map_err(|e| EncodingError::EncodeFailed(e.to_string()))
}

/// Decode an object, refusing input longer than `max_len` bytes.
///
/// Trailing bytes after the object are rejected so that a given object has
/// exactly one accepted encoding.
pub fn decode<T: DeserializeOwned>(bytes: &[u8], max_len: u64) -> Result<T, EncodingError> {
    if bytes.len() as u64 > max_len {
        return Err(EncodingError::ObjectTooLarge {
            size: bytes.len() as u64,
            max_size: max_len,
        });
    }
    // Same layout as `bincode::serialize`, but strict about trailing bytes.
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(max_len)
        .reject_trailing_bytes()
        .deserialize(bytes)
        .map_err(|e| EncodingError::Malformed(e.to_string()))
}
