//! Encoding and decoding between domain types and SQLite column values.
//!
//! Timestamps are RFC 3339 UTC strings, UUIDs hyphenated lowercase strings,
//! signatures raw little-endian `f64` blobs (bit-exact round-trips, no
//! re-quantization). Decoding is strict: anything that does not parse is a
//! [`StoreError::Corrupt`], never a silently coerced default.

use chrono::{DateTime, Utc};
use rollcall_core::{Signature, StoreError};
use uuid::Uuid;

pub fn encode_uuid(id: Uuid) -> String {
    id.hyphenated().to_string()
}

pub fn decode_uuid(column: &str, s: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(s)
        .map_err(|e| StoreError::Corrupt(format!("{column}: bad uuid {s:?}: {e}")))
}

pub fn encode_dt(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

pub fn decode_dt(column: &str, s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("{column}: bad timestamp {s:?}: {e}")))
}

pub fn encode_signature(signature: &Signature) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(signature.values.len() * 8);
    for value in &signature.values {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Decode a signature blob, rejecting empty or truncated payloads.
pub fn decode_signature(bytes: &[u8]) -> Result<Signature, StoreError> {
    if bytes.is_empty() {
        return Err(StoreError::Corrupt("signature: empty blob".into()));
    }
    if bytes.len() % 8 != 0 {
        return Err(StoreError::Corrupt(format!(
            "signature: blob length {} is not a multiple of 8",
            bytes.len()
        )));
    }

    let values = bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(chunk);
            f64::from_le_bytes(buf)
        })
        .collect();
    Ok(Signature::new(values))
}
