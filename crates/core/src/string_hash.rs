//! Stable per-report-per-day string hashing and list indices.

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

/// 8-byte stable hash of a logged string value.
pub type StringHash = [u8; 8];

/// Hash a logged string value to its 8-byte wire form.
pub fn string_hash_ff64(value: &str) -> StringHash {
    xxh64(value.as_bytes(), 0).to_be_bytes()
}

/// Assignment of a stable per-report-per-day ordinal to one distinct hashed
/// string value. Once assigned, a list index is immutable for that
/// report/day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringListEntry {
    pub list_index: u32,
    pub hash: StringHash,
}

impl StringListEntry {
    pub fn new(list_index: u32, hash: StringHash) -> Self {
        Self { list_index, hash }
    }
}
