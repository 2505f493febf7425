//! System profiles: the device/software descriptor aggregates are segmented by.

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh64::xxh64;

/// Opaque device/software descriptor attached to every aggregate row.
///
/// Rows reference a profile by its stable 64-bit hash so the full value is
/// stored once per distinct profile rather than once per row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SystemProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_version: Option<String>,
}

impl SystemProfile {
    /// Stable 64-bit hash of the serialized profile, used as a join key.
    ///
    /// Field skipping in the serde representation keeps the bytes canonical:
    /// an unset field hashes the same as an absent one.
    pub fn profile_hash(&self) -> u64 {
        // Serializing a struct with known fields cannot fail.
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        xxh64(&bytes, 0)
    }
}
