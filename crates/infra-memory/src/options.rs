// Memory backend options

use serde::{Deserialize, Serialize};

/// Behaviour switches of the memory backend
///
/// Deserializable so applications can carry them in their own config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryOptions {
    /// Write staged changes when a unit of work is closed or dropped
    pub flushes_on_dispose: bool,
    /// Answer `get_by_id` directly instead of reporting it unsupported
    pub supports_generic_get_by_id: bool,
}

impl Default for MemoryOptions {
    fn default() -> Self {
        Self {
            flushes_on_dispose: false,
            supports_generic_get_by_id: true,
        }
    }
}

impl MemoryOptions {
    /// Behaves like a store that can only be queried by predicate
    pub fn predicate_only() -> Self {
        Self {
            supports_generic_get_by_id: false,
            ..Self::default()
        }
    }

    pub fn flushing_on_dispose() -> Self {
        Self {
            flushes_on_dispose: true,
            ..Self::default()
        }
    }
}
