//! Engine configuration

use serde::{Deserialize, Serialize};

/// Limits and defaults applied when a [`ScriptRuntime`](crate::ScriptRuntime) is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Heap limit in bytes; unlimited when absent.
    pub memory_limit: Option<usize>,

    /// Native stack limit in bytes.
    pub max_stack_size: Option<usize>,

    /// Allocation volume that triggers a collection.
    pub gc_threshold: Option<usize>,

    /// Locale used by `toLocaleString` when the script passes none.
    pub default_locale: String,

    /// Largest length a script may give a host sequence, or a script array
    /// copied into the host. Longer requests fail with a `RangeError`.
    pub max_array_length: usize,
}

/// Default for [`EngineConfig::max_array_length`].
pub const DEFAULT_MAX_ARRAY_LENGTH: usize = 1 << 24;

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            memory_limit: None,
            max_stack_size: None,
            gc_threshold: None,
            default_locale: "en-US".to_string(),
            max_array_length: DEFAULT_MAX_ARRAY_LENGTH,
        }
    }
}
