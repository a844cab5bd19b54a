//! General application configuration.

use serde::{Deserialize, Serialize};

/// Default result limit.
const fn default_limit() -> u32 {
    50
}

/// Upper bound for any caller-supplied `limit`.
const fn default_max_limit() -> u32 {
    500
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Default result limit for list endpoints.
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    /// Caller-supplied limits are clamped to this value.
    #[serde(default = "default_max_limit")]
    pub max_limit: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
        }
    }
}

impl GeneralConfig {
    /// Resolve a caller-supplied limit against the defaults.
    #[must_use]
    pub fn effective_limit(&self, requested: Option<u32>) -> u32 {
        requested
            .filter(|&n| n > 0)
            .unwrap_or(self.default_limit)
            .min(self.max_limit)
    }
}
