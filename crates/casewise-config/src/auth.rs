//! Session-cookie authentication configuration.

use serde::{Deserialize, Serialize};

const fn default_enabled() -> bool {
    true
}

fn default_cookie_name() -> String {
    "casewise_session".to_string()
}

const fn default_session_ttl_hours() -> u32 {
    12
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// When false every route is open.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Shared password exchanged for a session cookie.
    #[serde(default)]
    pub password: String,

    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            password: String::new(),
            cookie_name: default_cookie_name(),
            session_ttl_hours: default_session_ttl_hours(),
        }
    }
}

impl AuthConfig {
    /// Enabled auth needs a password to be usable.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.enabled || !self.password.is_empty()
    }

    /// Session lifetime in seconds, for `Max-Age`.
    #[must_use]
    pub fn session_ttl_secs(&self) -> i64 {
        i64::from(self.session_ttl_hours) * 3_600
    }
}
