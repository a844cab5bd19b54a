//! HTTP server configuration.

use serde::{Deserialize, Serialize};

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8080
}

/// 25 MiB, the largest audio file the transcription API accepts.
const fn default_max_body_bytes() -> u64 {
    25 * 1024 * 1024
}

const fn default_worker_threads() -> usize {
    4
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Request bodies larger than this are rejected with 413.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: u64,

    /// Threads pulling requests off the listener.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            worker_threads: default_worker_threads(),
        }
    }
}

impl ServerConfig {
    /// `host:port` for binding.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
