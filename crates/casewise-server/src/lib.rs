//! # casewise-server
//!
//! The Casewise JSON service: routing, handlers, cookie sessions, and the
//! `tiny_http` server loop. The `casewise` binary in `main.rs` adds the CLI
//! and bootstrap on top of this library.

pub mod app;
pub mod error;
pub mod handlers;
pub mod http;
pub mod router;
pub mod server;
pub mod session;

pub use app::AppState;
pub use error::ApiError;
pub use http::{ApiRequest, ApiResponse, Method};
