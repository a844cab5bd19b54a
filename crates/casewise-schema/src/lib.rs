//! # casewise-schema
//!
//! JSON Schema registry for Casewise.
//!
//! Entity, request, and response types are defined in `casewise-core` with
//! `#[derive(JsonSchema)]`. This crate collects their schemas by name, checks
//! incoming request bodies against them, and serves them at `/api/schemas`.

mod error;
mod registry;

pub use error::SchemaError;
pub use registry::SchemaRegistry;
