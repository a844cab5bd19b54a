//! # casewise-core
//!
//! Core types, ID prefixes, and error types for Casewise.
//!
//! This crate provides the foundational types shared across all Casewise crates:
//! - Entity structs for the case file (cases, participants, interactions, tasks, reports)
//! - Status enums with state machine transitions
//! - ID prefix constants
//! - Request payloads with field-level validation
//! - API response types
//! - Audit detail sub-types
//! - The markdown section parser/editor used for AI summaries

pub mod audit_detail;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod ids;
pub mod requests;
pub mod responses;
pub mod summary;
