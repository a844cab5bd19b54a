//! ID prefix constants.
//!
//! IDs are generated by the database as `{prefix}-{8 hex chars}`, e.g.
//! `cas-a3f8b2c1`. The prefix makes an ID self-describing in logs and URLs.

pub const PREFIX_CASE: &str = "cas";
pub const PREFIX_PARTICIPANT: &str = "par";
pub const PREFIX_INTERACTION: &str = "int";
pub const PREFIX_TASK: &str = "tsk";
pub const PREFIX_REPORT: &str = "rpt";
pub const PREFIX_AUDIT: &str = "aud";

/// Every prefix in use, for exhaustive tests.
pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_CASE,
    PREFIX_PARTICIPANT,
    PREFIX_INTERACTION,
    PREFIX_TASK,
    PREFIX_REPORT,
    PREFIX_AUDIT,
];

/// Check whether `id` looks like `{prefix}-{8 hex}`.
#[must_use]
pub fn has_prefix(id: &str, prefix: &str) -> bool {
    id.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|hex| hex.len() == 8 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
