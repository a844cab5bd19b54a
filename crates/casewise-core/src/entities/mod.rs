//! Entity structs for all Casewise domain objects.
//!
//! Each entity maps to a table in the libSQL database (see
//! `casewise-db/migrations/001_initial.sql`). All structs derive `Serialize`,
//! `Deserialize`, and `JsonSchema` for JSON roundtrip and schema validation.

mod audit;
mod case;
mod interaction;
mod participant;
mod report;
mod session;
mod task;

pub use audit::AuditEntry;
pub use case::Case;
pub use interaction::Interaction;
pub use participant::Participant;
pub use report::Report;
pub use session::AuthSession;
pub use task::Task;
