//! # Scout Core
//!
//! The discovery engine for audio-over-IP endpoints.
//!
//! * **[`backend`]**: the port to the vendor discovery service, plus a simulated adapter.
//! * **[`resolver`]**: turns the service's network view into a fresh device table.
//! * **[`table`]**: immutable device tables and the reader handle.
//! * **[`keeper`]**: the single task that serializes rebuilds and publishes tables.
//! * **[`ticker`]**: the background event-processing pump.
//! * **[`session`]**: lifecycle of one discovery domain.
//! * **[`supervisor`]**: end-to-end orchestration until shutdown.

pub mod backend;
pub mod keeper;
pub mod resolver;
pub mod session;
pub mod supervisor;
pub mod table;
pub mod ticker;
