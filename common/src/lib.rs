//! # Scout Common
//!
//! Shared building blocks for the discovery engine and its command line:
//!
//! * **[`network`]**: host interface inventory and selection of the audio-network interface.
//! * **[`config`]**: runtime configuration with the defaults used on the target host.
//! * **[`log`]**: logging helpers shared across the workspace.

pub mod config;
pub mod log;
pub mod network;
