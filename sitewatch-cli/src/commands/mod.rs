//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! - [`survey`] - Batch survey and stall report
//! - [`nodes`] - Bulk metadata listing
//! - [`fetch`] - Single node imagery download
//! - [`stalls`] - Stall report from an existing results file
//! - [`locator`] - Version extraction from a locator

pub mod common;
pub mod fetch;
pub mod locator;
pub mod nodes;
pub mod stalls;
pub mod survey;
