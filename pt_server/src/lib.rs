//! HTTP front end for [`poker_table`] tables.
//!
//! The binary wires these modules together; they are exposed as a library
//! so the router can be driven directly in tests.

pub mod api;
pub mod config;
pub mod logging;
