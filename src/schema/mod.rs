//! Row schema for stored logs
//!
//! The store hands back loosely-typed rows (string dates and times, string
//! factor tags, signed integers). This module defines those row shapes and
//! validates them into the typed records the analytics accept, so nothing
//! downstream ever sees an unchecked value.

mod adapter;
mod rows;

pub use adapter::*;
pub use rows::*;

/// Current schema version for sleep log rows
pub const SCHEMA_VERSION: &str = "wellness.sleep_log.v1";
