//! BOHM Tools module
//!
//! MCP tool implementations for the Back-of-House Manager.

pub mod costing;
pub mod ingredients;
pub mod recipes;
pub mod status;
