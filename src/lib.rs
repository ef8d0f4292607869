//! Back-of-House Manager (BOHM) Library
//!
//! Case-description parsing, ingredient costing, and recipe plate costs.

pub mod build_info;
pub mod config;
pub mod costing;
pub mod db;
pub mod mcp;
pub mod models;
pub mod tools;
