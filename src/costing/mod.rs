//! Case costing module
//!
//! Parses vendor case descriptions and derives per-unit costs from them.

pub mod calculator;
pub mod parser;
pub mod units;

pub use calculator::{compute_case_cost, compute_cost, food_cost_percentage, CostCalculation};
pub use parser::{parse_case_description, CasePattern, ParseFailure, ParseResult, ParsedCase};
pub use units::{basis_factor, units_per, CaseUnit, CostBasis, UnitFamily};
