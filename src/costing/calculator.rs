//! Unit cost calculator
//!
//! Derives the as-purchased (AP) cost per case unit from a parsed case and a
//! case price, and expresses it per pound, ounce or each where a conversion is
//! defined.

use serde::Serialize;

use super::parser::ParseResult;
use super::units::{basis_factor, units_per, CaseUnit, CostBasis};

/// Derived costs for one case
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostCalculation {
    /// Case price divided by case quantity
    pub ap_cost: f64,
    pub ap_unit: CaseUnit,
    pub cost_per_pound: Option<f64>,
    pub cost_per_ounce: Option<f64>,
    pub cost_per_each: Option<f64>,
}

impl CostCalculation {
    /// Cost of `quantity` of this ingredient measured in `unit`
    ///
    /// Pounds and ounces convert into each other. Any other mismatch is costed
    /// as if the units matched.
    pub fn recipe_cost(&self, quantity: f64, unit: &str) -> f64 {
        let Some(recipe_unit) = CaseUnit::from_token(unit) else {
            tracing::warn!(
                "Unrecognized recipe unit '{}', costing {} as {}",
                unit,
                quantity,
                self.ap_unit
            );
            return quantity * self.ap_cost;
        };

        match units_per(self.ap_unit, recipe_unit) {
            Some(factor) => quantity * self.ap_cost / factor,
            None => {
                tracing::warn!(
                    "No conversion from {} to {}, costing {} {} as {}",
                    self.ap_unit,
                    recipe_unit,
                    quantity,
                    recipe_unit,
                    self.ap_unit
                );
                quantity * self.ap_cost
            }
        }
    }

    /// Whether `recipe_cost` would convert `unit` rather than assume it matches
    pub fn converts_unit(&self, unit: &str) -> bool {
        CaseUnit::from_token(unit)
            .and_then(|u| units_per(self.ap_unit, u))
            .is_some()
    }

    /// Edible-portion cost after trim or cooking loss
    ///
    /// `yield_percent` must be in (0, 100].
    pub fn ep_cost(&self, yield_percent: f64) -> Option<f64> {
        if !(yield_percent > 0.0 && yield_percent <= 100.0) {
            return None;
        }
        Some(self.ap_cost / (yield_percent / 100.0))
    }
}

/// Compute the cost breakdown for a parsed case
///
/// Returns `None` while there is not enough data: a failed parse or a missing
/// or non-positive price.
pub fn compute_cost(parse: &ParseResult, case_price: f64) -> Option<CostCalculation> {
    let case = parse.parsed()?;
    compute_case_cost(case.case_quantity, case.case_unit, case_price)
}

/// Compute the cost breakdown from stored case fields
pub fn compute_case_cost(
    case_quantity: f64,
    case_unit: CaseUnit,
    case_price: f64,
) -> Option<CostCalculation> {
    if !(case_price.is_finite() && case_price > 0.0) {
        return None;
    }
    if !(case_quantity.is_finite() && case_quantity > 0.0) {
        return None;
    }

    let ap_cost = case_price / case_quantity;
    let per = |basis| basis_factor(case_unit, basis).map(|factor| ap_cost / factor);

    Some(CostCalculation {
        ap_cost,
        ap_unit: case_unit,
        cost_per_pound: per(CostBasis::Pound),
        cost_per_ounce: per(CostBasis::Ounce),
        cost_per_each: per(CostBasis::Each),
    })
}

/// Plate cost as a percentage of menu price
pub fn food_cost_percentage(plate_cost: f64, menu_price: f64) -> Option<f64> {
    if !(menu_price.is_finite() && menu_price > 0.0) || !plate_cost.is_finite() {
        return None;
    }
    Some(plate_cost / menu_price * 100.0)
}
