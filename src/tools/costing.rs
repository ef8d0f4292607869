//! Costing MCP Tools
//!
//! Stateless tools wrapping the case parser and cost calculator.

use serde::Serialize;

use crate::costing::{compute_cost, parse_case_description, CostCalculation, ParseResult};

/// Costing workflow instructions for AI assistants
pub const COSTING_INSTRUCTIONS: &str = r#"
# BOHM Costing Instructions

## Case descriptions

Ingredients are priced by the case. Enter the case description the way it
appears on the vendor invoice. Recognized shapes, checked in this order:

| Shape            | Example          | Reads as                         |
|------------------|------------------|----------------------------------|
| count + weight   | `120 count, 50#` | 120 each (50 lbs noted)          |
| packs / pounds   | `36/1#`          | 36 lbs                           |
| packs / lb       | `1/25LB`         | 25 lbs (larger of the two)       |
| pounds           | `25#`            | 25 lbs                           |
| count            | `24 heads`       | 24 heads                         |
| multiply         | `6 x 102 oz`     | 6 oz (outer count only)          |
| weight           | `50 lb`, `5 kg`  | 50 lbs, 5 kg                     |
| volume           | `4 gal`          | 4 gal                            |
| bare number      | `42`             | 42 each, with a warning          |

Quantities may use thousands separators (`1,000 count`). A pack size such as
`24/8 oz` or `12/32 oz` is not a weight: it falls through to the bare number
(24 each, with a warning).

Always call `parse_case_description` first when unsure. A `warning` means the
unit was guessed; confirm it with the user.

## Costs

- AP cost = case price / case quantity, in the case unit.
- Per-pound and per-ounce costs only appear for pound cases. Ounce and fluid
  ounce cases give per-ounce only. Count cases give per-each.
- Recipe lines convert between pounds and ounces. Any other unit mismatch is
  costed as if the units matched, so keep recipe units in the case unit.
- Yield below 100% raises the line cost (edible-portion cost).

## Workflow

1. `add_ingredient` with name, case_description and case_price.
2. `create_recipe` with portions and menu_price.
3. `add_recipe_ingredient` for each line.
4. `get_recipe` for plate cost and food cost percentage.
"#;

/// Response for compute_cost
#[derive(Debug, Serialize)]
pub struct ComputeCostResponse {
    pub parse: ParseResult,
    pub case_price: f64,
    /// Null until both the parse and the price are usable
    pub cost: Option<CostCalculation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ep_cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe_cost: Option<RecipeQuantityCost>,
}

/// Cost of a recipe quantity of the case
#[derive(Debug, Serialize)]
pub struct RecipeQuantityCost {
    pub quantity: f64,
    pub unit: String,
    pub cost: f64,
    pub unit_converted: bool,
}

/// Parse a case description
pub fn parse_case(description: &str) -> ParseResult {
    parse_case_description(description)
}

/// Parse a case description and derive its costs
pub fn compute_case_costs(
    description: &str,
    case_price: f64,
    recipe_quantity: Option<f64>,
    recipe_unit: Option<&str>,
    yield_percent: Option<f64>,
) -> Result<ComputeCostResponse, String> {
    if recipe_quantity.is_some() != recipe_unit.is_some() {
        return Err("recipe_quantity and recipe_unit must be given together".to_string());
    }
    if let Some(qty) = recipe_quantity {
        if qty <= 0.0 {
            return Err("recipe_quantity must be greater than 0".to_string());
        }
    }

    let parse = parse_case_description(description);
    let cost = compute_cost(&parse, case_price);

    let ep_cost = match (yield_percent, &cost) {
        (Some(y), Some(c)) => Some(
            c.ep_cost(y)
                .ok_or_else(|| "yield_percent must be greater than 0 and at most 100".to_string())?,
        ),
        _ => None,
    };

    let recipe_cost = match (recipe_quantity, recipe_unit, &cost) {
        (Some(quantity), Some(unit), Some(c)) => Some(RecipeQuantityCost {
            quantity,
            unit: unit.to_string(),
            cost: c.recipe_cost(quantity, unit),
            unit_converted: c.converts_unit(unit),
        }),
        _ => None,
    };

    Ok(ComputeCostResponse {
        parse,
        case_price,
        cost,
        ep_cost,
        recipe_cost,
    })
}
