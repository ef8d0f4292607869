//! Ingredient MCP Tools
//!
//! Tools for managing the ingredient inventory.

use serde::Serialize;

use crate::costing::{CaseUnit, CostCalculation, ParseResult};
use crate::db::Database;
use crate::models::{cascade_recalculate_from_ingredient, Ingredient, IngredientCreate, IngredientUpdate};

/// Response for add_ingredient
#[derive(Debug, Serialize)]
pub struct AddIngredientResponse {
    pub id: i64,
    pub name: String,
    pub parse: ParseResult,
    pub cost: Option<CostCalculation>,
    pub created_at: String,
}

/// Summary of an ingredient for list results
#[derive(Debug, Serialize)]
pub struct IngredientSummary {
    pub id: i64,
    pub name: String,
    pub vendor: Option<String>,
    pub case_description: String,
    pub case_price: Option<f64>,
    pub case_unit: Option<CaseUnit>,
    pub ap_cost: Option<f64>,
    pub parsed: bool,
}

impl From<&Ingredient> for IngredientSummary {
    fn from(item: &Ingredient) -> Self {
        Self {
            id: item.id,
            name: item.name.clone(),
            vendor: item.vendor.clone(),
            case_description: item.case_description.clone(),
            case_price: item.case_price,
            case_unit: item.case_unit,
            ap_cost: item.cost().map(|c| c.ap_cost),
            parsed: item.case_quantity.is_some(),
        }
    }
}

/// Full ingredient detail response
#[derive(Debug, Serialize)]
pub struct IngredientDetail {
    #[serde(flatten)]
    pub ingredient: Ingredient,
    pub cost: Option<CostCalculation>,
    pub ep_cost: Option<f64>,
    pub usage_count: i64,
    pub used_in_recipes: Vec<String>,
}

/// Response for list_ingredients
#[derive(Debug, Serialize)]
pub struct ListIngredientsResponse {
    pub items: Vec<IngredientSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for update_ingredient
#[derive(Debug, Serialize)]
pub struct UpdateIngredientResponse {
    pub success: bool,
    pub updated_at: String,
    /// Present when the case description was changed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse: Option<ParseResult>,
    pub cost: Option<CostCalculation>,
    /// Recipe IDs that had their cost recalculated
    pub recipes_updated: Vec<i64>,
}

/// Ingredient whose case description needs attention
#[derive(Debug, Serialize)]
pub struct UnparsedIngredientSummary {
    pub id: i64,
    pub name: String,
    pub case_description: String,
    pub parse_error: Option<String>,
}

/// Response for list_unparsed_ingredients
#[derive(Debug, Serialize)]
pub struct ListUnparsedIngredientsResponse {
    pub items: Vec<UnparsedIngredientSummary>,
    pub count: usize,
}

/// Response for delete_ingredient blocked
#[derive(Debug, Serialize)]
pub struct DeleteIngredientBlockedResponse {
    pub error: String,
    pub usage_count: i64,
    pub used_in_recipes: Vec<String>,
}

/// Response for successful delete_ingredient
#[derive(Debug, Serialize)]
pub struct DeleteIngredientSuccessResponse {
    pub success: bool,
    pub deleted_id: i64,
}

fn validate_price(price: Option<f64>) -> Result<(), String> {
    match price {
        Some(p) if !p.is_finite() || p < 0.0 => Err("case_price cannot be negative".to_string()),
        _ => Ok(()),
    }
}

fn validate_yield(yield_percent: f64) -> Result<(), String> {
    if yield_percent > 0.0 && yield_percent <= 100.0 {
        Ok(())
    } else {
        Err("yield_percent must be greater than 0 and at most 100".to_string())
    }
}

/// Add a new ingredient
pub fn add_ingredient(db: &Database, data: IngredientCreate) -> Result<AddIngredientResponse, String> {
    if data.name.trim().is_empty() {
        return Err("Ingredient name cannot be empty".to_string());
    }
    if data.case_description.trim().is_empty() {
        return Err("case_description cannot be empty".to_string());
    }
    validate_price(data.case_price)?;
    validate_yield(data.yield_percent)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let (item, parse) = Ingredient::create(&conn, &data)
        .map_err(|e| format!("Failed to create ingredient: {}", e))?;

    Ok(AddIngredientResponse {
        id: item.id,
        cost: item.cost(),
        name: item.name,
        parse,
        created_at: item.created_at,
    })
}

/// Get an ingredient with costs and recipe usage
pub fn get_ingredient(db: &Database, id: i64) -> Result<Option<IngredientDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let item = Ingredient::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get ingredient: {}", e))?;

    match item {
        Some(ingredient) => {
            let usage_count = Ingredient::get_usage_count(&conn, id)
                .map_err(|e| format!("Failed to get usage count: {}", e))?;
            let used_in_recipes = Ingredient::get_used_in_recipes(&conn, id)
                .map_err(|e| format!("Failed to get recipe usage: {}", e))?;

            Ok(Some(IngredientDetail {
                cost: ingredient.cost(),
                ep_cost: ingredient.ep_cost(),
                ingredient,
                usage_count,
                used_in_recipes,
            }))
        }
        None => Ok(None),
    }
}

/// List ingredients with optional search, sorting, and pagination
pub fn list_ingredients(
    db: &Database,
    query: Option<&str>,
    sort_by: &str,
    sort_order: &str,
    limit: i64,
    offset: i64,
) -> Result<ListIngredientsResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let items = Ingredient::list(&conn, query, sort_by, sort_order, limit, offset)
        .map_err(|e| format!("Failed to list ingredients: {}", e))?;

    let total = Ingredient::count(&conn, query)
        .map_err(|e| format!("Failed to count ingredients: {}", e))?;

    Ok(ListIngredientsResponse {
        items: items.iter().map(IngredientSummary::from).collect(),
        total,
        limit,
        offset,
    })
}

/// Update an ingredient (recalculates cost for recipes using it)
pub fn update_ingredient(
    db: &Database,
    id: i64,
    data: IngredientUpdate,
) -> Result<UpdateIngredientResponse, String> {
    if let Some(ref name) = data.name {
        if name.trim().is_empty() {
            return Err("Ingredient name cannot be empty".to_string());
        }
    }
    if let Some(ref description) = data.case_description {
        if description.trim().is_empty() {
            return Err("case_description cannot be empty".to_string());
        }
    }
    validate_price(data.case_price)?;
    if let Some(y) = data.yield_percent {
        validate_yield(y)?;
    }

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let updated = Ingredient::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update ingredient: {}", e))?;

    match updated {
        Some((item, parse)) => {
            let recipes_updated = cascade_recalculate_from_ingredient(&conn, id)
                .map_err(|e| format!("Failed to recalculate recipes: {}", e))?;

            Ok(UpdateIngredientResponse {
                success: true,
                cost: item.cost(),
                updated_at: item.updated_at,
                parse,
                recipes_updated,
            })
        }
        None => Err(format!("Ingredient not found with id: {}", id)),
    }
}

/// List ingredients whose case description did not parse
pub fn list_unparsed_ingredients(db: &Database) -> Result<ListUnparsedIngredientsResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let items: Vec<UnparsedIngredientSummary> = Ingredient::list_unparsed(&conn)
        .map_err(|e| format!("Failed to list unparsed ingredients: {}", e))?
        .into_iter()
        .map(|item| UnparsedIngredientSummary {
            id: item.id,
            name: item.name,
            case_description: item.case_description,
            parse_error: item.parse_error,
        })
        .collect();

    let count = items.len();
    Ok(ListUnparsedIngredientsResponse { items, count })
}

/// Delete an ingredient (blocked if used in any recipe)
pub fn delete_ingredient(
    db: &Database,
    id: i64,
) -> Result<Result<DeleteIngredientSuccessResponse, DeleteIngredientBlockedResponse>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let existing = Ingredient::get_by_id(&conn, id)
        .map_err(|e| format!("Database error: {}", e))?;
    if existing.is_none() {
        return Err(format!("Ingredient not found with id: {}", id));
    }

    let usage_count = Ingredient::get_usage_count(&conn, id)
        .map_err(|e| format!("Failed to check usage: {}", e))?;

    if usage_count > 0 {
        let used_in_recipes = Ingredient::get_used_in_recipes(&conn, id)
            .map_err(|e| format!("Failed to get recipe usage: {}", e))?;

        return Ok(Err(DeleteIngredientBlockedResponse {
            error: format!("Cannot delete ingredient: used in {} recipe line(s)", usage_count),
            usage_count,
            used_in_recipes,
        }));
    }

    Ingredient::delete(&conn, id)
        .map_err(|e| format!("Failed to delete ingredient: {}", e))?;

    Ok(Ok(DeleteIngredientSuccessResponse {
        success: true,
        deleted_id: id,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn romaine() -> IngredientCreate {
        IngredientCreate {
            name: "Romaine".to_string(),
            vendor: Some("US Foods".to_string()),
            category: Some("Produce".to_string()),
            case_description: "24 heads".to_string(),
            case_price: Some(36.0),
            yield_percent: 100.0,
            notes: None,
        }
    }

    #[test]
    fn test_add_and_get() {
        let db = Database::open_in_memory().unwrap();
        let added = add_ingredient(&db, romaine()).unwrap();
        assert!(added.parse.is_success());
        assert_eq!(added.cost.as_ref().unwrap().cost_per_each, Some(1.5));

        let detail = get_ingredient(&db, added.id).unwrap().unwrap();
        assert_eq!(detail.ingredient.case_unit, Some(CaseUnit::Heads));
        assert_eq!(detail.usage_count, 0);

        assert!(get_ingredient(&db, 999).unwrap().is_none());
    }

    #[test]
    fn test_add_validation() {
        let db = Database::open_in_memory().unwrap();
        let blank = IngredientCreate {
            name: "  ".to_string(),
            ..romaine()
        };
        assert!(add_ingredient(&db, blank).is_err());

        let negative = IngredientCreate {
            case_price: Some(-1.0),
            ..romaine()
        };
        assert!(add_ingredient(&db, negative).is_err());

        let bad_yield = IngredientCreate {
            yield_percent: 0.0,
            ..romaine()
        };
        assert!(add_ingredient(&db, bad_yield).is_err());
    }

    #[test]
    fn test_unparsed_listing() {
        let db = Database::open_in_memory().unwrap();
        add_ingredient(&db, romaine()).unwrap();
        let odd = IngredientCreate {
            name: "Saffron".to_string(),
            case_description: "tin".to_string(),
            ..romaine()
        };
        let added = add_ingredient(&db, odd).unwrap();
        assert!(!added.parse.is_success());
        assert!(added.cost.is_none());

        let unparsed = list_unparsed_ingredients(&db).unwrap();
        assert_eq!(unparsed.count, 1);
        assert_eq!(unparsed.items[0].name, "Saffron");
    }

    #[test]
    fn test_update_and_delete() {
        let db = Database::open_in_memory().unwrap();
        let added = add_ingredient(&db, romaine()).unwrap();

        let update = IngredientUpdate {
            case_description: Some("12 heads".to_string()),
            ..Default::default()
        };
        let updated = update_ingredient(&db, added.id, update).unwrap();
        assert!(updated.parse.unwrap().is_success());
        assert_eq!(updated.cost.unwrap().cost_per_each, Some(3.0));
        assert!(updated.recipes_updated.is_empty());

        let deleted = delete_ingredient(&db, added.id).unwrap();
        assert!(deleted.is_ok());
        assert!(delete_ingredient(&db, added.id).is_err());
    }

    #[test]
    fn test_list_pagination() {
        let db = Database::open_in_memory().unwrap();
        for name in ["Basil", "Chives", "Dill"] {
            add_ingredient(
                &db,
                IngredientCreate {
                    name: name.to_string(),
                    case_description: "12 bunches".to_string(),
                    ..romaine()
                },
            )
            .unwrap();
        }

        let page = list_ingredients(&db, None, "name", "asc", 2, 1).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].name, "Chives");
    }
}
