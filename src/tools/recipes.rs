//! Recipe MCP Tools
//!
//! Tools for managing recipes and their ingredient lines. Every change to a
//! line recalculates the recipe's cached cost.

use serde::Serialize;

use crate::db::Database;
use crate::models::{
    calculate_recipe_cost, recalculate_recipe_cost, Ingredient, Recipe, RecipeCreate,
    RecipeIngredient, RecipeIngredientCreate, RecipeIngredientUpdate, RecipeLineCost, RecipeUpdate,
};

/// Response for create_recipe
#[derive(Debug, Serialize)]
pub struct CreateRecipeResponse {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

/// Full recipe detail with costed lines
#[derive(Debug, Serialize)]
pub struct RecipeDetail {
    pub id: i64,
    pub name: String,
    pub portions: f64,
    pub menu_price: Option<f64>,
    pub lines: Vec<RecipeLineCost>,
    pub total_cost: f64,
    pub cost_per_portion: f64,
    pub food_cost_percent: Option<f64>,
    /// Lines whose ingredient has no usable case price
    pub uncosted_lines: usize,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Recipe summary for listing
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub id: i64,
    pub name: String,
    pub portions: f64,
    pub menu_price: Option<f64>,
    pub total_cost: f64,
    pub cost_per_portion: f64,
    pub food_cost_percent: Option<f64>,
}

impl From<&Recipe> for RecipeSummary {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id,
            name: recipe.name.clone(),
            portions: recipe.portions,
            menu_price: recipe.menu_price,
            total_cost: recipe.cached_total_cost,
            cost_per_portion: recipe.cost_per_portion(),
            food_cost_percent: recipe.food_cost_percent(),
        }
    }
}

/// Response for list_recipes
#[derive(Debug, Serialize)]
pub struct ListRecipesResponse {
    pub recipes: Vec<RecipeSummary>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Response for update_recipe
#[derive(Debug, Serialize)]
pub struct UpdateRecipeResponse {
    pub success: bool,
    pub updated_at: String,
    pub cost_per_portion: f64,
    pub food_cost_percent: Option<f64>,
}

/// Response for successful delete
#[derive(Debug, Serialize)]
pub struct DeleteRecipeResponse {
    pub success: bool,
    pub deleted_id: i64,
}

/// Response for add_recipe_ingredient and update_recipe_ingredient
#[derive(Debug, Serialize)]
pub struct RecipeLineResponse {
    pub line: RecipeLineCost,
    pub recipe_id: i64,
    pub recipe_total_cost: f64,
}

/// Response for remove_recipe_ingredient
#[derive(Debug, Serialize)]
pub struct RemoveRecipeIngredientResponse {
    pub success: bool,
    pub recipe_id: i64,
    pub recipe_total_cost: f64,
}

/// Response for recalculate_recipe_cost
#[derive(Debug, Serialize)]
pub struct RecalculateCostResponse {
    pub recipe_id: i64,
    pub total_cost: f64,
    pub cost_per_portion: f64,
    pub uncosted_lines: usize,
}

fn validate_portions(portions: f64) -> Result<(), String> {
    if portions.is_finite() && portions > 0.0 {
        Ok(())
    } else {
        Err("portions must be greater than 0".to_string())
    }
}

fn validate_menu_price(menu_price: Option<f64>) -> Result<(), String> {
    match menu_price {
        Some(p) if !p.is_finite() || p < 0.0 => Err("menu_price cannot be negative".to_string()),
        _ => Ok(()),
    }
}

fn validate_line(quantity: Option<f64>, unit: Option<&str>) -> Result<(), String> {
    if let Some(qty) = quantity {
        if !qty.is_finite() || qty <= 0.0 {
            return Err("quantity must be greater than 0".to_string());
        }
    }
    if let Some(unit) = unit {
        if unit.trim().is_empty() {
            return Err("unit cannot be empty".to_string());
        }
    }
    Ok(())
}

// ============================================================================
// Recipe Tools
// ============================================================================

/// Create a new recipe
pub fn create_recipe(db: &Database, data: RecipeCreate) -> Result<CreateRecipeResponse, String> {
    if data.name.trim().is_empty() {
        return Err("Recipe name cannot be empty".to_string());
    }
    validate_portions(data.portions)?;
    validate_menu_price(data.menu_price)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::create(&conn, &data)
        .map_err(|e| format!("Failed to create recipe: {}", e))?;

    Ok(CreateRecipeResponse {
        id: recipe.id,
        name: recipe.name,
        created_at: recipe.created_at,
    })
}

/// Get a recipe with every line costed against current prices
pub fn get_recipe(db: &Database, id: i64) -> Result<Option<RecipeDetail>, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get recipe: {}", e))?;

    match recipe {
        Some(recipe) => {
            let costing = calculate_recipe_cost(&conn, id)
                .map_err(|e| format!("Failed to cost recipe: {}", e))?;

            let cost_per_portion = costing.total_cost / recipe.portions;
            let food_cost_percent = recipe
                .menu_price
                .and_then(|price| crate::costing::food_cost_percentage(cost_per_portion, price));

            Ok(Some(RecipeDetail {
                id: recipe.id,
                name: recipe.name,
                portions: recipe.portions,
                menu_price: recipe.menu_price,
                lines: costing.lines,
                total_cost: costing.total_cost,
                cost_per_portion,
                food_cost_percent,
                uncosted_lines: costing.uncosted_lines,
                notes: recipe.notes,
                created_at: recipe.created_at,
                updated_at: recipe.updated_at,
            }))
        }
        None => Ok(None),
    }
}

/// List recipes with cached costs
pub fn list_recipes(
    db: &Database,
    query: Option<&str>,
    sort_by: &str,
    sort_order: &str,
    limit: i64,
    offset: i64,
) -> Result<ListRecipesResponse, String> {
    let limit = limit.clamp(1, 200);
    let offset = offset.max(0);

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipes = Recipe::list(&conn, query, sort_by, sort_order, limit, offset)
        .map_err(|e| format!("Failed to list recipes: {}", e))?;

    let total = Recipe::count(&conn, query)
        .map_err(|e| format!("Failed to count recipes: {}", e))?;

    Ok(ListRecipesResponse {
        recipes: recipes.iter().map(RecipeSummary::from).collect(),
        total,
        limit,
        offset,
    })
}

/// Update recipe metadata
pub fn update_recipe(
    db: &Database,
    id: i64,
    data: RecipeUpdate,
) -> Result<UpdateRecipeResponse, String> {
    if let Some(ref name) = data.name {
        if name.trim().is_empty() {
            return Err("Recipe name cannot be empty".to_string());
        }
    }
    if let Some(portions) = data.portions {
        validate_portions(portions)?;
    }
    validate_menu_price(data.menu_price)?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let updated = Recipe::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update recipe: {}", e))?;

    match updated {
        Some(recipe) => Ok(UpdateRecipeResponse {
            success: true,
            cost_per_portion: recipe.cost_per_portion(),
            food_cost_percent: recipe.food_cost_percent(),
            updated_at: recipe.updated_at,
        }),
        None => Err(format!("Recipe not found with id: {}", id)),
    }
}

/// Delete a recipe and its lines
pub fn delete_recipe(db: &Database, id: i64) -> Result<DeleteRecipeResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let deleted = Recipe::delete(&conn, id)
        .map_err(|e| format!("Failed to delete recipe: {}", e))?;

    if !deleted {
        return Err(format!("Recipe not found with id: {}", id));
    }

    Ok(DeleteRecipeResponse {
        success: true,
        deleted_id: id,
    })
}

/// Force recalculation of a recipe's cached cost
pub fn recalculate_cost(db: &Database, recipe_id: i64) -> Result<RecalculateCostResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::get_by_id(&conn, recipe_id)
        .map_err(|e| format!("Database error: {}", e))?
        .ok_or_else(|| format!("Recipe not found with id: {}", recipe_id))?;

    let costing = recalculate_recipe_cost(&conn, recipe_id)
        .map_err(|e| format!("Failed to recalculate cost: {}", e))?;

    Ok(RecalculateCostResponse {
        recipe_id,
        total_cost: costing.total_cost,
        cost_per_portion: costing.total_cost / recipe.portions,
        uncosted_lines: costing.uncosted_lines,
    })
}

// ============================================================================
// Recipe Ingredient Tools
// ============================================================================

/// Add an ingredient line to a recipe
pub fn add_recipe_ingredient(
    db: &Database,
    data: RecipeIngredientCreate,
) -> Result<RecipeLineResponse, String> {
    validate_line(Some(data.quantity), Some(&data.unit))?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let recipe = Recipe::get_by_id(&conn, data.recipe_id)
        .map_err(|e| format!("Database error checking recipe: {}", e))?;
    if recipe.is_none() {
        return Err(format!("Recipe not found with id: {}", data.recipe_id));
    }

    let ingredient = Ingredient::get_by_id(&conn, data.ingredient_id)
        .map_err(|e| format!("Database error checking ingredient: {}", e))?
        .ok_or_else(|| format!("Ingredient not found with id: {}", data.ingredient_id))?;

    let existing = RecipeIngredient::get_for_recipe(&conn, data.recipe_id)
        .map_err(|e| format!("Database error checking existing lines: {}", e))?;
    if existing.iter().any(|l| l.ingredient_id == data.ingredient_id) {
        return Err(format!(
            "Ingredient {} is already in recipe {}. Use update_recipe_ingredient to change the quantity.",
            data.ingredient_id, data.recipe_id
        ));
    }

    let line = RecipeIngredient::create(&conn, &data)
        .map_err(|e| format!("Failed to add ingredient: {}", e))?;

    let costing = recalculate_recipe_cost(&conn, data.recipe_id)
        .map_err(|e| format!("Failed to recalculate cost: {}", e))?;

    Ok(RecipeLineResponse {
        line: line.cost_against(&ingredient),
        recipe_id: data.recipe_id,
        recipe_total_cost: costing.total_cost,
    })
}

/// Update a recipe line
pub fn update_recipe_ingredient(
    db: &Database,
    id: i64,
    data: RecipeIngredientUpdate,
) -> Result<Option<RecipeLineResponse>, String> {
    validate_line(data.quantity, data.unit.as_deref())?;

    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let updated = RecipeIngredient::update(&conn, id, &data)
        .map_err(|e| format!("Failed to update line: {}", e))?;

    let line = match updated {
        Some(line) => line,
        None => return Ok(None),
    };

    let ingredient = Ingredient::get_by_id(&conn, line.ingredient_id)
        .map_err(|e| format!("Failed to get ingredient: {}", e))?
        .ok_or_else(|| format!("Ingredient not found with id: {}", line.ingredient_id))?;

    let costing = recalculate_recipe_cost(&conn, line.recipe_id)
        .map_err(|e| format!("Failed to recalculate cost: {}", e))?;

    Ok(Some(RecipeLineResponse {
        line: line.cost_against(&ingredient),
        recipe_id: line.recipe_id,
        recipe_total_cost: costing.total_cost,
    }))
}

/// Remove a line from a recipe
pub fn remove_recipe_ingredient(
    db: &Database,
    id: i64,
) -> Result<RemoveRecipeIngredientResponse, String> {
    let conn = db.get_conn().map_err(|e| format!("Database error: {}", e))?;

    let line = RecipeIngredient::get_by_id(&conn, id)
        .map_err(|e| format!("Failed to get line: {}", e))?
        .ok_or_else(|| format!("Recipe line not found with id: {}", id))?;

    RecipeIngredient::delete(&conn, id)
        .map_err(|e| format!("Failed to remove line: {}", e))?;

    let costing = recalculate_recipe_cost(&conn, line.recipe_id)
        .map_err(|e| format!("Failed to recalculate cost: {}", e))?;

    Ok(RemoveRecipeIngredientResponse {
        success: true,
        recipe_id: line.recipe_id,
        recipe_total_cost: costing.total_cost,
    })
}
