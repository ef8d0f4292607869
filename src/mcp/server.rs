//! BOHM MCP Server Implementation
//!
//! Implements the MCP server with all BOHM tools.

use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::db::Database;
use crate::models::{
    IngredientCreate, IngredientUpdate, RecipeCreate, RecipeIngredientCreate,
    RecipeIngredientUpdate, RecipeUpdate,
};
use crate::tools::costing;
use crate::tools::ingredients;
use crate::tools::recipes;
use crate::tools::status::StatusTracker;

/// BOHM MCP Service
#[derive(Clone)]
pub struct BohmService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    tool_router: ToolRouter<BohmService>,
}

impl BohmService {
    pub fn new(status_tracker: StatusTracker, database: Database) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(status_tracker)),
            database,
            tool_router: Self::tool_router(),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("Serialization error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn not_found(kind: &str, id: i64) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(format!(
        r#"{{"error": "{} not found", "id": {}}}"#,
        kind, id
    ))]))
}

// ============================================================================
// Costing Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ParseCaseDescriptionParams {
    /// Vendor case description, e.g. "36/1#", "120 count, 50#", "4 gal"
    pub description: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ComputeCostParams {
    /// Vendor case description
    pub description: String,
    /// Price paid for the whole case
    pub case_price: f64,
    /// Quantity used in a recipe (optional, requires recipe_unit)
    pub recipe_quantity: Option<f64>,
    /// Unit of recipe_quantity (optional, requires recipe_quantity)
    pub recipe_unit: Option<String>,
    /// Usable yield percentage for EP cost (optional, 0-100)
    pub yield_percent: Option<f64>,
}

// ============================================================================
// Ingredient Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddIngredientParams {
    /// Ingredient name
    pub name: String,
    /// Vendor or distributor (optional)
    pub vendor: Option<String>,
    /// Category such as Produce, Protein, Dairy (optional)
    pub category: Option<String>,
    /// Case description as printed on the invoice
    pub case_description: String,
    /// Price paid for one case (optional)
    pub case_price: Option<f64>,
    /// Usable yield percentage after trim (default 100)
    #[serde(default = "default_yield")]
    pub yield_percent: f64,
    pub notes: Option<String>,
}

fn default_yield() -> f64 { 100.0 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetIngredientParams {
    /// Ingredient ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListIngredientsParams {
    /// Search query matched against name and vendor (optional)
    pub query: Option<String>,
    /// Sort by: name, vendor, category, case_price, or created_at (default name)
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    /// Sort order: asc or desc (default asc)
    #[serde(default = "default_sort_order")]
    pub sort_order: String,
    /// Maximum results (default 50, max 200)
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    /// Offset for pagination (default 0)
    #[serde(default)]
    pub offset: i64,
}

fn default_sort_by() -> String { "name".to_string() }
fn default_sort_order() -> String { "asc".to_string() }
fn default_list_limit() -> i64 { 50 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateIngredientParams {
    /// Ingredient ID to update
    pub id: i64,
    pub name: Option<String>,
    pub vendor: Option<String>,
    pub category: Option<String>,
    /// New case description (re-parsed)
    pub case_description: Option<String>,
    pub case_price: Option<f64>,
    pub yield_percent: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteIngredientParams {
    /// Ingredient ID to delete
    pub id: i64,
}

// ============================================================================
// Recipe Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct CreateRecipeParams {
    /// Name of the recipe
    pub name: String,
    /// Number of portions this recipe yields (default 1.0)
    #[serde(default = "default_portions")]
    pub portions: f64,
    /// Menu price of one portion (optional)
    pub menu_price: Option<f64>,
    /// Optional notes
    pub notes: Option<String>,
}

fn default_portions() -> f64 { 1.0 }

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetRecipeParams {
    /// Recipe ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListRecipesParams {
    /// Search query for recipe name (optional)
    pub query: Option<String>,
    /// Sort by: name, created_at, menu_price, total_cost, or portion_cost (default name)
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    /// Sort order: asc or desc (default asc)
    #[serde(default = "default_sort_order")]
    pub sort_order: String,
    /// Maximum results (default 50, max 200)
    #[serde(default = "default_list_limit")]
    pub limit: i64,
    /// Offset for pagination (default 0)
    #[serde(default)]
    pub offset: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateRecipeParams {
    /// Recipe ID to update
    pub id: i64,
    /// New name (optional)
    pub name: Option<String>,
    /// New portion count (optional)
    pub portions: Option<f64>,
    /// New menu price (optional)
    pub menu_price: Option<f64>,
    /// New notes (optional)
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteRecipeParams {
    /// Recipe ID to delete
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddRecipeIngredientParams {
    /// Recipe ID to add the line to
    pub recipe_id: i64,
    /// Ingredient ID
    pub ingredient_id: i64,
    /// Quantity used
    pub quantity: f64,
    /// Unit for the quantity; lb and oz convert, other units should match the case unit
    pub unit: String,
    /// Optional notes
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateRecipeIngredientParams {
    /// Recipe line ID
    pub id: i64,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RemoveRecipeIngredientParams {
    /// Recipe line ID to remove
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RecalculateRecipeCostParams {
    /// Recipe ID
    pub recipe_id: i64,
}

// ============================================================================
// Tool Implementations
// ============================================================================

#[tool_router]
impl BohmService {
    // --- Status ---

    #[tool(description = "Get the current status of the BOHM service including build info, database status, inventory counts, and process information")]
    async fn bohm_status(&self) -> Result<CallToolResult, McpError> {
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status(&self.database);
        to_json(&status)
    }

    #[tool(description = "Get instructions for entering case descriptions and costing ingredients and recipes. Call this when starting a costing session or when unsure how case descriptions are read.")]
    fn costing_instructions(&self) -> Result<CallToolResult, McpError> {
        Ok(CallToolResult::success(vec![Content::text(costing::COSTING_INSTRUCTIONS)]))
    }

    // --- Costing ---

    #[tool(description = "Parse a vendor case description (e.g. \"36/1#\", \"120 count, 50#\", \"1/25LB\") into a quantity and unit without saving anything")]
    fn parse_case_description(&self, Parameters(p): Parameters<ParseCaseDescriptionParams>) -> Result<CallToolResult, McpError> {
        to_json(&costing::parse_case(&p.description))
    }

    #[tool(description = "Parse a case description and compute the AP cost per unit, per pound, per ounce, and per each. Optionally costs a recipe quantity and the EP cost for a yield percentage.")]
    fn compute_cost(&self, Parameters(p): Parameters<ComputeCostParams>) -> Result<CallToolResult, McpError> {
        let result = costing::compute_case_costs(
            &p.description,
            p.case_price,
            p.recipe_quantity,
            p.recipe_unit.as_deref(),
            p.yield_percent,
        )
        .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Ingredients ---

    #[tool(description = "Add an ingredient priced by the case. The case description is parsed and the parse result is returned with the derived costs.")]
    fn add_ingredient(&self, Parameters(p): Parameters<AddIngredientParams>) -> Result<CallToolResult, McpError> {
        let data = IngredientCreate {
            name: p.name,
            vendor: p.vendor,
            category: p.category,
            case_description: p.case_description,
            case_price: p.case_price,
            yield_percent: p.yield_percent,
            notes: p.notes,
        };
        let result = ingredients::add_ingredient(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get full details for an ingredient including parsed case, costs, and recipe usage")]
    fn get_ingredient(&self, Parameters(p): Parameters<GetIngredientParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::get_ingredient(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(item) => to_json(&item),
            None => not_found("Ingredient", p.id),
        }
    }

    #[tool(description = "List ingredients with optional search, sorting, and pagination")]
    fn list_ingredients(&self, Parameters(p): Parameters<ListIngredientsParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::list_ingredients(&self.database, p.query.as_deref(), &p.sort_by, &p.sort_order, p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Update an ingredient. A new case description is re-parsed. Automatically recalculates the cost of every recipe using this ingredient.")]
    fn update_ingredient(&self, Parameters(p): Parameters<UpdateIngredientParams>) -> Result<CallToolResult, McpError> {
        let data = IngredientUpdate {
            name: p.name,
            vendor: p.vendor,
            category: p.category,
            case_description: p.case_description,
            case_price: p.case_price,
            yield_percent: p.yield_percent,
            notes: p.notes,
        };
        let result = ingredients::update_ingredient(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Delete an ingredient (only allowed if not used in any recipe)")]
    fn delete_ingredient(&self, Parameters(p): Parameters<DeleteIngredientParams>) -> Result<CallToolResult, McpError> {
        let result = ingredients::delete_ingredient(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Ok(success) => to_json(&success),
            Err(blocked) => to_json(&blocked),
        }
    }

    #[tool(description = "List ingredients whose case description could not be parsed. These have no cost until the description is fixed with update_ingredient.")]
    fn list_unparsed_ingredients(&self) -> Result<CallToolResult, McpError> {
        let result = ingredients::list_unparsed_ingredients(&self.database).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    // --- Recipes ---

    #[tool(description = "Create a new recipe with a portion count and optional menu price")]
    fn create_recipe(&self, Parameters(p): Parameters<CreateRecipeParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeCreate {
            name: p.name,
            portions: p.portions,
            menu_price: p.menu_price,
            notes: p.notes,
        };
        let result = recipes::create_recipe(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Get a recipe with every line costed at current prices, plus total cost, cost per portion, and food cost percentage")]
    fn get_recipe(&self, Parameters(p): Parameters<GetRecipeParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::get_recipe(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(recipe) => to_json(&recipe),
            None => not_found("Recipe", p.id),
        }
    }

    #[tool(description = "List recipes with cached costs, optional search, sorting, and pagination")]
    fn list_recipes(&self, Parameters(p): Parameters<ListRecipesParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::list_recipes(&self.database, p.query.as_deref(), &p.sort_by, &p.sort_order, p.limit, p.offset)
            .map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Update recipe name, portions, menu price, or notes")]
    fn update_recipe(&self, Parameters(p): Parameters<UpdateRecipeParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeUpdate {
            name: p.name,
            portions: p.portions,
            menu_price: p.menu_price,
            notes: p.notes,
        };
        let result = recipes::update_recipe(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Delete a recipe and all of its ingredient lines")]
    fn delete_recipe(&self, Parameters(p): Parameters<DeleteRecipeParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::delete_recipe(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Add an ingredient line to a recipe. Recalculates the recipe cost.")]
    fn add_recipe_ingredient(&self, Parameters(p): Parameters<AddRecipeIngredientParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeIngredientCreate {
            recipe_id: p.recipe_id,
            ingredient_id: p.ingredient_id,
            quantity: p.quantity,
            unit: p.unit,
            notes: p.notes,
        };
        let result = recipes::add_recipe_ingredient(&self.database, data).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Update the quantity, unit, or notes of a recipe line. Recalculates the recipe cost.")]
    fn update_recipe_ingredient(&self, Parameters(p): Parameters<UpdateRecipeIngredientParams>) -> Result<CallToolResult, McpError> {
        let data = RecipeIngredientUpdate {
            quantity: p.quantity,
            unit: p.unit,
            notes: p.notes,
        };
        let result = recipes::update_recipe_ingredient(&self.database, p.id, data).map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(line) => to_json(&line),
            None => not_found("Recipe line", p.id),
        }
    }

    #[tool(description = "Remove a line from a recipe. Recalculates the recipe cost.")]
    fn remove_recipe_ingredient(&self, Parameters(p): Parameters<RemoveRecipeIngredientParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::remove_recipe_ingredient(&self.database, p.id).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }

    #[tool(description = "Force recalculation of a recipe's cached cost from current ingredient prices")]
    fn recalculate_recipe_cost(&self, Parameters(p): Parameters<RecalculateRecipeCostParams>) -> Result<CallToolResult, McpError> {
        let result = recipes::recalculate_cost(&self.database, p.recipe_id).map_err(|e| McpError::internal_error(e, None))?;
        to_json(&result)
    }
}

#[tool_handler]
impl ServerHandler for BohmService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "bohm".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Back-of-House Manager".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Back-of-House Manager (BOHM) - Ingredient case costing and recipe plate costs. \
                 IMPORTANT: Call costing_instructions before entering case descriptions. \
                 Costing: parse_case_description, compute_cost. \
                 Ingredients: add/get/list/update/delete_ingredient, list_unparsed_ingredients. \
                 Recipes: create/get/list/update/delete_recipe, add/update/remove_recipe_ingredient, \
                 recalculate_recipe_cost. \
                 Status: bohm_status."
                    .into(),
            ),
        }
    }
}
