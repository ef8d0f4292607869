//! Data models
//!
//! Rust structs representing database entities.

mod ingredient;
mod recipe;
mod recipe_ingredient;

pub use ingredient::{Ingredient, IngredientCreate, IngredientUpdate};
pub use recipe::{Recipe, RecipeCreate, RecipeUpdate};
pub use recipe_ingredient::{
    RecipeCosting, RecipeIngredient, RecipeIngredientCreate, RecipeIngredientUpdate,
    RecipeLineCost, calculate_recipe_cost, cascade_recalculate_from_ingredient,
    recalculate_recipe_cost,
};
