//! Recipe Ingredient model
//!
//! Lines linking an ingredient to a recipe with a quantity and unit, and the
//! costing that rolls them up into a recipe total.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::costing::CaseUnit;
use crate::db::{DbError, DbResult};
use super::{Ingredient, Recipe};

/// A recipe line linking an ingredient to a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredient {
    pub id: i64,
    pub recipe_id: i64,
    pub ingredient_id: i64,
    pub quantity: f64,
    pub unit: String,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for adding an ingredient to a recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeIngredientCreate {
    pub recipe_id: i64,
    pub ingredient_id: i64,
    pub quantity: f64,
    pub unit: String,
    pub notes: Option<String>,
}

/// Data for updating a recipe line
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeIngredientUpdate {
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub notes: Option<String>,
}

/// Costed recipe line
#[derive(Debug, Clone, Serialize)]
pub struct RecipeLineCost {
    pub id: i64,
    pub ingredient_id: i64,
    pub ingredient_name: String,
    pub quantity: f64,
    pub unit: String,
    pub ap_cost: Option<f64>,
    pub ap_unit: Option<CaseUnit>,
    pub yield_percent: f64,
    /// None when the ingredient has no usable case price
    pub line_cost: Option<f64>,
    /// False when the line unit was assumed to match the case unit
    pub unit_converted: bool,
    pub notes: Option<String>,
}

/// Cost roll-up of a whole recipe
#[derive(Debug, Clone, Serialize)]
pub struct RecipeCosting {
    pub recipe_id: i64,
    pub lines: Vec<RecipeLineCost>,
    pub total_cost: f64,
    pub uncosted_lines: usize,
}

impl RecipeIngredient {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            recipe_id: row.get("recipe_id")?,
            ingredient_id: row.get("ingredient_id")?,
            quantity: row.get("quantity")?,
            unit: row.get("unit")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Add an ingredient to a recipe
    pub fn create(conn: &Connection, data: &RecipeIngredientCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO recipe_ingredients (recipe_id, ingredient_id, quantity, unit, notes)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                data.recipe_id,
                data.ingredient_id,
                data.quantity,
                data.unit,
                data.notes,
            ],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM recipe_ingredients WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get all lines of a recipe
    pub fn get_for_recipe(conn: &Connection, recipe_id: i64) -> DbResult<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM recipe_ingredients WHERE recipe_id = ?1 ORDER BY id")?;

        let lines = stmt
            .query_map([recipe_id], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(lines)
    }

    /// Update a line
    pub fn update(conn: &Connection, id: i64, data: &RecipeIngredientUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(qty) = data.quantity {
            updates.push(format!("quantity = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(qty));
        }
        if let Some(ref unit) = data.unit {
            updates.push(format!("unit = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(unit.clone()));
        }
        if let Some(ref notes) = data.notes {
            updates.push(format!("notes = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(notes.clone()));
        }

        if updates.is_empty() {
            return Self::get_by_id(conn, id);
        }

        updates.push("updated_at = datetime('now')".to_string());

        let sql = format!(
            "UPDATE recipe_ingredients SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM recipe_ingredients WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    /// Cost this line against its ingredient's current case price
    pub fn cost_against(&self, ingredient: &Ingredient) -> RecipeLineCost {
        let calc = ingredient.cost();

        let line_cost = calc.as_ref().map(|c| {
            c.recipe_cost(self.quantity, &self.unit) / (ingredient.yield_percent / 100.0)
        });
        let unit_converted = calc.as_ref().is_some_and(|c| c.converts_unit(&self.unit));

        RecipeLineCost {
            id: self.id,
            ingredient_id: self.ingredient_id,
            ingredient_name: ingredient.name.clone(),
            quantity: self.quantity,
            unit: self.unit.clone(),
            ap_cost: calc.as_ref().map(|c| c.ap_cost),
            ap_unit: calc.as_ref().map(|c| c.ap_unit),
            yield_percent: ingredient.yield_percent,
            line_cost,
            unit_converted,
            notes: self.notes.clone(),
        }
    }
}

/// Cost every line of a recipe
pub fn calculate_recipe_cost(conn: &Connection, recipe_id: i64) -> DbResult<RecipeCosting> {
    let lines = RecipeIngredient::get_for_recipe(conn, recipe_id)?;

    let mut costed = Vec::with_capacity(lines.len());
    for line in lines {
        let ingredient = Ingredient::get_by_id(conn, line.ingredient_id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))?;
        costed.push(line.cost_against(&ingredient));
    }

    let total_cost = costed.iter().filter_map(|l| l.line_cost).sum();
    let uncosted_lines = costed.iter().filter(|l| l.line_cost.is_none()).count();

    Ok(RecipeCosting {
        recipe_id,
        lines: costed,
        total_cost,
        uncosted_lines,
    })
}

/// Recalculate and update the cached cost for a recipe
pub fn recalculate_recipe_cost(conn: &Connection, recipe_id: i64) -> DbResult<RecipeCosting> {
    let costing = calculate_recipe_cost(conn, recipe_id)?;
    Recipe::update_cached_cost(conn, recipe_id, costing.total_cost)?;
    Ok(costing)
}

/// Recalculate every recipe using an ingredient, returning their IDs
pub fn cascade_recalculate_from_ingredient(conn: &Connection, ingredient_id: i64) -> DbResult<Vec<i64>> {
    let recipe_ids = Ingredient::get_recipe_ids_using(conn, ingredient_id)?;
    for recipe_id in &recipe_ids {
        recalculate_recipe_cost(conn, *recipe_id)?;
    }
    Ok(recipe_ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::models::{IngredientCreate, IngredientUpdate, RecipeCreate};

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn ingredient(conn: &Connection, name: &str, description: &str, price: f64) -> Ingredient {
        let data = IngredientCreate {
            name: name.to_string(),
            vendor: None,
            category: None,
            case_description: description.to_string(),
            case_price: Some(price),
            yield_percent: 100.0,
            notes: None,
        };
        Ingredient::create(conn, &data).unwrap().0
    }

    fn recipe(conn: &Connection, portions: f64, menu_price: Option<f64>) -> Recipe {
        let data = RecipeCreate {
            name: "Burger".to_string(),
            portions,
            menu_price,
            notes: None,
        };
        Recipe::create(conn, &data).unwrap()
    }

    fn add_line(conn: &Connection, recipe_id: i64, ingredient_id: i64, quantity: f64, unit: &str) -> RecipeIngredient {
        let data = RecipeIngredientCreate {
            recipe_id,
            ingredient_id,
            quantity,
            unit: unit.to_string(),
            notes: None,
        };
        RecipeIngredient::create(conn, &data).unwrap()
    }

    #[test]
    fn test_recipe_total_is_sum_of_lines() {
        let conn = setup();
        // $5.00/lb beef, $0.50 each bun
        let beef = ingredient(&conn, "Ground Beef", "10#", 50.0);
        let buns = ingredient(&conn, "Buns", "48 each", 24.0);
        let r = recipe(&conn, 4.0, Some(12.0));

        add_line(&conn, r.id, beef.id, 16.0, "oz");
        add_line(&conn, r.id, buns.id, 4.0, "each");

        let costing = recalculate_recipe_cost(&conn, r.id).unwrap();
        assert_eq!(costing.lines.len(), 2);
        assert!((costing.lines[0].line_cost.unwrap() - 5.0).abs() < 1e-9);
        assert!(costing.lines[0].unit_converted);
        assert!((costing.lines[1].line_cost.unwrap() - 2.0).abs() < 1e-9);
        assert!((costing.total_cost - 7.0).abs() < 1e-9);
        assert_eq!(costing.uncosted_lines, 0);

        let r = Recipe::get_by_id(&conn, r.id).unwrap().unwrap();
        assert!((r.cached_total_cost - 7.0).abs() < 1e-9);
        assert!((r.cost_per_portion() - 1.75).abs() < 1e-9);
        assert!((r.food_cost_percent().unwrap() - 1.75 / 12.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_yield_raises_line_cost() {
        let conn = setup();
        let onions = ingredient(&conn, "Onions", "50#", 25.0);
        Ingredient::update(
            &conn,
            onions.id,
            &IngredientUpdate {
                yield_percent: Some(50.0),
                ..Default::default()
            },
        )
        .unwrap();
        let r = recipe(&conn, 1.0, None);
        add_line(&conn, r.id, onions.id, 2.0, "lb");

        let costing = calculate_recipe_cost(&conn, r.id).unwrap();
        assert!((costing.total_cost - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_unpriced_ingredient_is_uncosted() {
        let conn = setup();
        let mystery = ingredient(&conn, "Mystery", "a box", 10.0);
        let r = recipe(&conn, 1.0, None);
        add_line(&conn, r.id, mystery.id, 1.0, "each");

        let costing = calculate_recipe_cost(&conn, r.id).unwrap();
        assert_eq!(costing.uncosted_lines, 1);
        assert_eq!(costing.total_cost, 0.0);
        assert!(costing.lines[0].line_cost.is_none());
    }

    #[test]
    fn test_price_change_cascades() {
        let conn = setup();
        let beef = ingredient(&conn, "Ground Beef", "10#", 50.0);
        let r = recipe(&conn, 1.0, None);
        add_line(&conn, r.id, beef.id, 1.0, "lb");
        recalculate_recipe_cost(&conn, r.id).unwrap();

        Ingredient::update(
            &conn,
            beef.id,
            &IngredientUpdate {
                case_price: Some(80.0),
                ..Default::default()
            },
        )
        .unwrap();
        let updated = cascade_recalculate_from_ingredient(&conn, beef.id).unwrap();
        assert_eq!(updated, vec![r.id]);

        let r = Recipe::get_by_id(&conn, r.id).unwrap().unwrap();
        assert!((r.cached_total_cost - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_ingredient_in_use_cannot_be_deleted() {
        let conn = setup();
        let beef = ingredient(&conn, "Ground Beef", "10#", 50.0);
        let r = recipe(&conn, 1.0, None);
        add_line(&conn, r.id, beef.id, 1.0, "lb");

        assert_eq!(Ingredient::get_usage_count(&conn, beef.id).unwrap(), 1);
        assert!(Ingredient::delete(&conn, beef.id).is_err());

        // Deleting the recipe removes its lines and frees the ingredient
        assert!(Recipe::delete(&conn, r.id).unwrap());
        assert_eq!(Ingredient::get_usage_count(&conn, beef.id).unwrap(), 0);
        assert!(Ingredient::delete(&conn, beef.id).unwrap());
    }

    #[test]
    fn test_update_line() {
        let conn = setup();
        let beef = ingredient(&conn, "Ground Beef", "10#", 50.0);
        let r = recipe(&conn, 1.0, None);
        let line = add_line(&conn, r.id, beef.id, 1.0, "lb");

        let update = RecipeIngredientUpdate {
            quantity: Some(4.0),
            unit: Some("oz".to_string()),
            notes: None,
        };
        let line = RecipeIngredient::update(&conn, line.id, &update).unwrap().unwrap();
        assert_eq!(line.quantity, 4.0);

        let costing = calculate_recipe_cost(&conn, r.id).unwrap();
        assert!((costing.total_cost - 1.25).abs() < 1e-9);
    }
}
