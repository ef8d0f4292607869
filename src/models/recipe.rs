//! Recipe model
//!
//! A recipe with a cached total ingredient cost.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::costing::food_cost_percentage;
use crate::db::{DbError, DbResult};

/// A recipe with cached cost
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    pub id: i64,
    pub name: String,
    pub portions: f64,
    pub menu_price: Option<f64>,
    pub cached_total_cost: f64,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new recipe
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeCreate {
    pub name: String,
    #[serde(default = "default_portions")]
    pub portions: f64,
    pub menu_price: Option<f64>,
    pub notes: Option<String>,
}

fn default_portions() -> f64 {
    1.0
}

/// Data for updating a recipe
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecipeUpdate {
    pub name: Option<String>,
    pub portions: Option<f64>,
    pub menu_price: Option<f64>,
    pub notes: Option<String>,
}

impl Recipe {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            portions: row.get("portions")?,
            menu_price: row.get("menu_price")?,
            cached_total_cost: row.get("cached_total_cost")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Plate cost of a single portion
    pub fn cost_per_portion(&self) -> f64 {
        self.cached_total_cost / self.portions
    }

    pub fn food_cost_percent(&self) -> Option<f64> {
        food_cost_percentage(self.cost_per_portion(), self.menu_price?)
    }

    /// Insert a new recipe into the database
    pub fn create(conn: &Connection, data: &RecipeCreate) -> DbResult<Self> {
        conn.execute(
            r#"
            INSERT INTO recipes (name, portions, menu_price, notes)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![data.name, data.portions, data.menu_price, data.notes],
        )?;

        let id = conn.last_insert_rowid();
        Self::get_by_id(conn, id)?.ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))
    }

    /// Get a recipe by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM recipes WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(recipe) => Ok(Some(recipe)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List recipes with optional name search
    pub fn list(
        conn: &Connection,
        query: Option<&str>,
        sort_by: &str,
        sort_order: &str,
        limit: i64,
        offset: i64,
    ) -> DbResult<Vec<Self>> {
        let order = if sort_order.eq_ignore_ascii_case("desc") { "DESC" } else { "ASC" };
        let sort_col = match sort_by.to_lowercase().as_str() {
            "created_at" => "created_at",
            "menu_price" => "menu_price",
            "total_cost" => "cached_total_cost",
            "portion_cost" => "cached_total_cost / portions",
            _ => "name",
        };

        let recipes = match query {
            Some(q) => {
                let sql = format!(
                    "SELECT * FROM recipes WHERE name LIKE ?1 ORDER BY {} {} LIMIT ?2 OFFSET ?3",
                    sort_col, order
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![format!("%{}%", q), limit, offset], Self::from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let sql = format!(
                    "SELECT * FROM recipes ORDER BY {} {} LIMIT ?1 OFFSET ?2",
                    sort_col, order
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![limit, offset], Self::from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };

        Ok(recipes)
    }

    /// Every recipe ID, in id order
    pub fn list_ids(conn: &Connection) -> DbResult<Vec<i64>> {
        let mut stmt = conn.prepare("SELECT id FROM recipes ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    /// Update recipe metadata
    pub fn update(conn: &Connection, id: i64, data: &RecipeUpdate) -> DbResult<Option<Self>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            updates.push(format!("name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.clone()));
        }
        if let Some(portions) = data.portions {
            updates.push(format!("portions = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(portions));
        }
        if let Some(price) = data.menu_price {
            updates.push(format!("menu_price = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(price));
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
            "UPDATE recipes SET {} WHERE id = ?{}",
            updates.join(", "),
            params_vec.len() + 1
        );

        params_vec.push(Box::new(id));

        let params_refs: Vec<&dyn rusqlite::ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
        conn.execute(&sql, params_refs.as_slice())?;

        Self::get_by_id(conn, id)
    }

    pub fn update_cached_cost(conn: &Connection, id: i64, total_cost: f64) -> DbResult<()> {
        conn.execute(
            "UPDATE recipes SET cached_total_cost = ?1, updated_at = datetime('now') WHERE id = ?2",
            params![total_cost, id],
        )?;
        Ok(())
    }

    pub fn count(conn: &Connection, query: Option<&str>) -> DbResult<i64> {
        let count: i64 = match query {
            Some(q) => conn.query_row(
                "SELECT COUNT(*) FROM recipes WHERE name LIKE ?1",
                [format!("%{}%", q)],
                |row| row.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))?,
        };
        Ok(count)
    }

    /// Delete a recipe; its ingredient lines go with it
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM recipes WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
