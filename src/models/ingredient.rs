//! Ingredient model
//!
//! A purchased item priced by the case. The case description is parsed on
//! every write and the parse outcome is stored next to it.

use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::costing::{compute_case_cost, parse_case_description, CasePattern, CaseUnit, CostCalculation, ParseResult};
use crate::db::{DbError, DbResult};

/// An ingredient in the inventory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: i64,
    pub name: String,
    pub vendor: Option<String>,
    pub category: Option<String>,
    pub case_description: String,
    pub case_price: Option<f64>,
    pub case_quantity: Option<f64>,
    pub case_unit: Option<CaseUnit>,
    pub secondary_quantity: Option<f64>,
    pub secondary_unit: Option<CaseUnit>,
    pub parse_pattern: Option<String>,
    pub parse_warning: Option<String>,
    pub parse_error: Option<String>,
    pub yield_percent: f64,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new ingredient
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientCreate {
    pub name: String,
    pub vendor: Option<String>,
    pub category: Option<String>,
    pub case_description: String,
    pub case_price: Option<f64>,
    #[serde(default = "default_yield")]
    pub yield_percent: f64,
    pub notes: Option<String>,
}

fn default_yield() -> f64 {
    100.0
}

/// Data for updating an ingredient
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngredientUpdate {
    pub name: Option<String>,
    pub vendor: Option<String>,
    pub category: Option<String>,
    pub case_description: Option<String>,
    pub case_price: Option<f64>,
    pub yield_percent: Option<f64>,
    pub notes: Option<String>,
}

impl Ingredient {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let case_unit: Option<String> = row.get("case_unit")?;
        let secondary_unit: Option<String> = row.get("secondary_unit")?;

        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            vendor: row.get("vendor")?,
            category: row.get("category")?,
            case_description: row.get("case_description")?,
            case_price: row.get("case_price")?,
            case_quantity: row.get("case_quantity")?,
            case_unit: case_unit.as_deref().and_then(CaseUnit::from_token),
            secondary_quantity: row.get("secondary_quantity")?,
            secondary_unit: secondary_unit.as_deref().and_then(CaseUnit::from_token),
            parse_pattern: row.get("parse_pattern")?,
            parse_warning: row.get("parse_warning")?,
            parse_error: row.get("parse_error")?,
            yield_percent: row.get("yield_percent")?,
            notes: row.get("notes")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    /// Derived case costs, if the case parsed and has a price
    pub fn cost(&self) -> Option<CostCalculation> {
        compute_case_cost(self.case_quantity?, self.case_unit?, self.case_price?)
    }

    /// Cost per case unit after yield loss
    pub fn ep_cost(&self) -> Option<f64> {
        self.cost()?.ep_cost(self.yield_percent)
    }

    pub fn pattern(&self) -> Option<CasePattern> {
        self.parse_pattern.as_deref().and_then(CasePattern::from_db_str)
    }

    /// Whether storing `parse` would change any parsed case column
    pub fn parse_differs(&self, parse: &ParseResult) -> bool {
        match parse.parsed() {
            Some(case) => {
                self.case_quantity != Some(case.case_quantity)
                    || self.case_unit != Some(case.case_unit)
                    || self.secondary_quantity != case.secondary_quantity
                    || self.secondary_unit != case.secondary_unit
                    || self.pattern() != Some(case.pattern)
                    || self.parse_warning != case.warning
                    || self.parse_error.is_some()
            }
            None => {
                self.case_quantity.is_some()
                    || self.parse_error.as_deref() != parse.error()
            }
        }
    }

    /// Insert a new ingredient, parsing its case description
    ///
    /// The row and its parse outcome are written in one transaction.
    pub fn create(conn: &Connection, data: &IngredientCreate) -> DbResult<(Self, ParseResult)> {
        let tx = conn.unchecked_transaction()?;
        tx.execute(
            r#"
            INSERT INTO ingredients (name, vendor, category, case_description, case_price, yield_percent, notes)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                data.name,
                data.vendor,
                data.category,
                data.case_description,
                data.case_price,
                data.yield_percent,
                data.notes,
            ],
        )?;

        let id = tx.last_insert_rowid();
        let parse = parse_case_description(&data.case_description);
        Self::store_parse(&tx, id, &parse)?;
        tx.commit()?;

        let item = Self::get_by_id(conn, id)?
            .ok_or(DbError::Sqlite(rusqlite::Error::QueryReturnedNoRows))?;
        Ok((item, parse))
    }

    /// Get an ingredient by ID
    pub fn get_by_id(conn: &Connection, id: i64) -> DbResult<Option<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM ingredients WHERE id = ?1")?;

        let result = stmt.query_row([id], Self::from_row);
        match result {
            Ok(item) => Ok(Some(item)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List ingredients with optional name/vendor search
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
            "vendor" => "vendor",
            "category" => "category",
            "case_price" => "case_price",
            "created_at" => "created_at",
            _ => "name",
        };

        let items = match query {
            Some(q) => {
                let sql = format!(
                    "SELECT * FROM ingredients WHERE name LIKE ?1 OR vendor LIKE ?1 ORDER BY {} {} LIMIT ?2 OFFSET ?3",
                    sort_col, order
                );
                let mut stmt = conn.prepare(&sql)?;
                let pattern = format!("%{}%", q);
                let rows = stmt.query_map(params![pattern, limit, offset], Self::from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let sql = format!(
                    "SELECT * FROM ingredients ORDER BY {} {} LIMIT ?1 OFFSET ?2",
                    sort_col, order
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![limit, offset], Self::from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };

        Ok(items)
    }

    /// Every ingredient, in id order
    pub fn list_all(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt = conn.prepare("SELECT * FROM ingredients ORDER BY id")?;
        let items = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Ingredients whose case description did not parse
    pub fn list_unparsed(conn: &Connection) -> DbResult<Vec<Self>> {
        let mut stmt =
            conn.prepare("SELECT * FROM ingredients WHERE case_quantity IS NULL ORDER BY name")?;
        let items = stmt
            .query_map([], Self::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    /// Count ingredients, optionally matching a search query
    pub fn count(conn: &Connection, query: Option<&str>) -> DbResult<i64> {
        let count: i64 = match query {
            Some(q) => conn.query_row(
                "SELECT COUNT(*) FROM ingredients WHERE name LIKE ?1 OR vendor LIKE ?1",
                [format!("%{}%", q)],
                |row| row.get(0),
            )?,
            None => conn.query_row("SELECT COUNT(*) FROM ingredients", [], |row| row.get(0))?,
        };
        Ok(count)
    }

    /// Update an ingredient; a new case description is re-parsed
    ///
    /// Returns the parse outcome only when the description changed.
    pub fn update(
        conn: &Connection,
        id: i64,
        data: &IngredientUpdate,
    ) -> DbResult<Option<(Self, Option<ParseResult>)>> {
        let mut updates = Vec::new();
        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref name) = data.name {
            updates.push(format!("name = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(name.clone()));
        }
        if let Some(ref vendor) = data.vendor {
            updates.push(format!("vendor = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(vendor.clone()));
        }
        if let Some(ref category) = data.category {
            updates.push(format!("category = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(category.clone()));
        }
        if let Some(ref description) = data.case_description {
            updates.push(format!("case_description = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(description.clone()));
        }
        if let Some(price) = data.case_price {
            updates.push(format!("case_price = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(price));
        }
        if let Some(yield_percent) = data.yield_percent {
            updates.push(format!("yield_percent = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(yield_percent));
        }
        if let Some(ref notes) = data.notes {
            updates.push(format!("notes = ?{}", params_vec.len() + 1));
            params_vec.push(Box::new(notes.clone()));
        }

        if Self::get_by_id(conn, id)?.is_none() {
            return Ok(None);
        }

        let tx = conn.unchecked_transaction()?;

        if !updates.is_empty() {
            updates.push("updated_at = datetime('now')".to_string());

            let sql = format!(
                "UPDATE ingredients SET {} WHERE id = ?{}",
                updates.join(", "),
                params_vec.len() + 1
            );
            params_vec.push(Box::new(id));

            let params_refs: Vec<&dyn rusqlite::ToSql> =
                params_vec.iter().map(|p| p.as_ref()).collect();
            tx.execute(&sql, params_refs.as_slice())?;
        }

        let parse = match data.case_description {
            Some(ref description) => {
                let parse = parse_case_description(description);
                Self::store_parse(&tx, id, &parse)?;
                Some(parse)
            }
            None => None,
        };
        tx.commit()?;

        Ok(Self::get_by_id(conn, id)?.map(|item| (item, parse)))
    }

    /// Write a parse outcome into the parsed case columns
    pub fn store_parse(conn: &Connection, id: i64, parse: &ParseResult) -> DbResult<()> {
        match parse {
            ParseResult::Success(case) => conn.execute(
                r#"
                UPDATE ingredients SET
                    case_quantity = ?1,
                    case_unit = ?2,
                    secondary_quantity = ?3,
                    secondary_unit = ?4,
                    parse_pattern = ?5,
                    parse_warning = ?6,
                    parse_error = NULL
                WHERE id = ?7
                "#,
                params![
                    case.case_quantity,
                    case.case_unit.as_str(),
                    case.secondary_quantity,
                    case.secondary_unit.map(|u| u.as_str()),
                    case.pattern.as_str(),
                    case.warning,
                    id,
                ],
            )?,
            ParseResult::Failure(failure) => conn.execute(
                r#"
                UPDATE ingredients SET
                    case_quantity = NULL,
                    case_unit = NULL,
                    secondary_quantity = NULL,
                    secondary_unit = NULL,
                    parse_pattern = NULL,
                    parse_warning = NULL,
                    parse_error = ?1
                WHERE id = ?2
                "#,
                params![failure.error, id],
            )?,
        };
        Ok(())
    }

    /// Number of recipe lines using this ingredient
    pub fn get_usage_count(conn: &Connection, id: i64) -> DbResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM recipe_ingredients WHERE ingredient_id = ?1",
            [id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Names of recipes using this ingredient
    pub fn get_used_in_recipes(conn: &Connection, id: i64) -> DbResult<Vec<String>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT r.name
            FROM recipes r
            INNER JOIN recipe_ingredients ri ON ri.recipe_id = r.id
            WHERE ri.ingredient_id = ?1
            ORDER BY r.name
            "#,
        )?;
        let names = stmt
            .query_map([id], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    /// IDs of recipes whose cost depends on this ingredient
    pub fn get_recipe_ids_using(conn: &Connection, id: i64) -> DbResult<Vec<i64>> {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT recipe_id FROM recipe_ingredients WHERE ingredient_id = ?1 ORDER BY recipe_id",
        )?;
        let ids = stmt
            .query_map([id], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    /// Delete an ingredient
    pub fn delete(conn: &Connection, id: i64) -> DbResult<bool> {
        let rows = conn.execute("DELETE FROM ingredients WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn onions() -> IngredientCreate {
        IngredientCreate {
            name: "Yellow Onions".to_string(),
            vendor: Some("Sysco".to_string()),
            category: Some("Produce".to_string()),
            case_description: "50#".to_string(),
            case_price: Some(25.0),
            yield_percent: 90.0,
            notes: None,
        }
    }

    #[test]
    fn test_create_stores_parsed_case() {
        let conn = setup();
        let (item, parse) = Ingredient::create(&conn, &onions()).unwrap();

        assert!(parse.is_success());
        assert_eq!(item.case_quantity, Some(50.0));
        assert_eq!(item.case_unit, Some(CaseUnit::Lbs));
        assert_eq!(item.pattern(), Some(CasePattern::SimplePound));
        assert!(item.parse_error.is_none());

        let cost = item.cost().unwrap();
        assert!((cost.ap_cost - 0.5).abs() < 1e-9);
        assert!((item.ep_cost().unwrap() - 0.5 / 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_create_with_unparseable_description() {
        let conn = setup();
        let data = IngredientCreate {
            case_description: "one big box".to_string(),
            ..onions()
        };
        let (item, parse) = Ingredient::create(&conn, &data).unwrap();

        assert!(!parse.is_success());
        assert!(item.case_quantity.is_none());
        assert!(item.parse_error.is_some());
        assert!(item.cost().is_none());

        let unparsed = Ingredient::list_unparsed(&conn).unwrap();
        assert_eq!(unparsed.len(), 1);
    }

    #[test]
    fn test_dual_unit_columns() {
        let conn = setup();
        let data = IngredientCreate {
            name: "Russet Potatoes".to_string(),
            case_description: "120 count, 50#".to_string(),
            ..onions()
        };
        let (item, _) = Ingredient::create(&conn, &data).unwrap();
        assert_eq!(item.case_unit, Some(CaseUnit::Each));
        assert_eq!(item.secondary_quantity, Some(50.0));
        assert_eq!(item.secondary_unit, Some(CaseUnit::Lbs));
    }

    #[test]
    fn test_update_reparses_description() {
        let conn = setup();
        let (item, _) = Ingredient::create(&conn, &onions()).unwrap();

        let update = IngredientUpdate {
            case_description: Some("36/1#".to_string()),
            case_price: Some(72.0),
            ..Default::default()
        };
        let (updated, parse) = Ingredient::update(&conn, item.id, &update).unwrap().unwrap();
        assert!(parse.unwrap().is_success());
        assert_eq!(updated.case_quantity, Some(36.0));
        assert_eq!(updated.pattern(), Some(CasePattern::SlashPound));
        assert!((updated.cost().unwrap().ap_cost - 2.0).abs() < 1e-9);

        let price_only = IngredientUpdate {
            case_price: Some(36.0),
            ..Default::default()
        };
        let (_, parse) = Ingredient::update(&conn, item.id, &price_only).unwrap().unwrap();
        assert!(parse.is_none());
    }

    #[test]
    fn test_create_rolls_back_when_parse_cannot_be_stored() {
        let conn = setup();
        conn.execute_batch(
            r#"
            CREATE TRIGGER block_parse BEFORE UPDATE OF case_quantity ON ingredients
            BEGIN SELECT RAISE(ABORT, 'parse columns locked'); END;
            "#,
        )
        .unwrap();

        assert!(Ingredient::create(&conn, &onions()).is_err());
        assert_eq!(Ingredient::count(&conn, None).unwrap(), 0);
    }

    #[test]
    fn test_parse_differs() {
        let conn = setup();
        let data = IngredientCreate {
            case_description: "120 count, 50#".to_string(),
            ..onions()
        };
        let (item, parse) = Ingredient::create(&conn, &data).unwrap();
        assert!(!item.parse_differs(&parse));

        let mut relabeled = item.clone();
        relabeled.secondary_unit = Some(CaseUnit::Oz);
        assert!(relabeled.parse_differs(&parse));

        let mut warned = item.clone();
        warned.parse_warning = Some("guessed".to_string());
        assert!(warned.parse_differs(&parse));

        assert!(item.parse_differs(&parse_case_description("no numbers here")));
    }

    #[test]
    fn test_update_missing_ingredient() {
        let conn = setup();
        let update = IngredientUpdate {
            name: Some("Ghost".to_string()),
            ..Default::default()
        };
        assert!(Ingredient::update(&conn, 999, &update).unwrap().is_none());
    }

    #[test]
    fn test_list_and_count() {
        let conn = setup();
        Ingredient::create(&conn, &onions()).unwrap();
        Ingredient::create(
            &conn,
            &IngredientCreate {
                name: "Romaine".to_string(),
                vendor: Some("US Foods".to_string()),
                case_description: "24 heads".to_string(),
                ..onions()
            },
        )
        .unwrap();

        let all = Ingredient::list(&conn, None, "name", "asc", 50, 0).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Romaine");

        let sysco = Ingredient::list(&conn, Some("Sysco"), "name", "asc", 50, 0).unwrap();
        assert_eq!(sysco.len(), 1);
        assert_eq!(Ingredient::count(&conn, Some("Sysco")).unwrap(), 1);
        assert_eq!(Ingredient::count(&conn, None).unwrap(), 2);
    }
}
