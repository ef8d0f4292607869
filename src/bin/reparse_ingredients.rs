//! Re-run the case parser over every stored ingredient
//! Usage: cargo run --bin reparse_ingredients -- [--dry-run]
//!
//! Rewrites the parsed case columns and recalculates every recipe cost.

use bohm::config;
use bohm::costing::parse_case_description;
use bohm::models::{recalculate_recipe_cost, Ingredient, Recipe};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    config::init_tracing("bohm=warn")?;

    let dry_run = std::env::args().any(|a| a == "--dry-run");

    let db_path = config::database_path();
    println!("Database: {}", db_path.display());
    if dry_run {
        println!("Dry run: no changes will be written");
    }

    let database = bohm::db::Database::new(&db_path)?;
    database.with_conn(bohm::db::migrations::run_migrations)?;

    database.with_conn_mut(|conn| {
        let tx = conn.transaction()?;

        let items = Ingredient::list_all(&tx)?;
        let mut changed = 0;
        let mut failed = 0;

        for item in &items {
            let parse = parse_case_description(&item.case_description);

            if !parse.is_success() {
                failed += 1;
            }
            if !item.parse_differs(&parse) {
                continue;
            }
            changed += 1;

            match parse.parsed() {
                Some(case) => println!(
                    "  [{}] {}: \"{}\" -> {} {} ({})",
                    item.id,
                    item.name,
                    item.case_description,
                    case.case_quantity,
                    case.case_unit,
                    case.pattern.as_str()
                ),
                None => println!(
                    "  [{}] {}: \"{}\" -> unparsed",
                    item.id, item.name, item.case_description
                ),
            }

            if !dry_run {
                Ingredient::store_parse(&tx, item.id, &parse)?;
            }
        }

        println!(
            "\nIngredients: {} total, {} changed, {} unparsed",
            items.len(),
            changed,
            failed
        );

        if dry_run {
            return Ok(());
        }

        let recipe_ids = Recipe::list_ids(&tx)?;
        for recipe_id in &recipe_ids {
            let costing = recalculate_recipe_cost(&tx, *recipe_id)?;
            if costing.uncosted_lines > 0 {
                println!(
                    "  Recipe {} has {} uncosted line(s)",
                    recipe_id, costing.uncosted_lines
                );
            }
        }
        println!("Recipes recalculated: {}", recipe_ids.len());

        tx.commit()?;
        Ok(())
    })?;

    Ok(())
}
