//! Back-of-House Manager (BOHM)
//!
//! An MCP server for ingredient case costing and recipe plate costs.

use rmcp::ServiceExt;
use tokio::io::{stdin, stdout};

use bohm::config;
use bohm::db::{migrations, Database};
use bohm::mcp::BohmService;
use bohm::tools::status::StatusTracker;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    config::init_tracing("bohm=info")?;

    let db_path = config::database_path();
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let database = Database::new(&db_path)?;
    database.with_conn(migrations::run_migrations)?;

    let tracker = StatusTracker::new(db_path);
    eprintln!("{}", tracker.get_status(&database));

    let server = BohmService::new(tracker, database)
        .serve((stdin(), stdout()))
        .await?;
    tracing::info!("BOHM MCP server ready on stdio");

    server.waiting().await?;
    Ok(())
}
