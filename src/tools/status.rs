//! Status tool for BOHM
//!
//! Provides runtime status information about the BOHM service.

use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sysinfo::{Pid, ProcessesToUpdate, System};

use crate::build_info::{BUILD_PROFILE, BUILD_TIMESTAMP, VERSION};
use crate::db::migrations::{get_schema_version, needs_migration};
use crate::db::{Database, DbResult};
use crate::models::{Ingredient, Recipe};

/// Runtime status of the BOHM service
#[derive(Debug, Clone, Serialize)]
pub struct BohmStatus {
    /// Build information
    pub version: &'static str,
    pub build_timestamp: &'static str,
    pub build_profile: &'static str,

    /// Database information
    pub database_path: String,
    pub database_size_bytes: Option<u64>,
    pub schema_version: Option<i32>,
    pub needs_migration: Option<bool>,

    /// Inventory counts, absent if the database could not be read
    pub ingredient_count: Option<i64>,
    pub unparsed_ingredient_count: Option<i64>,
    pub recipe_count: Option<i64>,

    /// Process information
    pub started_at: String,
    pub uptime_seconds: u64,
    pub process_id: u32,
    pub memory_usage_bytes: u64,
}

struct DatabaseCounts {
    schema_version: i32,
    needs_migration: bool,
    ingredients: i64,
    unparsed: i64,
    recipes: i64,
}

/// Status tracker for collecting runtime information
pub struct StatusTracker {
    start_time: Instant,
    started_at: DateTime<Utc>,
    database_path: PathBuf,
}

impl StatusTracker {
    /// Create a new status tracker
    pub fn new(database_path: PathBuf) -> Self {
        Self {
            start_time: Instant::now(),
            started_at: Utc::now(),
            database_path,
        }
    }

    fn database_counts(db: &Database) -> DbResult<DatabaseCounts> {
        db.with_conn(|conn| {
            Ok(DatabaseCounts {
                schema_version: get_schema_version(conn)?,
                needs_migration: needs_migration(conn)?,
                ingredients: Ingredient::count(conn, None)?,
                unparsed: Ingredient::list_unparsed(conn)?.len() as i64,
                recipes: Recipe::count(conn, None)?,
            })
        })
    }

    /// Get the current status
    pub fn get_status(&self, db: &Database) -> BohmStatus {
        let database_size_bytes = std::fs::metadata(&self.database_path)
            .ok()
            .map(|m| m.len());

        let counts = match Self::database_counts(db) {
            Ok(counts) => Some(counts),
            Err(e) => {
                tracing::warn!("Status could not read database: {}", e);
                None
            }
        };

        let pid = std::process::id();
        let mut sys = System::new();
        sys.refresh_processes(ProcessesToUpdate::Some(&[Pid::from_u32(pid)]));

        let memory_usage_bytes = sys
            .process(Pid::from_u32(pid))
            .map(|p| p.memory())
            .unwrap_or(0);

        BohmStatus {
            version: VERSION,
            build_timestamp: BUILD_TIMESTAMP,
            build_profile: BUILD_PROFILE,
            database_path: self.database_path.display().to_string(),
            database_size_bytes,
            schema_version: counts.as_ref().map(|c| c.schema_version),
            needs_migration: counts.as_ref().map(|c| c.needs_migration),
            ingredient_count: counts.as_ref().map(|c| c.ingredients),
            unparsed_ingredient_count: counts.as_ref().map(|c| c.unparsed),
            recipe_count: counts.as_ref().map(|c| c.recipes),
            started_at: self.started_at.to_rfc3339(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            process_id: pid,
            memory_usage_bytes,
        }
    }
}

/// Startup banner written to stderr
impl fmt::Display for BohmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "===============================================")?;
        writeln!(f, "  Back-of-House Manager (BOHM) v{}", self.version)?;
        writeln!(
            f,
            "  Compiled: {} ({})",
            self.build_timestamp, self.build_profile
        )?;
        writeln!(f, "  Database: {}", self.database_path)?;
        match (self.schema_version, self.needs_migration) {
            (Some(v), Some(true)) => writeln!(f, "  Schema: v{} (migration pending)", v)?,
            (Some(v), _) => writeln!(f, "  Schema: v{}", v)?,
            _ => writeln!(f, "  Schema: unavailable")?,
        }
        if let (Some(ingredients), Some(unparsed), Some(recipes)) = (
            self.ingredient_count,
            self.unparsed_ingredient_count,
            self.recipe_count,
        ) {
            writeln!(
                f,
                "  Ingredients: {} ({} unparsed) | Recipes: {}",
                ingredients, unparsed, recipes
            )?;
        }
        write!(f, "===============================================")
    }
}
