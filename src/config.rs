//! Process configuration: database location and log filtering.
//!
//! `BOHM_DATABASE_PATH` overrides the database file. Without it the database
//! lives in `data/bohm.db` beside the executable, or at the project root when
//! the executable sits in `target/debug` or `target/release`. `RUST_LOG`
//! adds to the default log directive.

use std::path::{Path, PathBuf};

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

pub const DATABASE_PATH_VAR: &str = "BOHM_DATABASE_PATH";

/// Resolve the database path from the environment or the executable location
pub fn database_path() -> PathBuf {
    match std::env::var_os(DATABASE_PATH_VAR) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => default_database_path(std::env::current_exe().ok().as_deref()),
    }
}

pub fn default_database_path(exe: Option<&Path>) -> PathBuf {
    let dir = exe.and_then(Path::parent).unwrap_or_else(|| Path::new("."));
    let root = if dir.ends_with("debug") || dir.ends_with("release") {
        dir.parent().and_then(Path::parent).unwrap_or(dir)
    } else {
        dir
    };
    root.join("data").join("bohm.db")
}

/// Install the stderr subscriber. stdout is reserved for the MCP transport.
pub fn init_tracing(default_directive: &str) -> Result<(), ParseError> {
    let filter = EnvFilter::from_default_env().add_directive(default_directive.parse()?);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_path_from_cargo_target() {
        let exe = Path::new("/srv/bohm/target/release/bohm");
        assert_eq!(
            default_database_path(Some(exe)),
            PathBuf::from("/srv/bohm/data/bohm.db")
        );

        let exe = Path::new("/srv/bohm/target/debug/reparse_ingredients");
        assert_eq!(
            default_database_path(Some(exe)),
            PathBuf::from("/srv/bohm/data/bohm.db")
        );
    }

    #[test]
    fn test_default_path_beside_installed_binary() {
        let exe = Path::new("/usr/local/bin/bohm");
        assert_eq!(
            default_database_path(Some(exe)),
            PathBuf::from("/usr/local/bin/data/bohm.db")
        );
    }

    #[test]
    fn test_default_path_without_executable() {
        assert_eq!(default_database_path(None), PathBuf::from("./data/bohm.db"));
    }
}
