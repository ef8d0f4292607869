//! Compile-time metadata from `build.rs` and the package manifest.

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// UTC time the crate was compiled, RFC 3339
pub const BUILD_TIMESTAMP: &str = match option_env!("BOHM_BUILD_TIMESTAMP") {
    Some(s) => s,
    None => "unknown",
};

/// Cargo profile, `debug` or `release`
pub const BUILD_PROFILE: &str = match option_env!("BOHM_BUILD_PROFILE") {
    Some(s) => s,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_metadata_is_well_formed() {
        if BUILD_TIMESTAMP != "unknown" {
            assert!(chrono::DateTime::parse_from_rfc3339(BUILD_TIMESTAMP).is_ok());
        }
        assert!(!BUILD_PROFILE.is_empty());
        assert!(VERSION.split('.').all(|part| part.parse::<u32>().is_ok()));
    }
}
