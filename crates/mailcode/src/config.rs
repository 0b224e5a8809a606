//! Pattern table configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mailcode_core::PatternTables;
use tracing::{debug, info};

/// Where pattern tables are looked up when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mailcode")
        .join("patterns.json")
}

/// Loads the effective pattern tables.
///
/// An explicit path must be readable. Otherwise the default location is used
/// when it exists, and the built-in tables when it does not.
pub fn load_tables(explicit: Option<&Path>) -> Result<PatternTables> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let path = default_config_path();
            if !path.exists() {
                debug!(path = %path.display(), "no pattern tables file, using built-in tables");
                return Ok(PatternTables::default());
            }
            path
        }
    };

    read_tables(&path)
}

fn read_tables(path: &Path) -> Result<PatternTables> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read pattern tables from {}", path.display()))?;
    let tables = PatternTables::from_json(&contents)
        .with_context(|| format!("invalid pattern tables in {}", path.display()))?;
    info!("Loaded pattern tables from {:?}", path);
    Ok(tables)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_overrides_only_named_fields() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("patterns.json");
        std::fs::write(&path, r#"{ "accept_min_score": 20 }"#).unwrap();

        let tables = load_tables(Some(&path)).unwrap();
        let defaults = PatternTables::default();
        assert_eq!(tables.accept_min_score, 20);
        assert_eq!(tables.context_window, defaults.context_window);
        assert_eq!(tables.code_patterns, defaults.code_patterns);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = load_tables(Some(&dir.path().join("nope.json"))).unwrap_err();
        assert!(err.to_string().contains("failed to read pattern tables"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("patterns.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_tables(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("invalid pattern tables"));
    }

    #[test]
    fn test_default_path_location() {
        let path = default_config_path();
        assert!(path.ends_with("mailcode/patterns.json"));
    }
}
