//! Optional TOML configuration.
//!
//! `context-slicer.toml` in the working directory supplies defaults for
//! extraction depth, extended output, and entry points; CLI flags always
//! win. A missing default file means defaults, an explicitly named file
//! must exist.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "context-slicer.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SliceConfig {
    /// Backward traversal depth in caller hops.
    pub depth: u32,
    /// Emit per-caller call-site evidence.
    pub extended: bool,
    /// Entry points bounding graph construction, canonical signature form.
    pub entry_points: Vec<String>,
}

impl Default for SliceConfig {
    fn default() -> Self {
        Self {
            depth: 1,
            extended: false,
            entry_points: Vec::new(),
        }
    }
}

impl SliceConfig {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_apply_without_a_file() {
        let config = SliceConfig::default();
        assert_eq!(config.depth, 1);
        assert!(!config.extended);
        assert!(config.entry_points.is_empty());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "depth = 3").unwrap();
        let config = SliceConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.depth, 3);
        assert!(!config.extended);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "dept = 3").unwrap();
        assert!(SliceConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn named_missing_file_is_an_error() {
        assert!(SliceConfig::load(Some(Path::new("/no/such/config.toml"))).is_err());
    }
}
