//! `tmxconv.toml` defaults for the batch commands.
//!
//! ```toml
//! source_lang = "es"
//! seg_type = "phrase"
//! creation_tool = "my-pipeline"
//! creation_tool_version = "2.1"
//! jobs = 4
//! schema_url = "schemas/tmx14.dtd"
//! alignment = "positional"
//! ```
//!
//! Command-line flags override these values; these values override the
//! built-in defaults.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tmxconv::{Alignment, SegType};

/// Looked up in the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "tmxconv.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub source_lang: Option<String>,
    pub seg_type: Option<String>,
    pub creation_tool: Option<String>,
    pub creation_tool_version: Option<String>,
    pub jobs: Option<usize>,
    pub schema_url: Option<String>,
    pub alignment: Option<Alignment>,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("cannot read config {}: {e}", path.display()))?;
        Self::from_toml(&content).map_err(|e| format!("invalid config {}: {e}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self, String> {
        let config: Config = toml::from_str(content).map_err(|e| e.to_string())?;
        config.seg_type()?;
        if config.jobs == Some(0) {
            return Err("`jobs` must be at least 1".to_string());
        }
        Ok(config)
    }

    /// Load `explicit` if given, else `tmxconv.toml` from `dir` if present,
    /// else the defaults.
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self, String> {
        match explicit {
            Some(path) => Self::load_from_file(path),
            None => {
                let candidate = dir.join(DEFAULT_CONFIG_FILE);
                if candidate.is_file() {
                    Self::load_from_file(candidate)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn seg_type(&self) -> Result<Option<SegType>, String> {
        self.seg_type
            .as_deref()
            .map(|s| s.parse::<SegType>().map_err(|e| e.to_string()))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml(
            r#"
            source_lang = "es"
            seg_type = "Phrase"
            creation_tool = "pipeline"
            creation_tool_version = "2.1"
            jobs = 4
            schema_url = "tmx14.dtd"
            alignment = "positional"
            "#,
        )
        .unwrap();
        assert_eq!(config.source_lang.as_deref(), Some("es"));
        assert_eq!(config.seg_type().unwrap(), Some(SegType::Phrase));
        assert_eq!(config.jobs, Some(4));
        assert_eq!(config.alignment, Some(Alignment::Positional));
    }

    #[test]
    fn test_empty_config_is_default() {
        assert_eq!(Config::from_toml("").unwrap(), Config::default());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Config::from_toml("seg_type = \"block\"").is_err());
        assert!(Config::from_toml("jobs = 0").is_err());
        assert!(Config::from_toml("alignment = \"diagonal\"").is_err());
        assert!(Config::from_toml("unknown_key = 1").is_err());
    }

    #[test]
    fn test_discover() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(
            Config::discover(None, tmp.path()).unwrap(),
            Config::default()
        );

        std::fs::write(tmp.path().join(DEFAULT_CONFIG_FILE), "jobs = 2\n").unwrap();
        assert_eq!(Config::discover(None, tmp.path()).unwrap().jobs, Some(2));

        let missing = tmp.path().join("other.toml");
        let err = Config::discover(Some(&missing), tmp.path()).unwrap_err();
        assert!(err.contains("cannot read config"));
    }
}
