//! Optional `tsgen.toml` project configuration.
//!
//! ```toml
//! [generate]
//! out = "src/gen"
//! env = "node-userland"
//! skip-errors = true
//! ```
//!
//! Command-line flags take precedence over the file.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

pub const CONFIG_FILE: &str = "tsgen.toml";
pub const DEFAULT_OUT_DIR: &str = "gen";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub generate: GenerateConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct GenerateConfig {
    pub out: Option<PathBuf>,
    pub env: Option<String>,
    pub skip_errors: Option<bool>,
}

impl Config {
    /// Loads `tsgen.toml` from `dir`; a missing file yields the defaults.
    pub fn load(dir: &Path) -> Result<Self, String> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)
            .map_err(|err| format!("Failed to read {}: {err}", path.display()))?;
        let config: Self = toml::from_str(&text)
            .map_err(|err| format!("Failed to parse {}: {err}", path.display()))?;
        debug!(path = %path.display(), "Loaded configuration.");
        Ok(config)
    }

    /// Loads `tsgen.toml` from the working directory.
    pub fn load_from_cwd() -> Result<Self, String> {
        let cwd = std::env::current_dir()
            .map_err(|err| format!("Failed to read the working directory: {err}"))?;
        Self::load(&cwd)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), Config::default());
    }

    #[test]
    fn test_load_generate_section() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "[generate]\nout = \"src/gen\"\nenv = \"host\"\nskip-errors = true\n",
        )
        .unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.generate.out, Some(PathBuf::from("src/gen")));
        assert_eq!(config.generate.env.as_deref(), Some("host"));
        assert_eq!(config.generate.skip_errors, Some(true));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[generate]\nouput = \"x\"\n").unwrap();
        let err = Config::load(dir.path()).unwrap_err();
        assert!(err.contains(CONFIG_FILE));
    }
}
