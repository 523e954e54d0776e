pub mod generate;
pub mod generate_folder;

use std::path::{Path, PathBuf};

use clap::Args;
use tracing::info;
use tsgen_core::{DefaultFetcher, Environment, GenerateOptions, Metadata};
use url::Url;

use crate::config::{DEFAULT_OUT_DIR, GenerateConfig};
use crate::output::write_artifacts;

pub async fn run_cli_async<F, Fut>(f: F) -> i32
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<(), String>>,
{
    match f().await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            1
        }
    }
}

/// Flags shared by every generating command.
#[derive(Args, Debug, Clone, Default)]
pub struct OutputFlags {
    #[arg(
        long = "out",
        value_name = "DIR",
        help = "Output directory; artifacts land in <DIR>/<domain>/. Defaults to \"gen\""
    )]
    pub out: Option<PathBuf>,
    #[arg(
        long = "env",
        value_name = "ENV",
        help = "Target environment: deno-userland, node-userland or host. Defaults to deno-userland"
    )]
    pub env: Option<String>,
}

/// Flags layered over the config file and defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub out: PathBuf,
    pub env: Environment,
}

impl OutputFlags {
    pub fn settings(&self, config: &GenerateConfig) -> Result<Settings, String> {
        let out = self
            .out
            .clone()
            .or_else(|| config.out.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_DIR));
        let env = match self.env.as_deref().or(config.env.as_deref()) {
            Some(name) => name
                .parse::<Environment>()
                .map_err(|err| err.to_string())?,
            None => Environment::default(),
        };
        Ok(Settings { out, env })
    }
}

/// Generates one document and writes its artifacts.
pub async fn generate_file(path: &Path, settings: &Settings) -> Result<Vec<PathBuf>, String> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| format!("Failed to read {}: {err}", path.display()))?;
    let absolute = std::path::absolute(path)
        .map_err(|err| format!("Failed to resolve {}: {err}", path.display()))?;
    let base = Url::from_file_path(&absolute)
        .map_err(|()| format!("{} is not a valid file location", absolute.display()))?;

    info!(path = %path.display(), env = %settings.env, "Generating document.");
    let options = GenerateOptions {
        env: settings.env,
        base,
    };
    let artifacts = tsgen_core::generate(&text, &options, &DefaultFetcher::new())
        .await
        .map_err(|err| err.to_string())?;

    // Generation succeeded, so the metadata is known to be valid.
    let domain = match Metadata::from_text(&text) {
        Ok(Ok(metadata)) => metadata.id.domain().to_string(),
        _ => return Err(format!("{}: metadata changed during generation", path.display())),
    };
    write_artifacts(&settings.out, &domain, &artifacts).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let config = GenerateConfig {
            out: Some(PathBuf::from("from-config")),
            env: Some("host".into()),
            skip_errors: None,
        };
        let flags = OutputFlags {
            out: None,
            env: Some("node-userland".into()),
        };
        assert_eq!(
            flags.settings(&config).unwrap(),
            Settings {
                out: PathBuf::from("from-config"),
                env: Environment::NodeUserland,
            }
        );
        assert_eq!(
            OutputFlags::default()
                .settings(&GenerateConfig::default())
                .unwrap(),
            Settings {
                out: PathBuf::from("gen"),
                env: Environment::DenoUserland,
            }
        );
    }

    #[test]
    fn test_unknown_environment_is_rejected() {
        let flags = OutputFlags {
            out: None,
            env: Some("browser".into()),
        };
        let err = flags.settings(&GenerateConfig::default()).unwrap_err();
        assert!(err.contains("\"browser\" is not valid"));
    }
}
