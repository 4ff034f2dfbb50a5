mod types;

pub use types::*;

use anyhow::{Context, Result};
use mediacheck_common::CeaScheme;
use std::collections::HashSet;
use std::path::Path;

/// Load a job description from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = ["./mediacheck.toml", "~/.config/mediacheck/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.limits.concurrency == 0 {
        anyhow::bail!("Concurrency cannot be 0");
    }

    let mut ids = HashSet::new();
    for rep in &config.representations {
        if !ids.insert(rep.id.as_str()) {
            anyhow::bail!("Duplicate representation id '{}'", rep.id);
        }

        if let Some(ref scheme) = rep.captions {
            if scheme.parse::<CeaScheme>().is_err() {
                anyhow::bail!(
                    "Representation '{}' has unknown caption scheme '{}'",
                    rep.id,
                    scheme
                );
            }
            if rep.kind != TrackKind::Video {
                anyhow::bail!("Representation '{}' carries captions but is not video", rep.id);
            }
        }

        if !rep.init.exists() {
            tracing::warn!("Init segment does not exist: {:?}", rep.init);
        }
        for segment in &rep.segments {
            if !segment.path.exists() {
                tracing::warn!("Segment does not exist: {:?}", segment.path);
            }
        }
    }

    Ok(())
}
