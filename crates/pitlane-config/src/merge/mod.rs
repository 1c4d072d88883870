//! Configuration layering, fallback logic, and environment overrides

use camino::{Utf8Path, Utf8PathBuf};
use pitlane_core::error::PitlaneError;
use std::collections::HashMap;

use crate::toml::{validate_config, PitlaneToml};
use crate::{ConfigResult, CONFIG_FILE_NAME};

/// Prefix shared by every environment override
pub const ENV_PREFIX: &str = "PITLANE_";

/// Main configuration loading interface
pub struct ConfigLoader {
    /// Current working directory
    cwd: Utf8PathBuf,
}

/// Configuration layering and merging
pub struct ConfigLayering;

/// Configuration source tracking
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// File given with --config
    Explicit(Utf8PathBuf),
    /// pitlane.toml found from the working directory
    Discovered(Utf8PathBuf),
    /// No file, built-in defaults plus overrides
    Defaults,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new(cwd: Utf8PathBuf) -> Self {
        Self { cwd }
    }

    /// Load the file layer of the configuration
    ///
    /// An explicit path must exist. Without one, pitlane.toml is searched
    /// from the working directory upwards and defaults are used if absent.
    pub async fn load_file_config(
        &self,
        explicit: Option<&Utf8Path>,
    ) -> ConfigResult<(PitlaneToml, ConfigSource)> {
        if let Some(path) = explicit {
            let path = if path.is_absolute() {
                path.to_path_buf()
            } else {
                self.cwd.join(path)
            };
            let config = crate::toml::load_from_file(&path).await?;
            return Ok((config, ConfigSource::Explicit(path)));
        }

        if let Some(path) = self.resolve_config_path(CONFIG_FILE_NAME) {
            let config = crate::toml::load_from_file(&path).await?;
            return Ok((config, ConfigSource::Discovered(path)));
        }

        Ok((PitlaneToml::default(), ConfigSource::Defaults))
    }

    /// Load every layer and validate the merged result
    pub async fn load(
        &self,
        explicit: Option<&Utf8Path>,
        cli_overrides: HashMap<String, String>,
    ) -> ConfigResult<(PitlaneToml, ConfigSource)> {
        let (file_config, source) = self.load_file_config(explicit).await?;
        let merged = ConfigLayering::merge_configs(
            file_config,
            ConfigLayering::collect_env_overrides(),
            cli_overrides,
        )?;
        Ok((merged, source))
    }

    /// Find configuration file in project (walks up directory tree)
    pub fn resolve_config_path(&self, filename: &str) -> Option<Utf8PathBuf> {
        let mut current = Some(self.cwd.as_path());

        while let Some(dir) = current {
            let config_path = dir.join(filename);
            if config_path.is_file() {
                return Some(config_path);
            }
            current = dir.parent();
        }

        None
    }
}

impl ConfigLayering {
    /// Merge configuration layers and validate the result
    pub fn merge_configs(
        file_config: PitlaneToml,
        env_overrides: HashMap<String, String>,
        cli_overrides: HashMap<String, String>,
    ) -> ConfigResult<PitlaneToml> {
        let mut merged = file_config;

        // Apply environment variable overrides
        Self::apply_env_overrides(&mut merged, &env_overrides)?;

        // Apply CLI flag overrides (highest priority)
        Self::apply_cli_overrides(&mut merged, &cli_overrides)?;

        validate_config(&merged)?;

        Ok(merged)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(
        config: &mut PitlaneToml,
        overrides: &HashMap<String, String>,
    ) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                "PITLANE_LISTEN" => config.server.listen = value.clone(),
                "PITLANE_ENABLED" => config.server.enabled = parse_bool(key, value)?,
                "PITLANE_INSTALL_ROOT" => config.paths.install_root = Utf8PathBuf::from(value),
                "PITLANE_CACHE_ROOT" => config.paths.cache_root = Utf8PathBuf::from(value),
                "PITLANE_BASE_DOMAIN" => config.urls.base_domain = value.clone(),
                "PITLANE_OVERWRITE" => config.urls.overwrite = parse_bool(key, value)?,
                "PITLANE_AUTHORS_BLACKLIST" => {
                    config.urls.authors_blacklist = value
                        .split(',')
                        .map(str::trim)
                        .filter(|author| !author.is_empty())
                        .map(str::to_string)
                        .collect();
                },
                _ => {
                    // Unknown environment variable, ignore
                },
            }
        }

        Ok(())
    }

    /// Apply CLI flag overrides
    fn apply_cli_overrides(
        config: &mut PitlaneToml,
        overrides: &HashMap<String, String>,
    ) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.as_str() {
                "listen" => config.server.listen = value.clone(),
                "install_root" => config.paths.install_root = Utf8PathBuf::from(value),
                "cache_root" => config.paths.cache_root = Utf8PathBuf::from(value),
                "base_domain" => config.urls.base_domain = value.clone(),
                "overwrite" => config.urls.overwrite = parse_bool("--overwrite", value)?,
                _ => {
                    // Unknown CLI override, ignore
                },
            }
        }

        Ok(())
    }

    /// Collect environment variable overrides
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect()
    }
}

fn parse_bool(field: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(PitlaneError::ConfigValidation {
            field: field.to_string(),
            reason: format!("expected a boolean, got '{}'", other),
        }),
    }
}
