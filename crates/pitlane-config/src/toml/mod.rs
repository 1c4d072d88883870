//! pitlane.toml configuration parsing and serialization

use camino::Utf8PathBuf;
use pitlane_core::error::PitlaneError;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use url::Url;

use crate::ConfigResult;

/// Default address the download server binds to
pub const DEFAULT_LISTEN: &str = "0.0.0.0:8772";

/// Complete pitlane.toml configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PitlaneToml {
    /// HTTP server section
    #[serde(default)]
    pub server: ServerSection,

    /// Filesystem locations
    #[serde(default)]
    pub paths: PathsSection,

    /// Download URL generation
    #[serde(default)]
    pub urls: UrlsSection,
}

/// HTTP server section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSection {
    /// Socket address to listen on
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Whether the download endpoint answers at all
    #[serde(default = "default_true")]
    pub enabled: bool,
}

/// Filesystem locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathsSection {
    /// Server installation root containing `content/cars` and `content/tracks`
    #[serde(default)]
    pub install_root: Utf8PathBuf,

    /// Directory where built archives are kept
    #[serde(default = "default_cache_root")]
    pub cache_root: Utf8PathBuf,
}

/// Download URL generation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UrlsSection {
    /// Scheme and host prefixed to every download URL, e.g. `http://example.com`
    #[serde(default)]
    pub base_domain: String,

    /// Replace download URLs that are already set
    #[serde(default)]
    pub overwrite: bool,

    /// Authors whose items never get a download URL
    #[serde(default)]
    pub authors_blacklist: Vec<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            enabled: true,
        }
    }
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            install_root: Utf8PathBuf::new(),
            cache_root: default_cache_root(),
        }
    }
}

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

fn default_true() -> bool {
    true
}

fn default_cache_root() -> Utf8PathBuf {
    Utf8PathBuf::from("cache")
}

impl PitlaneToml {
    /// Parsed listen address (call after validation)
    pub fn listen_addr(&self) -> ConfigResult<SocketAddr> {
        self.server.listen.parse().map_err(|e| PitlaneError::ConfigValidation {
            field: "server.listen".to_string(),
            reason: format!("'{}' is not a socket address: {}", self.server.listen, e),
        })
    }

    /// Parsed base domain (call after validation)
    pub fn base_url(&self) -> ConfigResult<Url> {
        parse_base_domain(&self.urls.base_domain)
    }
}

/// Parse TOML string to PitlaneToml configuration
///
/// Only syntax and types are checked here. Required fields may still come
/// from overrides, so [`validate_config`] runs after layering.
pub fn parse_pitlane_toml(content: &str) -> ConfigResult<PitlaneToml> {
    // First try with toml_edit for better error reporting
    content
        .parse::<toml_edit::DocumentMut>()
        .map_err(|e| PitlaneError::ConfigParse {
            message: format!("TOML syntax error: {}", e),
        })?;

    // Then parse with serde for type safety
    toml::from_str(content).map_err(|e| PitlaneError::ConfigParse {
        message: format!("TOML parsing error: {}", e),
    })
}

/// Serialize PitlaneToml to TOML string
pub fn serialize_pitlane_toml(config: &PitlaneToml) -> ConfigResult<String> {
    toml::to_string_pretty(config).map_err(|e| PitlaneError::ConfigParse {
        message: format!("TOML serialization error: {}", e),
    })
}

/// Validate configuration completeness
pub fn validate_config(config: &PitlaneToml) -> ConfigResult<()> {
    if config.paths.install_root.as_str().is_empty() {
        return Err(PitlaneError::ConfigValidation {
            field: "paths.install_root".to_string(),
            reason: "install_root is required in [paths] section".to_string(),
        });
    }

    if config.paths.cache_root.as_str().is_empty() {
        return Err(PitlaneError::ConfigValidation {
            field: "paths.cache_root".to_string(),
            reason: "cache_root must not be empty".to_string(),
        });
    }

    config.base_url()?;
    config.listen_addr()?;

    if config.urls.authors_blacklist.iter().any(|a| a.is_empty()) {
        return Err(PitlaneError::ConfigValidation {
            field: "urls.authors_blacklist".to_string(),
            reason: "blacklist entries must not be empty".to_string(),
        });
    }

    Ok(())
}

/// Load and parse pitlane.toml from file path
pub async fn load_from_file(path: &camino::Utf8Path) -> ConfigResult<PitlaneToml> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| PitlaneError::io(format!("Failed to read {}", path), e))?;

    parse_pitlane_toml(&content).map_err(|e| match e {
        PitlaneError::ConfigParse { message } => PitlaneError::ConfigParse {
            message: format!("In file {}: {}", path, message),
        },
        other => other,
    })
}

/// Check that the base domain is an absolute http(s) URL
fn parse_base_domain(base_domain: &str) -> ConfigResult<Url> {
    if base_domain.is_empty() {
        return Err(PitlaneError::ConfigValidation {
            field: "urls.base_domain".to_string(),
            reason: "base_domain is required in [urls] section".to_string(),
        });
    }

    let url = Url::parse(base_domain).map_err(|e| PitlaneError::ConfigValidation {
        field: "urls.base_domain".to_string(),
        reason: format!("'{}' is not a valid URL: {}", base_domain, e),
    })?;

    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(PitlaneError::ConfigValidation {
            field: "urls.base_domain".to_string(),
            reason: format!("'{}' must be an http or https URL", base_domain),
        });
    }

    if url.query().is_some() || url.fragment().is_some() {
        return Err(PitlaneError::ConfigValidation {
            field: "urls.base_domain".to_string(),
            reason: "base_domain must not carry a query or fragment".to_string(),
        });
    }

    Ok(url)
}
