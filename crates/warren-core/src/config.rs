//! Layered node configuration: built-in defaults, an optional TOML
//! file, then environment variable overrides. Mirrors the resolution
//! order of a typical daemon config loader: later layers win.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    ParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to write config file {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize config: {0}")]
    SerializeFailed(#[source] toml::ser::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IdentityConfig {
    /// Path to a 32-byte raw Ed25519 private key file, created on
    /// first run if missing.
    pub private_key_path: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            private_key_path: "identity.key".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RoutingConfig {
    pub k: usize,
    pub bucket_ttl_secs: u64,
    pub maintenance_queue_depth: usize,
    pub probe_timeout_secs: u64,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            k: 20,
            bucket_ttl_secs: 300,
            maintenance_queue_depth: 10,
            probe_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LookupConfig {
    pub alpha: usize,
    pub lookup_timeout_secs: u64,
    pub per_query_timeout_secs: u64,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            alpha: 3,
            lookup_timeout_secs: 20,
            per_query_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct NodeConfig {
    pub identity: IdentityConfig,
    pub routing: RoutingConfig,
    pub lookup: LookupConfig,
}

impl NodeConfig {
    /// Resolves the config file path: `$WARREN_CONFIG` if set, else
    /// `~/.config/warren/config.toml`.
    pub fn file_path() -> PathBuf {
        if let Ok(p) = env::var("WARREN_CONFIG") {
            return PathBuf::from(p);
        }
        config_dir().join("config.toml")
    }

    /// Loads defaults, overlays the config file if present, then
    /// applies environment variable overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut cfg = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|source| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn write_default_if_missing(path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        let toml = toml::to_string_pretty(&Self::default()).map_err(ConfigError::SerializeFailed)?;
        fs::write(path, toml).map_err(|source| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("WARREN_ROUTING__K") {
            if let Ok(v) = v.parse() {
                self.routing.k = v;
            }
        }
        if let Ok(v) = env::var("WARREN_ROUTING__BUCKET_TTL_SECS") {
            if let Ok(v) = v.parse() {
                self.routing.bucket_ttl_secs = v;
            }
        }
        if let Ok(v) = env::var("WARREN_LOOKUP__ALPHA") {
            if let Ok(v) = v.parse() {
                self.lookup.alpha = v;
            }
        }
        if let Ok(v) = env::var("WARREN_IDENTITY__PRIVATE_KEY_PATH") {
            self.identity.private_key_path = v;
        }
    }
}

fn config_dir() -> PathBuf {
    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("warren");
    }
    dirs_or_home().join(".config").join("warren")
}

fn dirs_or_home() -> PathBuf {
    env::var("HOME").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_constants() {
        let cfg = NodeConfig::default();
        assert_eq!(cfg.routing.k, 20);
        assert_eq!(cfg.lookup.alpha, 3);
        assert_eq!(cfg.routing.bucket_ttl_secs, 300);
        assert_eq!(cfg.routing.maintenance_queue_depth, 10);
    }

    #[test]
    fn toml_roundtrip() {
        let cfg = NodeConfig::default();
        let s = toml::to_string_pretty(&cfg).unwrap();
        let back: NodeConfig = toml::from_str(&s).unwrap();
        assert_eq!(cfg, back);
    }

    #[test]
    fn env_override_applies() {
        let mut cfg = NodeConfig::default();
        unsafe {
            std::env::set_var("WARREN_ROUTING__K", "30");
        }
        cfg.apply_env_overrides();
        unsafe {
            std::env::remove_var("WARREN_ROUTING__K");
        }
        assert_eq!(cfg.routing.k, 30);
    }
}
