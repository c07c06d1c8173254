//! `airgrid.toml` loading.
//!
//! The configuration file is located by priority:
//! 1. `--config` flag
//! 2. `AIRGRID_CONFIG` environment variable
//! 3. `./airgrid.toml`, if it exists
//! 4. built-in defaults
//!
//! Relative `catalog` and `store` paths are resolved against the directory of
//! the configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use airgrid_engine::EngineConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

pub const CONFIG_ENV: &str = "AIRGRID_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "airgrid.toml";
pub const DEFAULT_CATALOG_FILE: &str = "catalog.json";
pub const DEFAULT_STORE_FILE: &str = "diffusions.json";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Program and schedule catalog (JSON).
    pub catalog: Option<PathBuf>,
    /// Diffusion store document (JSON). Created on first write.
    pub store: Option<PathBuf>,
    pub engine: EngineConfig,
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("Invalid configuration")?;
        config.engine.grace_window().context("Invalid engine.grace_days")?;
        Ok(config)
    }

    /// Load the configuration selected by `flag`, the environment or the
    /// working directory. No file at all yields the defaults.
    pub fn load(flag: Option<&Path>) -> Result<Self> {
        let Some(path) = locate(flag) else {
            debug!("no configuration file, using defaults");
            return Ok(Self::default());
        };

        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config = Self::from_toml(&text)
            .with_context(|| format!("Failed to load config file: {}", path.display()))?;
        debug!(path = %path.display(), "configuration loaded");

        if let Some(dir) = path.parent() {
            config.catalog = config.catalog.map(|p| dir.join(p));
            config.store = config.store.map(|p| dir.join(p));
        }
        Ok(config)
    }

    pub fn catalog_path(&self, flag: Option<&Path>) -> PathBuf {
        pick(flag, self.catalog.as_deref(), DEFAULT_CATALOG_FILE)
    }

    pub fn store_path(&self, flag: Option<&Path>) -> PathBuf {
        pick(flag, self.store.as_deref(), DEFAULT_STORE_FILE)
    }
}

fn locate(flag: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = flag {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    local.exists().then_some(local)
}

fn pick(flag: Option<&Path>, configured: Option<&Path>, default: &str) -> PathBuf {
    flag.or(configured)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(default))
}

#[cfg(test)]
mod tests {
    use super::*;
    use airgrid_engine::{ApprovalMode, DstPolicy};

    #[test]
    fn empty_file_is_all_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.catalog, None);
        assert_eq!(config.engine, EngineConfig::default());
    }

    #[test]
    fn engine_section_overrides_defaults() {
        let config = Config::from_toml(
            r#"
            catalog = "programs.json"

            [engine]
            grace_days = 7
            approval = "manual"
            dst_policy = "skip"
            "#,
        )
        .unwrap();

        assert_eq!(config.catalog, Some(PathBuf::from("programs.json")));
        assert_eq!(config.engine.grace_days, 7);
        assert_eq!(config.engine.approval, ApprovalMode::Manual);
        assert_eq!(config.engine.dst_policy, DstPolicy::Skip);
    }

    #[test]
    fn out_of_range_grace_days_are_rejected() {
        for text in ["[engine]\ngrace_days = -3", "[engine]\ngrace_days = 9223372036854775807"] {
            let err = Config::from_toml(text).unwrap_err();
            assert!(format!("{err:#}").contains("grace_days"), "{err:#}");
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_toml("catalogue = \"x.json\"").is_err());
    }

    #[test]
    fn flag_wins_over_configured_path() {
        let config = Config {
            store: Some(PathBuf::from("/srv/airgrid/store.json")),
            ..Config::default()
        };
        assert_eq!(
            config.store_path(Some(Path::new("other.json"))),
            PathBuf::from("other.json")
        );
        assert_eq!(config.store_path(None), PathBuf::from("/srv/airgrid/store.json"));
        assert_eq!(config.catalog_path(None), PathBuf::from(DEFAULT_CATALOG_FILE));
    }
}
