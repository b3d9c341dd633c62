// src/config.rs
//! Runtime tunables. Loaded from an explicit TOML path, from
//! `GHOSTFEED_CONFIG_PATH`, or from `config/ghostfeed.toml`, falling
//! back to defaults when nothing is present.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

const ENV_PATH: &str = "GHOSTFEED_CONFIG_PATH";

/// One surveyed page per source per refresh.
pub const DEFAULT_PAGE_CAP: usize = 100;
/// Statistics poll cadence in seconds.
pub const DEFAULT_STATS_POLL_SECS: u64 = 10;
/// Storage heuristic: assumed bytes per post/media record (2 MiB).
pub const DEFAULT_STORAGE_BYTES_PER_RECORD: u64 = 2 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SurveillanceConfig {
    pub page_cap: usize,
    pub stats_poll_secs: u64,
    pub storage_bytes_per_record: u64,
}

impl Default for SurveillanceConfig {
    fn default() -> Self {
        Self {
            page_cap: DEFAULT_PAGE_CAP,
            stats_poll_secs: DEFAULT_STATS_POLL_SECS,
            storage_bytes_per_record: DEFAULT_STORAGE_BYTES_PER_RECORD,
        }
    }
}

impl SurveillanceConfig {
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        let cfg: SurveillanceConfig =
            toml::from_str(&content).with_context(|| format!("parsing {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Env var first, then `config/ghostfeed.toml`, then defaults.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let fallback = PathBuf::from("config/ghostfeed.toml");
        if fallback.exists() {
            return Self::load_from(&fallback);
        }
        Ok(Self::default())
    }

    fn validate(&self) -> Result<()> {
        if self.page_cap == 0 {
            return Err(anyhow!("page_cap must be at least 1"));
        }
        if self.stats_poll_secs == 0 {
            return Err(anyhow!("stats_poll_secs must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn defaults_are_sane() {
        let cfg = SurveillanceConfig::default();
        assert_eq!(cfg.page_cap, 100);
        assert_eq!(cfg.stats_poll_secs, 10);
        assert_eq!(cfg.storage_bytes_per_record, 2 * 1024 * 1024);
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let cfg: SurveillanceConfig = toml::from_str("page_cap = 25").unwrap();
        assert_eq!(cfg.page_cap, 25);
        assert_eq!(cfg.stats_poll_secs, DEFAULT_STATS_POLL_SECS);
    }

    #[test]
    fn rejects_zero_page_cap() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("ghostfeed.toml");
        std::fs::write(&p, "page_cap = 0").unwrap();
        assert!(SurveillanceConfig::load_from(&p).is_err());
    }

    #[serial_test::serial]
    #[test]
    fn env_path_takes_precedence() {
        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("ghostfeed.toml");
        std::fs::write(&p, "stats_poll_secs = 3").unwrap();

        env::set_var(ENV_PATH, p.display().to_string());
        let cfg = SurveillanceConfig::load_default().unwrap();
        assert_eq!(cfg.stats_poll_secs, 3);
        env::remove_var(ENV_PATH);
    }

    #[serial_test::serial]
    #[test]
    fn missing_env_path_is_an_error() {
        env::set_var(ENV_PATH, "/definitely/not/here.toml");
        assert!(SurveillanceConfig::load_default().is_err());
        env::remove_var(ENV_PATH);
    }
}
