use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use bpfinspect_common::RenderConfig;
use serde::{Deserialize, Serialize};

use crate::theme::ThemeOverrides;

/// Application configuration loaded from ~/.config/bpfinspect/config.toml.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    /// Initial rendering of map keys and values.
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub theme: ThemeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Refresh rate in milliseconds.
    #[serde(default = "default_refresh_rate")]
    pub refresh_rate_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpftool_path: Option<PathBuf>,
    /// Run bpftool through sudo when not root.
    #[serde(default = "default_use_sudo")]
    pub use_sudo: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            refresh_rate_ms: default_refresh_rate(),
            bpftool_path: None,
            use_sudo: default_use_sudo(),
        }
    }
}

fn default_refresh_rate() -> u64 {
    3000
}

fn default_use_sudo() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    /// Theme preset name: "gruvbox-dark" or "gruvbox-light".
    #[serde(default = "default_preset")]
    pub preset: String,
    /// Optional per-color overrides.
    #[serde(default)]
    pub overrides: ThemeOverrides,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            preset: default_preset(),
            overrides: ThemeOverrides::default(),
        }
    }
}

fn default_preset() -> String {
    "gruvbox-dark".to_string()
}

impl Config {
    /// Load config from the default path, or return defaults if not found.
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parsing config from {}", path.display()))
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("creating config directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("serializing config")?;
        fs::write(path, content).with_context(|| format!("writing config to {}", path.display()))?;
        Ok(())
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("bpfinspect")
        .join("config.toml")
}

/// Pick the bpftool binary: command line, then config file, then
/// `BPFTOOL_PATH`, then the first `bpftool` on `PATH`. An explicitly named
/// path must exist.
pub fn resolve_bpftool(
    cli: Option<&Path>,
    config: Option<&Path>,
    env: Option<&OsStr>,
    search_path: Option<&OsStr>,
) -> Result<PathBuf> {
    let explicit = [
        (cli, "--bpftool"),
        (config, "config file"),
        (env.map(Path::new), "BPFTOOL_PATH"),
    ];
    for (candidate, source) in explicit {
        let Some(path) = candidate.filter(|p| !p.as_os_str().is_empty()) else {
            continue;
        };
        if !path.exists() {
            bail!("bpftool not found at {} (from {source})", path.display());
        }
        return Ok(path.to_path_buf());
    }

    search_path
        .into_iter()
        .flat_map(std::env::split_paths)
        .map(|dir| dir.join("bpftool"))
        .find(|p| p.is_file())
        .context("bpftool not found in PATH; install it or pass --bpftool")
}
