//! Configuration loading.
//!
//! Settings come from, in increasing precedence: built-in defaults, an
//! optional TOML file, and the process environment (`MARKDOWN_DIRECTORY`,
//! `OMDB_API_KEY`). The environment is read through a lookup function so
//! the resulting [`Config`] is a plain value that tests can build without
//! touching global state.
//!
//! ```toml
//! directory = "~/notes/movies"
//! queue_file = "missing_matches.csv"
//!
//! [scan]
//! include_globs = ["*.md"]
//! recursive = false
//!
//! [provider]
//! base_url = "http://www.omdbapi.com/"
//! timeout_secs = 30
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable holding the OMDb access key.
pub const API_KEY_ENV: &str = "OMDB_API_KEY";
/// Environment variable overriding the notes directory.
pub const DIRECTORY_ENV: &str = "MARKDOWN_DIRECTORY";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_queue_file")]
    pub queue_file: PathBuf,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Never read from the TOML file; only the environment supplies it.
    #[serde(skip)]
    pub api_key: Option<String>,
}

fn default_directory() -> PathBuf {
    PathBuf::from("./markdown_files")
}
fn default_queue_file() -> PathBuf {
    PathBuf::from("missing_matches.csv")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScanConfig {
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
            recursive: false,
            follow_symlinks: false,
        }
    }
}

fn default_include_globs() -> Vec<String> {
    vec!["*.md".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "http://www.omdbapi.com/".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            queue_file: default_queue_file(),
            scan: ScanConfig::default(),
            provider: ProviderConfig::default(),
            api_key: None,
        }
    }
}

impl Config {
    /// Overlay environment settings read through `lookup`.
    ///
    /// Empty values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(dir) = get(DIRECTORY_ENV) {
            self.directory = PathBuf::from(dir);
        }
        if let Some(key) = get(API_KEY_ENV) {
            self.api_key = Some(key.trim().to_string());
        }
    }

    /// Path of the lookup queue, resolved against the notes directory.
    pub fn queue_path(&self) -> PathBuf {
        if self.queue_file.is_absolute() {
            self.queue_file.clone()
        } else {
            self.directory.join(&self.queue_file)
        }
    }

    /// The access key, or an error for commands that call the provider.
    pub fn require_api_key(&self) -> Result<&str> {
        match self.api_key.as_deref() {
            Some(key) => Ok(key),
            None => bail!("{} not found in environment variables", API_KEY_ENV),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.scan.include_globs.is_empty() {
            bail!("scan.include_globs must not be empty");
        }
        if self.provider.timeout_secs == 0 {
            bail!("provider.timeout_secs must be > 0");
        }
        if self.provider.base_url.trim().is_empty() {
            bail!("provider.base_url must not be empty");
        }
        Ok(())
    }
}

/// Parse a TOML configuration string.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from `path` (if it exists) and the process environment.
///
/// A missing file is not an error: every setting has a default.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        parse_config(&content)?
    } else {
        Config::default()
    };

    config.apply_env(|name| std::env::var(name).ok());
    config.validate()?;
    Ok(config)
}
