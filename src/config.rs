//! Configuration loading.
//!
//! All settings live in one TOML file (`watchdesk.toml` by default). Every
//! field has a default, so the binary runs without any config file at all.

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Default config file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "watchdesk.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Catalog scan settings.
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Search settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// External runner settings.
    #[serde(default)]
    pub runner: RunnerConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where and how the catalog scan looks for files.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Root directories scanned recursively for catalog files.
    #[serde(default = "default_roots")]
    pub roots: Vec<PathBuf>,

    /// File extensions treated as detection config files.
    #[serde(default = "default_config_extensions")]
    pub config_extensions: Vec<String>,

    /// File extensions treated as test-definition files.
    #[serde(default = "default_test_extensions")]
    pub test_extensions: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            roots: default_roots(),
            config_extensions: default_config_extensions(),
            test_extensions: default_test_extensions(),
        }
    }
}

/// Search result shaping.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Maximum number of results returned per search.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
        }
    }
}

/// External test runner settings.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    /// Project directory the runner executes in (build-tool detection root).
    #[serde(default = "default_project_dir")]
    pub project_dir: PathBuf,

    /// Directory searched for generated report files after a run.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Maximum runtime for one external test execution, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Explicit runner command (program + args). When non-empty it replaces
    /// build-tool detection; test name and parameters are appended as `-D`
    /// system properties.
    #[serde(default)]
    pub command: Vec<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            project_dir: default_project_dir(),
            output_dir: default_output_dir(),
            timeout_secs: default_timeout_secs(),
            command: Vec::new(),
        }
    }
}

/// Logging settings for the long-running `serve` mode.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Directory for daily-rolling JSON log files.
    #[serde(default = "default_logs_dir")]
    pub dir: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_logs_dir(),
        }
    }
}

// Default value functions for serde

fn default_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("configs"), PathBuf::from("src/test")]
}
fn default_config_extensions() -> Vec<String> {
    vec!["yml".to_owned(), "yaml".to_owned()]
}
fn default_test_extensions() -> Vec<String> {
    vec!["java".to_owned()]
}
fn default_max_results() -> usize {
    10
}
fn default_project_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl Config {
    /// Load configuration with standard resolution: an explicit path must
    /// exist and parse; otherwise `./watchdesk.toml` is used when present;
    /// otherwise built-in defaults apply.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing config file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => load_config(p),
            None => {
                let fallback = Path::new(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    load_config(fallback)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config at {}: {e}", path.display()))?;
    let config: Config = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("failed to parse config at {}: {e}", path.display()))?;
    Ok(config)
}
