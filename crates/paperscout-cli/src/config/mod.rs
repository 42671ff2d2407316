//! Configuration loading for paperscout.
//! Reads paperscout.yaml from the current directory unless a path is given.

use std::path::Path;

use paperscout_ingest::FetchConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "paperscout.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub export: ExportConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String { "papers.db".to_string() }

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: default_db_path() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScraperConfig {
    #[serde(default = "default_delay_min")]
    pub delay_min: f64,
    #[serde(default = "default_delay_max")]
    pub delay_max: f64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    #[serde(default = "default_download_pdf")]
    pub download_pdf: bool,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_delay_min()    -> f64   { 2.0 }
fn default_delay_max()    -> f64   { 5.0 }
fn default_max_retries()  -> u32   { 3 }
fn default_timeout()      -> u64   { 30 }
fn default_download_pdf() -> bool  { true }
fn default_max_results()  -> usize { 50 }

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            delay_min: default_delay_min(),
            delay_max: default_delay_max(),
            max_retries: default_max_retries(),
            timeout: default_timeout(),
            download_pdf: default_download_pdf(),
            max_results: default_max_results(),
        }
    }
}

impl ScraperConfig {
    pub fn to_fetch_config(&self) -> FetchConfig {
        FetchConfig {
            delay_min: self.delay_min,
            delay_max: self.delay_max,
            max_retries: self.max_retries,
            timeout: self.timeout,
            download_pdf: self.download_pdf,
            max_results: self.max_results,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_pdf_dir")]
    pub pdf_dir: String,
    #[serde(default = "default_json_path")]
    pub json_path: String,
    #[serde(default = "default_csv_path")]
    pub csv_path: String,
}

fn default_pdf_dir()   -> String { "output/pdfs".to_string() }
fn default_json_path() -> String { "output/papers.json".to_string() }
fn default_csv_path()  -> String { "output/papers.csv".to_string() }

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            pdf_dir: default_pdf_dir(),
            json_path: default_json_path(),
            csv_path: default_csv_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub semanticscholar: SemanticScholarConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SemanticScholarConfig {
    #[serde(default)]
    pub api_key: Option<String>,
}


impl Config {
    /// Load configuration.
    ///
    /// An explicitly given path must exist. Without one, paperscout.yaml in
    /// the current directory is used if present, otherwise every field takes
    /// its default.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let (path, required) = match path {
            Some(p) => (p, true),
            None => (Path::new(DEFAULT_CONFIG_PATH), false),
        };

        if !path.exists() {
            if required {
                anyhow::bail!("config file not found: {}", path.display());
            }
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }
}
