//! Configuration for the courier report generator

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants;
use crate::reports::ReportSettings;

// =============================================================================
// File-based Configuration (config.toml)
// =============================================================================

/// Configuration loaded from config.toml
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub business: BusinessConfig,
    #[serde(default)]
    pub reports: ReportsConfig,
}

/// Business identity printed on documents
#[derive(Debug, Default, Deserialize)]
pub struct BusinessConfig {
    /// Company name (title block of the master summary, running headers)
    #[serde(default)]
    pub name: Option<String>,
    /// Author line on detail reports; defaults to the company name
    #[serde(default)]
    pub author: Option<String>,
}

/// Report output settings
#[derive(Debug, Default, Deserialize)]
pub struct ReportsConfig {
    /// Directory generated documents are written to
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

impl FileConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::parse(&content)
    }

    /// Load configuration, or defaults when the file doesn't exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).with_context(|| {
            "Failed to parse config.toml. Check for:\n\
             - Invalid TOML syntax (missing quotes, brackets, etc.)\n\
             - Incorrect data types (business.name and business.author are strings)\n\n\
             See config.toml.example for the expected format."
        })
    }
}

// =============================================================================
// Runtime Configuration
// =============================================================================

/// Main configuration struct with resolved values
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub business_name: String,
    pub author: String,
    /// Directory holding the record database
    pub data_dir: PathBuf,
    /// Directory generated documents are written to
    pub output_dir: PathBuf,
}

impl Config {
    /// Resolve file config against command-line overrides
    pub fn from_file(
        file_config: &FileConfig,
        data_dir: PathBuf,
        output_dir: Option<PathBuf>,
    ) -> Result<Self> {
        let business_name = match file_config.business.name.as_deref().map(str::trim) {
            Some("") => bail!("business.name in config.toml must not be empty"),
            Some(name) => name.to_string(),
            None => constants::DEFAULT_BUSINESS_NAME.to_string(),
        };

        let author = file_config
            .business
            .author
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| business_name.clone());

        // CLI flag wins, then config.toml, then <data-dir>/reports
        let output_dir = output_dir
            .or_else(|| file_config.reports.output_dir.clone())
            .unwrap_or_else(|| data_dir.join("reports"));

        Ok(Self {
            business_name,
            author,
            data_dir,
            output_dir,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(constants::DATABASE_FILENAME)
    }

    /// Settings for a report generated on `date`
    pub fn report_settings(&self, date: NaiveDate) -> ReportSettings {
        ReportSettings {
            business_name: self.business_name.clone(),
            author: self.author.clone(),
            generated_on: date,
        }
    }
}
