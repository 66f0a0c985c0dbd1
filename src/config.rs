use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::Level;

use crate::aggregator::AggregatorConfig;
use crate::fetch::FetchQuery;
use crate::filters::FilterParams;
use crate::models::{DescriptionFormat, Site};

pub const FETCH_URL_ENV: &str = "JOBSWEEP_FETCH_URL";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    #[default]
    Http,
    Dir,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperSettings {
    pub sites: Vec<Site>,
    pub exclude_countries: Vec<String>,
    pub results_wanted: usize,
    pub concurrency: usize,
    pub verbose: u8,
    pub search_term: Option<String>,
    pub location: Option<String>,
    pub distance: Option<u32>,
    pub is_remote: bool,
    pub hours_old: Option<u32>,
    pub description_format: DescriptionFormat,
    pub adapter: AdapterKind,
    pub fetch_url: String,
    pub fetch_dir: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for ScraperSettings {
    fn default() -> Self {
        Self {
            sites: vec![Site::Indeed, Site::Glassdoor, Site::ZipRecruiter],
            exclude_countries: vec!["venezuela".to_string()],
            results_wanted: 20,
            concurrency: 5,
            verbose: 0,
            search_term: None,
            location: None,
            distance: Some(50),
            is_remote: false,
            hours_old: None,
            description_format: DescriptionFormat::Markdown,
            adapter: AdapterKind::Http,
            fetch_url: "http://localhost:8000/".to_string(),
            fetch_dir: None,
            timeout_secs: 60,
        }
    }
}

impl ScraperSettings {
    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            sites: self.sites.clone(),
            exclude_countries: self.exclude_countries.clone(),
            results_wanted: self.results_wanted,
            concurrency: self.concurrency,
            query: FetchQuery {
                results_wanted: self.results_wanted,
                search_term: self.search_term.clone(),
                location: self.location.clone(),
                distance: self.distance,
                is_remote: self.is_remote,
                hours_old: self.hours_old,
                description_format: self.description_format,
                verbose: self.verbose,
                ..FetchQuery::default()
            },
            failure_level: if self.verbose > 0 { Level::WARN } else { Level::DEBUG },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub truncate_column: String,
    pub max_length: usize,
    pub page_size: usize,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            truncate_column: "description".to_string(),
            max_length: 77,
            page_size: 10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scraper: ScraperSettings,
    pub filters: FilterParams,
    pub display: DisplaySettings,
}

impl Config {
    pub fn default_path() -> PathBuf {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "jobsweep") {
            proj_dirs.config_dir().join("jobsweep.toml")
        } else {
            PathBuf::from("jobsweep.toml")
        }
    }

    /// Load from `path`, or from the default location when `None`.
    /// A missing default file yields the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None => {
                let path = Self::default_path();
                if path.exists() {
                    Self::read(&path)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(url) = std::env::var(FETCH_URL_ENV) {
            config.scraper.fetch_url = url;
        }
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}
