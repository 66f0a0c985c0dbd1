use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use crate::country::Country;
use crate::error::FetchError;
use crate::models::{DescriptionFormat, JobType, Site};
use crate::table::{JobTable, Row};

/// Source of raw job rows for one (site, country) pair.
///
/// Implementations own board addressing and response parsing.
/// Returned columns are not fixed.
#[async_trait]
pub trait JobFetcher: Send + Sync {
    async fn fetch(
        &self,
        site: Site,
        country: Country,
        query: &FetchQuery,
    ) -> Result<JobTable, FetchError>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchQuery {
    pub results_wanted: usize,
    pub search_term: Option<String>,
    pub google_search_term: Option<String>,
    pub location: Option<String>,
    pub distance: Option<u32>,
    pub is_remote: bool,
    pub job_type: Option<JobType>,
    pub easy_apply: Option<bool>,
    pub offset: usize,
    pub hours_old: Option<u32>,
    pub description_format: DescriptionFormat,
    pub linkedin_fetch_description: bool,
    pub verbose: u8,
}

impl Default for FetchQuery {
    fn default() -> Self {
        Self {
            results_wanted: 15,
            search_term: None,
            google_search_term: None,
            location: None,
            distance: Some(50),
            is_remote: false,
            job_type: None,
            easy_apply: None,
            offset: 0,
            hours_old: None,
            description_format: DescriptionFormat::Markdown,
            linkedin_fetch_description: false,
            verbose: 0,
        }
    }
}

impl FetchQuery {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("results_wanted", self.results_wanted.to_string()),
            ("is_remote", self.is_remote.to_string()),
            ("offset", self.offset.to_string()),
            ("description_format", self.description_format.as_str().to_string()),
            (
                "linkedin_fetch_description",
                self.linkedin_fetch_description.to_string(),
            ),
            ("verbose", self.verbose.to_string()),
        ];
        let optional = [
            ("search_term", self.search_term.clone()),
            ("google_search_term", self.google_search_term.clone()),
            ("location", self.location.clone()),
            ("distance", self.distance.map(|d| d.to_string())),
            ("job_type", self.job_type.map(|t| t.as_str().to_string())),
            ("easy_apply", self.easy_apply.map(|e| e.to_string())),
            ("hours_old", self.hours_old.map(|h| h.to_string())),
        ];
        pairs.extend(
            optional
                .into_iter()
                .filter_map(|(key, value)| value.map(|v| (key, v))),
        );
        pairs
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FetchResponse {
    Rows(Vec<Row>),
    Wrapped { jobs: Vec<Row> },
}

impl FetchResponse {
    fn into_table(self) -> JobTable {
        match self {
            FetchResponse::Rows(rows) | FetchResponse::Wrapped { jobs: rows } => {
                JobTable::from_rows(rows)
            }
        }
    }
}

/// Talks to a JobSpy-compatible scraping service over HTTP.
pub struct HttpFetcher {
    client: Client,
    base_url: Url,
}

impl HttpFetcher {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| FetchError::Adapter(format!("invalid fetch URL '{}': {}", base_url, e)))?;
        let client = Client::builder()
            .user_agent(concat!("jobsweep/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { client, base_url })
    }

    pub fn request_url(
        &self,
        site: Site,
        country: Country,
        query: &FetchQuery,
    ) -> Result<Url, FetchError> {
        let mut url = self
            .base_url
            .join("jobs")
            .map_err(|e| FetchError::Adapter(e.to_string()))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("site", site.as_str());
            pairs.append_pair("country", country.primary_alias());
            for (key, value) in query.query_pairs() {
                pairs.append_pair(key, &value);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl JobFetcher for HttpFetcher {
    async fn fetch(
        &self,
        site: Site,
        country: Country,
        query: &FetchQuery,
    ) -> Result<JobTable, FetchError> {
        if site == Site::Glassdoor {
            country.glassdoor_host()?;
        }
        let url = self.request_url(site, country, query)?;
        debug!(%url, "Requesting jobs");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let parsed: FetchResponse = serde_json::from_str(&body)?;
        Ok(parsed.into_table())
    }
}

/// Reads previously captured results from `<root>/<site>/<country>.json`.
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, site: Site, country: Country) -> PathBuf {
        let file = format!("{}.json", country.primary_alias().replace([' ', '/'], "_"));
        self.root.join(site.as_str()).join(file)
    }
}

#[async_trait]
impl JobFetcher for DirFetcher {
    async fn fetch(
        &self,
        site: Site,
        country: Country,
        query: &FetchQuery,
    ) -> Result<JobTable, FetchError> {
        let path = self.path_for(site, country);
        let raw = tokio::fs::read_to_string(&path).await?;
        let mut rows = match serde_json::from_str::<FetchResponse>(&raw)? {
            FetchResponse::Rows(rows) | FetchResponse::Wrapped { jobs: rows } => rows,
        };
        rows.truncate(query.results_wanted);
        Ok(JobTable::from_rows(rows))
    }
}
