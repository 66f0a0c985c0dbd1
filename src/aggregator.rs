use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{Level, debug, error, info, trace, warn};

use crate::country::Country;
use crate::error::FetchError;
use crate::fetch::{FetchQuery, JobFetcher};
use crate::models::{CompensationInterval, JobType, Site, cell_text};
use crate::table::{JobTable, Row};

/// Columns kept from every fetched segment.
pub const OUTPUT_COLUMNS: [&str; 9] = [
    "title",
    "job_type",
    "interval",
    "min_amount",
    "max_amount",
    "job_url",
    "description",
    "date_posted",
    "country",
];

pub const COUNTRY_COLUMN: &str = "country";

#[derive(Debug, Clone)]
pub struct AggregatorConfig {
    pub sites: Vec<Site>,
    /// Matched case-insensitively against each country's primary alias.
    pub exclude_countries: Vec<String>,
    pub results_wanted: usize,
    /// Maximum fetches in flight at once.
    pub concurrency: usize,
    /// Everything else passed through to the fetcher. `results_wanted` above wins.
    pub query: FetchQuery,
    /// Level at which per-task failures are logged.
    pub failure_level: Level,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            sites: vec![Site::Indeed, Site::Glassdoor, Site::ZipRecruiter],
            exclude_countries: vec!["venezuela".to_string()],
            results_wanted: 20,
            concurrency: 5,
            query: FetchQuery::default(),
            failure_level: Level::WARN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Task {
    pub country: Country,
    pub site: Site,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentReport {
    pub task: Task,
    pub rows: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationReport {
    pub tasks: usize,
    pub failed: usize,
    /// One entry per finished task, in completion order.
    pub segments: Vec<SegmentReport>,
}

impl AggregationReport {
    pub fn total_rows(&self) -> usize {
        self.segments.iter().map(|s| s.rows).sum()
    }
}

#[derive(Debug, Clone)]
pub struct Aggregation {
    pub table: JobTable,
    pub report: AggregationReport,
}

/// Fans (country, site) fetches out over a bounded pool and merges the results.
pub struct Aggregator {
    fetcher: Arc<dyn JobFetcher>,
    config: AggregatorConfig,
}

struct Accumulator {
    segments: Vec<JobTable>,
    report: AggregationReport,
}

impl Aggregator {
    pub fn new(fetcher: Arc<dyn JobFetcher>, config: AggregatorConfig) -> Self {
        Self { fetcher, config }
    }

    /// Countries left after exclusions, in enumeration order.
    pub fn countries(&self) -> Vec<Country> {
        let excluded: Vec<String> = self
            .config
            .exclude_countries
            .iter()
            .map(|c| c.trim().to_lowercase())
            .collect();
        Country::ALL
            .iter()
            .copied()
            .filter(|country| !excluded.iter().any(|e| e == country.primary_alias()))
            .collect()
    }

    /// The task grid: countries in enumeration order, each crossed with the
    /// configured sites in their given order.
    pub fn tasks(&self) -> Vec<Task> {
        let mut sites: Vec<Site> = Vec::new();
        for site in &self.config.sites {
            if !sites.contains(site) {
                sites.push(*site);
            }
        }
        self.countries()
            .into_iter()
            .flat_map(|country| sites.iter().map(move |&site| Task { country, site }))
            .collect()
    }

    /// Merged table of every task. Failed tasks contribute nothing.
    #[allow(dead_code)]
    pub async fn collect(&self) -> JobTable {
        self.run().await.table
    }

    pub async fn run(&self) -> Aggregation {
        let tasks = self.tasks();
        let query = Arc::new(FetchQuery {
            results_wanted: self.config.results_wanted,
            ..self.config.query.clone()
        });
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let accumulator = Arc::new(Mutex::new(Accumulator {
            segments: Vec::new(),
            report: AggregationReport {
                tasks: tasks.len(),
                ..AggregationReport::default()
            },
        }));

        info!(
            tasks = tasks.len(),
            concurrency = self.config.concurrency.max(1),
            "Starting aggregation"
        );

        let mut set = JoinSet::new();
        let mut spawned: HashMap<tokio::task::Id, Task> = HashMap::new();
        for task in tasks {
            let fetcher = Arc::clone(&self.fetcher);
            let semaphore = Arc::clone(&semaphore);
            let accumulator = Arc::clone(&accumulator);
            let query = Arc::clone(&query);
            let failure_level = self.config.failure_level;

            let handle = set.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                let outcome = fetcher.fetch(task.site, task.country, &query).await;

                let (segment, error) = match outcome {
                    Ok(raw) => (normalize_segment(raw, task.country), None),
                    Err(e) => {
                        log_failure(failure_level, &task, &e);
                        (JobTable::default(), Some(e.to_string()))
                    }
                };

                let mut acc = accumulator.lock().await;
                let rows = segment.len();
                acc.report.segments.push(SegmentReport { task, rows, error });
                if !segment.is_empty() {
                    acc.segments.push(segment);
                }
                let total = acc.report.total_rows();
                info!(
                    site = %task.site,
                    country = %task.country,
                    rows,
                    total,
                    "Analyzed {} - {}",
                    task.site,
                    task.country
                );
            });
            spawned.insert(handle.id(), task);
        }

        let mut panicked: Vec<Task> = Vec::new();
        while let Some(joined) = set.join_next_with_id().await {
            if let Err(e) = joined {
                if let Some(task) = spawned.get(&e.id()) {
                    let failure = FetchError::Adapter(format!("fetch task aborted: {}", e));
                    log_failure(self.config.failure_level, task, &failure);
                    panicked.push(*task);
                }
            }
        }

        let mut acc = accumulator.lock().await;
        for task in panicked {
            acc.report.segments.push(SegmentReport {
                task,
                rows: 0,
                error: Some("fetch task aborted".to_string()),
            });
        }
        let failed = acc.report.segments.iter().filter(|s| s.error.is_some()).count();
        acc.report.failed = failed;

        let table = JobTable::concat(std::mem::take(&mut acc.segments));
        let report = std::mem::take(&mut acc.report);

        info!(
            tasks = report.tasks,
            total = table.len(),
            columns = table.columns().len(),
            failed = report.failed,
            excluded = ?self.config.exclude_countries,
            "Aggregation finished"
        );

        Aggregation { table, report }
    }
}

/// Tag with the dispatch country, keep the output columns, drop rows that
/// are not jobs (no title or URL), canonicalise interval and job type cells,
/// and drop rows and columns with no data.
pub fn normalize_segment(raw: JobTable, country: Country) -> JobTable {
    let mut tagged = raw;
    tagged.set_column(COUNTRY_COLUMN, Value::String(country.primary_alias().to_string()));

    let mut segment = tagged
        .project(&OUTPUT_COLUMNS)
        .filter_rows(|row| has_text(row, "title") && has_text(row, "job_url"))
        .map_column("interval", normalize_interval)
        .map_column("job_type", normalize_job_type);
    segment.drop_empty_rows(&[COUNTRY_COLUMN]);
    segment.drop_null_columns();
    segment
}

fn has_text(row: &Row, column: &str) -> bool {
    row.get(column).and_then(cell_text).is_some()
}

fn normalize_interval(cell: &Value) -> Value {
    match cell {
        Value::String(raw) => match raw.parse::<CompensationInterval>() {
            Ok(interval) => Value::String(interval.as_str().to_string()),
            Err(_) => cell.clone(),
        },
        _ => cell.clone(),
    }
}

fn normalize_job_type(cell: &Value) -> Value {
    let canonical = |raw: &str| match JobType::from_surface(raw) {
        Some(job_type) => job_type.as_str().to_string(),
        None => raw.to_string(),
    };
    match cell {
        Value::String(raw) => Value::String(
            raw.split(',')
                .map(|part| canonical(part.trim()))
                .collect::<Vec<_>>()
                .join(", "),
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| match item {
                    Value::String(raw) => Value::String(canonical(raw)),
                    other => other.clone(),
                })
                .collect(),
        ),
        _ => cell.clone(),
    }
}

fn log_failure(level: Level, task: &Task, err: &FetchError) {
    let (site, country) = (task.site, task.country);
    if level == Level::ERROR {
        error!(%site, %country, error = %err, "Fetch failed, skipping");
    } else if level == Level::WARN {
        warn!(%site, %country, error = %err, "Fetch failed, skipping");
    } else if level == Level::INFO {
        info!(%site, %country, error = %err, "Fetch failed, skipping");
    } else if level == Level::DEBUG {
        debug!(%site, %country, error = %err, "Fetch failed, skipping");
    } else {
        trace!(%site, %country, error = %err, "Fetch failed, skipping");
    }
}
