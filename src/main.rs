mod aggregator;
mod config;
mod country;
mod error;
mod fetch;
mod filters;
mod models;
mod table;

use aggregator::Aggregator;
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use config::{AdapterKind, Config};
use country::Country;
use fetch::{DirFetcher, HttpFetcher, JobFetcher};
use models::{Compensation, JobPost, Site};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use table::{JobTable, Row};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jobsweep")]
#[command(about = "Sweep job boards across every supported country and filter the results")]
struct Cli {
    /// Increase log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file (defaults to the platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every (country, site) pair, then filter and list the results
    Run {
        /// Comma separated sites (overrides config)
        #[arg(short, long, value_delimiter = ',')]
        sites: Vec<Site>,

        /// Country to skip, by alias (repeatable, overrides config)
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Results requested per board per country
        #[arg(short, long)]
        results: Option<usize>,

        /// Maximum fetches in flight
        #[arg(long)]
        concurrency: Option<usize>,

        /// Read captured results from this directory instead of the network
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Save the filtered table as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Skip filtering and keep the merged table as fetched
        #[arg(long)]
        raw: bool,

        /// List every row instead of the first page
        #[arg(long)]
        all: bool,
    },

    /// Apply the configured filters to a previously saved table
    Filter {
        /// JSON file holding a saved table or an array of rows
        #[arg(short, long)]
        input: PathBuf,

        /// Save the filtered table as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// List every row instead of the first page
        #[arg(long)]
        all: bool,
    },

    /// List supported countries with their aliases and board domains
    Countries,

    /// Print the effective configuration as TOML
    Config,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            sites,
            exclude,
            results,
            concurrency,
            dir,
            output,
            raw,
            all,
        } => {
            let scraper = &mut config.scraper;
            if !sites.is_empty() {
                scraper.sites = sites;
            }
            if !exclude.is_empty() {
                scraper.exclude_countries = exclude;
            }
            if let Some(results) = results {
                scraper.results_wanted = results;
            }
            if let Some(concurrency) = concurrency {
                scraper.concurrency = concurrency;
            }
            if let Some(dir) = dir {
                scraper.adapter = AdapterKind::Dir;
                scraper.fetch_dir = Some(dir);
            }
            scraper.verbose = scraper.verbose.max(cli.verbose);

            let fetcher = build_fetcher(&config)?;
            let aggregator = Aggregator::new(fetcher, config.scraper.aggregator_config());
            let aggregation = aggregator.run().await;
            let report = &aggregation.report;
            if report.tasks > 0 && report.failed == report.tasks {
                eprintln!("Warning: all {} fetches failed.", report.tasks);
            } else if report.failed > 0 {
                eprintln!(
                    "Warning: {} of {} fetches failed (use -v for details).",
                    report.failed, report.tasks
                );
            }

            let jobs = if raw {
                aggregation.table
            } else {
                filters::apply_filters(&aggregation.table, &config.filters)
            };
            if let Some(path) = output {
                save_table(&jobs, &path)?;
            }
            print_jobs(&jobs, &config, all);
        }

        Commands::Filter { input, output, all } => {
            let table = load_table(&input)?;
            info!(rows = table.len(), path = %input.display(), "Loaded table");
            let jobs = filters::apply_filters(&table, &config.filters);
            if let Some(path) = output {
                save_table(&jobs, &path)?;
            }
            print_jobs(&jobs, &config, all);
        }

        Commands::Countries => {
            println!(
                "{:<22} {:<20} {:<30} {:<30}",
                "COUNTRY", "INDEED", "GLASSDOOR", "ALIASES"
            );
            println!("{}", "-".repeat(104));
            for country in Country::ALL {
                let indeed = country.indeed_domain();
                let indeed = format!("{}.indeed.com ({})", indeed.subdomain, indeed.api_code);
                let glassdoor = country.glassdoor_url().unwrap_or_else(|_| "-".to_string());
                let name = if country.is_sentinel() {
                    format!("{} *", country.display_name())
                } else {
                    country.display_name()
                };
                println!(
                    "{:<22} {:<20} {:<30} {:<30}",
                    truncate(&name, 22),
                    indeed,
                    glassdoor,
                    country.aliases().join(", ")
                );
            }
            println!("\n* dispatch grouping, never shown as a job location");
        }

        Commands::Config => {
            println!("# {}", Config::default_path().display());
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn build_fetcher(config: &Config) -> Result<Arc<dyn JobFetcher>> {
    let scraper = &config.scraper;
    match scraper.adapter {
        AdapterKind::Http => {
            let fetcher = HttpFetcher::new(
                &scraper.fetch_url,
                Duration::from_secs(scraper.timeout_secs),
            )?;
            Ok(Arc::new(fetcher))
        }
        AdapterKind::Dir => {
            let dir = scraper
                .fetch_dir
                .as_ref()
                .ok_or_else(|| anyhow!("adapter = \"dir\" requires fetch_dir to be set"))?;
            Ok(Arc::new(DirFetcher::new(dir)))
        }
    }
}

fn load_table(path: &Path) -> Result<JobTable> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if let Ok(table) = serde_json::from_str::<JobTable>(&content) {
        return Ok(table);
    }
    let rows: Vec<Row> = serde_json::from_str(&content)
        .with_context(|| format!("{} is neither a saved table nor an array of rows", path.display()))?;
    Ok(JobTable::from_rows(rows))
}

fn save_table(table: &JobTable, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(table)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Saved {} job(s) to {}", table.len(), path.display());
    Ok(())
}

fn print_jobs(table: &JobTable, config: &Config, all: bool) {
    let display = &config.display;
    let shown = filters::truncate_column(table, &display.truncate_column, display.max_length);
    let jobs = shown.job_rows();
    if jobs.is_empty() {
        println!("No jobs found.");
        return;
    }
    let limit = if all { jobs.len() } else { display.page_size.min(jobs.len()) };

    println!("Filtered results: {} job(s)\n", jobs.len());
    println!(
        "{:<4} {:<16} {:<36} {:<11} {:>20}",
        "#", "COUNTRY", "TITLE", "POSTED", "PAY"
    );
    println!("{}", "-".repeat(91));
    for (i, (row, job)) in jobs.iter().take(limit).enumerate() {
        let country = country_cell(row, job);
        let posted = job
            .date_posted
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        let pay = job.compensation.as_ref().map(format_pay).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<4} {:<16} {:<36} {:<11} {:>20}",
            i + 1,
            truncate(&country, 16),
            truncate(&job.title, 34),
            posted,
            pay
        );
        println!("     {}", job.job_url);
        if let Some(description) = &job.description {
            println!("     {}", description.replace('\n', " "));
        }
    }
    if limit < jobs.len() {
        println!("\n... {} more (use --all to list everything)", jobs.len() - limit);
    }
}

fn country_cell(row: &Row, job: &JobPost) -> String {
    let tagged = row.get(aggregator::COUNTRY_COLUMN).and_then(|v| v.as_str());
    match tagged {
        Some(alias) => Country::from_alias(alias)
            .map(|c| c.display_name())
            .unwrap_or_else(|_| alias.to_string()),
        None => job
            .location
            .as_ref()
            .map(|l| l.display_location())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| "-".to_string()),
    }
}

fn format_pay(pay: &Compensation) -> String {
    let amount = |v: f64| {
        if v >= 1000.0 {
            format!("{:.0}k", v / 1000.0)
        } else {
            format!("{:.0}", v)
        }
    };
    let range = match (pay.min_amount, pay.max_amount) {
        (Some(min), Some(max)) => format!("{}-{}", amount(min), amount(max)),
        (Some(min), None) => format!("{}+", amount(min)),
        (None, Some(max)) => format!("<{}", amount(max)),
        (None, None) => return "-".to_string(),
    };
    match pay.interval {
        Some(interval) => format!("{} {}/{}", pay.currency, range, interval.as_str()),
        None => format!("{} {}", pay.currency, range),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
