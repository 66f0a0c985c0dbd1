use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::country::Country;
use crate::error::ParseEnumError;
use crate::table::Row;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Site {
    Linkedin,
    Indeed,
    ZipRecruiter,
    Glassdoor,
    Google,
}

impl Site {
    pub const ALL: [Site; 5] = [
        Site::Linkedin,
        Site::Indeed,
        Site::ZipRecruiter,
        Site::Glassdoor,
        Site::Google,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Site::Linkedin => "linkedin",
            Site::Indeed => "indeed",
            Site::ZipRecruiter => "zip_recruiter",
            Site::Glassdoor => "glassdoor",
            Site::Google => "google",
        }
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Site {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Site::ALL
            .into_iter()
            .find(|site| site.as_str() == wanted)
            .ok_or_else(|| ParseEnumError::new("site", s, &Site::ALL.map(Site::as_str)))
    }
}

/// Employment category. Each carries the locale-specific spellings job boards
/// use for it, normalised (lowercase, no spaces or dashes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Temporary,
    Internship,
    PerDiem,
    Nights,
    Other,
    Summer,
    Volunteer,
}

impl JobType {
    pub const ALL: [JobType; 10] = [
        JobType::FullTime,
        JobType::PartTime,
        JobType::Contract,
        JobType::Temporary,
        JobType::Internship,
        JobType::PerDiem,
        JobType::Nights,
        JobType::Other,
        JobType::Summer,
        JobType::Volunteer,
    ];

    pub fn surfaces(self) -> &'static [&'static str] {
        match self {
            JobType::FullTime => &[
                "fulltime",
                "períodointegral",
                "estágio/trainee",
                "cunormăîntreagă",
                "tiempocompleto",
                "vollzeit",
                "voltijds",
                "tempointegral",
                "全职",
                "plnýúvazek",
                "fuldtid",
                "دوامكامل",
                "kokopäivätyö",
                "tempsplein",
                "πλήρηςαπασχόληση",
                "teljesmunkaidő",
                "tempopieno",
                "heltid",
                "jornadacompleta",
                "pełnyetat",
                "정규직",
                "100%",
                "全職",
                "งานประจำ",
                "tamzamanlı",
                "повназайнятість",
                "toànthờigian",
            ],
            JobType::PartTime => &["parttime", "teilzeit", "částečnýúvazek", "deltid"],
            JobType::Contract => &["contract", "contractor"],
            JobType::Temporary => &["temporary"],
            JobType::Internship => &[
                "internship",
                "prácticas",
                "ojt(onthejobtraining)",
                "praktikum",
                "praktik",
            ],
            JobType::PerDiem => &["perdiem"],
            JobType::Nights => &["nights"],
            JobType::Other => &["other"],
            JobType::Summer => &["summer"],
            JobType::Volunteer => &["volunteer"],
        }
    }

    /// Canonical tag, the first surface string.
    pub fn as_str(self) -> &'static str {
        self.surfaces()[0]
    }

    /// Match raw board text such as "Full-time" or "Tiempo completo".
    pub fn from_surface(raw: &str) -> Option<JobType> {
        let key: String = raw
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        if key.is_empty() {
            return None;
        }
        JobType::ALL
            .into_iter()
            .find(|job_type| job_type.surfaces().contains(&key.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompensationInterval {
    Yearly,
    Monthly,
    Weekly,
    Daily,
    Hourly,
}

impl CompensationInterval {
    pub const ALL: [CompensationInterval; 5] = [
        CompensationInterval::Yearly,
        CompensationInterval::Monthly,
        CompensationInterval::Weekly,
        CompensationInterval::Daily,
        CompensationInterval::Hourly,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CompensationInterval::Yearly => "yearly",
            CompensationInterval::Monthly => "monthly",
            CompensationInterval::Weekly => "weekly",
            CompensationInterval::Daily => "daily",
            CompensationInterval::Hourly => "hourly",
        }
    }

    /// Boards report pay periods as "YEAR", "HOUR" or a member name ("MONTHLY").
    pub fn from_pay_period(period: &str) -> Option<CompensationInterval> {
        match period {
            "YEAR" => Some(CompensationInterval::Yearly),
            "HOUR" => Some(CompensationInterval::Hourly),
            other => CompensationInterval::ALL
                .into_iter()
                .find(|interval| interval.as_str().to_uppercase() == other),
        }
    }
}

impl FromStr for CompensationInterval {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        CompensationInterval::ALL
            .into_iter()
            .find(|interval| interval.as_str() == wanted)
            .or_else(|| CompensationInterval::from_pay_period(s.trim()))
            .ok_or_else(|| {
                ParseEnumError::new(
                    "interval",
                    s,
                    &CompensationInterval::ALL.map(CompensationInterval::as_str),
                )
            })
    }
}

pub const DEFAULT_CURRENCY: &str = "USD";

/// Pay range as reported by the board. `min_amount > max_amount` is not rejected here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compensation {
    pub interval: Option<CompensationInterval>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub currency: String,
}

impl Default for Compensation {
    fn default() -> Self {
        Self {
            interval: None,
            min_amount: None,
            max_amount: None,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptionFormat {
    #[default]
    Markdown,
    Html,
}

impl DescriptionFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            DescriptionFormat::Markdown => "markdown",
            DescriptionFormat::Html => "html",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocationCountry {
    Known(Country),
    Other(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub country: Option<LocationCountry>,
    pub city: Option<String>,
    pub state: Option<String>,
}

impl Location {
    pub fn display_location(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(city) = self.city.as_deref().filter(|c| !c.is_empty()) {
            parts.push(city.to_string());
        }
        if let Some(state) = self.state.as_deref().filter(|s| !s.is_empty()) {
            parts.push(state.to_string());
        }
        match &self.country {
            Some(LocationCountry::Other(name)) if !name.is_empty() => parts.push(name.clone()),
            Some(LocationCountry::Known(country)) if !country.is_sentinel() => {
                parts.push(country.display_name())
            }
            _ => {}
        }
        parts.join(", ")
    }
}

/// One normalised listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPost {
    pub id: Option<String>,
    pub title: String,
    pub company_name: Option<String>,
    pub job_url: String,
    pub job_url_direct: Option<String>,
    pub location: Option<Location>,
    pub description: Option<String>,
    pub company_url: Option<String>,
    pub company_url_direct: Option<String>,
    pub job_type: Option<Vec<JobType>>,
    pub compensation: Option<Compensation>,
    pub date_posted: Option<NaiveDate>,
    pub emails: Option<Vec<String>>,
    pub is_remote: Option<bool>,
    pub listing_type: Option<String>,
    pub job_level: Option<String>,
    pub job_function: Option<String>,
    pub company_industry: Option<String>,
    pub company_addresses: Option<String>,
    pub company_num_employees: Option<String>,
    pub company_revenue: Option<String>,
    pub company_description: Option<String>,
    pub company_logo: Option<String>,
    pub banner_photo_url: Option<String>,
}

impl JobPost {
    /// Build a record from a table row. Rows without a title or URL are not jobs.
    pub fn from_row(row: &Row) -> Option<JobPost> {
        let title = text(row, "title")?;
        let job_url = text(row, "job_url")?;

        let location = match row.get("location") {
            Some(Value::Object(obj)) => serde_json::from_value(Value::Object(obj.clone())).ok(),
            _ => {
                let location = Location {
                    country: text(row, "country").map(|name| match Country::from_alias(&name) {
                        Ok(country) => LocationCountry::Known(country),
                        Err(_) => LocationCountry::Other(name),
                    }),
                    city: text(row, "city"),
                    state: text(row, "state"),
                };
                (location != Location::default()).then_some(location)
            }
        };

        let interval = text(row, "interval").and_then(|i| i.parse().ok());
        let min_amount = row.get("min_amount").and_then(Value::as_f64);
        let max_amount = row.get("max_amount").and_then(Value::as_f64);
        let compensation = (interval.is_some() || min_amount.is_some() || max_amount.is_some())
            .then(|| Compensation {
                interval,
                min_amount,
                max_amount,
                currency: text(row, "currency").unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
            });

        let job_type = row.get("job_type").and_then(|value| {
            let types: Vec<JobType> = text_list(value)
                .iter()
                .filter_map(|raw| JobType::from_surface(raw))
                .collect();
            (!types.is_empty()).then_some(types)
        });

        Some(JobPost {
            id: text(row, "id"),
            title,
            company_name: text(row, "company_name").or_else(|| text(row, "company")),
            job_url,
            job_url_direct: text(row, "job_url_direct"),
            location,
            description: text(row, "description"),
            company_url: text(row, "company_url"),
            company_url_direct: text(row, "company_url_direct"),
            job_type,
            compensation,
            date_posted: row
                .get("date_posted")
                .and_then(parse_posted)
                .map(|dt| dt.date()),
            emails: row.get("emails").map(text_list).filter(|e| !e.is_empty()),
            is_remote: row.get("is_remote").and_then(Value::as_bool),
            listing_type: text(row, "listing_type"),
            job_level: text(row, "job_level"),
            job_function: text(row, "job_function"),
            company_industry: text(row, "company_industry"),
            company_addresses: text(row, "company_addresses"),
            company_num_employees: text(row, "company_num_employees"),
            company_revenue: text(row, "company_revenue"),
            company_description: text(row, "company_description"),
            company_logo: text(row, "company_logo"),
            banner_photo_url: text(row, "banner_photo_url"),
        })
    }
}

/// Text form of a cell, `None` for null or blank.
pub fn cell_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .filter_map(cell_text)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    };
    (!text.trim().is_empty()).then_some(text)
}

fn text(row: &Row, column: &str) -> Option<String> {
    row.get(column).and_then(cell_text)
}

fn text_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(cell_text).collect(),
        other => cell_text(other)
            .map(|s| s.split(',').map(|part| part.trim().to_string()).collect())
            .unwrap_or_default(),
    }
}

/// Interpret a `date_posted` cell. Accepts ISO dates, ISO datetimes (with or
/// without offset) and epoch milliseconds. Everything lands in local time; plain dates on midnight.
pub fn parse_posted(value: &Value) -> Option<NaiveDateTime> {
    match value {
        Value::String(raw) => {
            let raw = raw.trim();
            if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                return date.and_hms_opt(0, 0, 0);
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
                return Some(dt.with_timezone(&Local).naive_local());
            }
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        }
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .map(|dt| dt.with_timezone(&Local).naive_local()),
        _ => None,
    }
}
