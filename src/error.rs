use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CountryError {
    #[error("Invalid country string: '{alias}'. Valid countries are: {}", .valid.join(", "))]
    InvalidCountry { alias: String, valid: Vec<String> },
}

/// Failure of a single (site, country) fetch. Contained by the aggregator.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{site} is not available for {country}")]
    Unsupported { site: String, country: String },

    #[error("{0}")]
    Adapter(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Unknown {kind} '{value}'. Expected one of: {}", .expected.join(", "))]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
    pub expected: Vec<&'static str>,
}

impl ParseEnumError {
    pub fn new(kind: &'static str, value: &str, expected: &[&'static str]) -> Self {
        Self {
            kind,
            value: value.to_string(),
            expected: expected.to_vec(),
        }
    }
}
