use chrono::{Duration, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::{cell_text, parse_posted};
use crate::table::{JobTable, Row};

/// Whether any or every keyword has to appear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    #[default]
    Any,
    All,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleMatch {
    Exact,
    #[default]
    Substring,
}

/// Filter chain settings. Empty lists and `None` switch a stage off.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    pub days_back: Option<u32>,
    pub keywords_in_description: Vec<String>,
    pub description_match_mode: MatchMode,
    pub negatives_in_description: Vec<String>,
    #[serde(alias = "title_keywords")]
    pub title_allow: Vec<String>,
    pub title_match_mode: TitleMatch,
    pub negatives_in_title: Vec<String>,
    #[serde(alias = "country_list")]
    pub country_allow: Vec<String>,
}

/// Run every stage in order against the current local time.
pub fn apply_filters(table: &JobTable, params: &FilterParams) -> JobTable {
    apply_filters_at(table, params, Local::now().naive_local())
}

pub fn apply_filters_at(table: &JobTable, params: &FilterParams, now: NaiveDateTime) -> JobTable {
    let filtered = filter_by_date_posted(table, params.days_back, now);
    let filtered = filter_by_keywords(
        &filtered,
        "description",
        &params.keywords_in_description,
        params.description_match_mode,
    );
    let filtered =
        filter_out_phrases(&filtered, "description", &params.negatives_in_description);
    let filtered = filter_by_values(
        &filtered,
        "title",
        &params.title_allow,
        params.title_match_mode == TitleMatch::Substring,
    );
    let filtered = filter_out_phrases(&filtered, "title", &params.negatives_in_title);
    let filtered = filter_by_values(&filtered, "country", &params.country_allow, false);

    tracing::debug!(before = table.len(), after = filtered.len(), "Applied filters");
    filtered
}

/// Keep rows posted on or after `now - days_back`. Unparseable dates are dropped.
pub fn filter_by_date_posted(
    table: &JobTable,
    days_back: Option<u32>,
    now: NaiveDateTime,
) -> JobTable {
    let Some(days) = days_back else {
        return table.clone();
    };
    if !table.has_column("date_posted") {
        return table.clone();
    }

    let cutoff = now - Duration::days(days as i64);
    table.filter_rows(|row| {
        row.get("date_posted")
            .and_then(parse_posted)
            .is_some_and(|posted| posted >= cutoff)
    })
}

pub fn filter_by_keywords(
    table: &JobTable,
    column: &str,
    keywords: &[String],
    mode: MatchMode,
) -> JobTable {
    if keywords.is_empty() || !table.has_column(column) {
        return table.clone();
    }

    let keywords = lowercased(keywords);
    table.filter_rows(|row| {
        let text = lower_cell(row, column);
        match mode {
            MatchMode::Any => keywords.iter().any(|kw| text.contains(kw.as_str())),
            MatchMode::All => keywords.iter().all(|kw| text.contains(kw.as_str())),
        }
    })
}

/// Drop rows whose `column` contains any of `negatives`.
pub fn filter_out_phrases(table: &JobTable, column: &str, negatives: &[String]) -> JobTable {
    if negatives.is_empty() || !table.has_column(column) {
        return table.clone();
    }

    let negatives = lowercased(negatives);
    table.filter_rows(|row| {
        let text = lower_cell(row, column);
        !negatives.iter().any(|neg| text.contains(neg.as_str()))
    })
}

/// Keep rows whose `column` equals (or, with `partial`, contains) one of `values`.
pub fn filter_by_values(
    table: &JobTable,
    column: &str,
    values: &[String],
    partial: bool,
) -> JobTable {
    if values.is_empty() || !table.has_column(column) {
        return table.clone();
    }

    let values = lowercased(values);
    table.filter_rows(|row| {
        let Some(text) = row.get(column).and_then(cell_text) else {
            return false;
        };
        let text = text.to_lowercase();
        if partial {
            values.iter().any(|v| text.contains(v.as_str()))
        } else {
            values.iter().any(|v| *v == text)
        }
    })
}

/// Cut text cells longer than `max_length` characters and append "...".
pub fn truncate_column(table: &JobTable, column: &str, max_length: usize) -> JobTable {
    table.map_column(column, |cell| match cell.as_str() {
        Some(text) if text.chars().count() > max_length => {
            let mut cut: String = text.chars().take(max_length).collect();
            cut.push_str("...");
            serde_json::Value::String(cut)
        }
        _ => cell.clone(),
    })
}

fn lowercased(items: &[String]) -> Vec<String> {
    items.iter().map(|item| item.to_lowercase()).collect()
}

fn lower_cell(row: &Row, column: &str) -> String {
    row.get(column)
        .and_then(cell_text)
        .map(|text| text.to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, NaiveDate};
    use serde_json::{Value, json};

    fn table(rows: Value) -> JobTable {
        JobTable::from_rows(
            rows.as_array()
                .unwrap()
                .iter()
                .map(|r| r.as_object().cloned().unwrap())
                .collect(),
        )
    }

    fn titles(table: &JobTable) -> Vec<String> {
        table
            .rows()
            .iter()
            .map(|r| r["title"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn sample() -> JobTable {
        table(json!([
            {"title": "Rust Developer", "description": "Fully remote, async Rust", "country": "usa", "date_posted": "2026-10-19"},
            {"title": "Senior Backend Engineer", "description": "Remote, hybrid OK", "country": "uk", "date_posted": "2026-10-10"},
            {"title": "Cashier", "description": "Onsite cashier", "country": "Canada", "date_posted": "not a date"},
            {"title": "Web developer", "description": null, "country": "usa", "date_posted": null}
        ]))
    }

    #[test]
    fn test_keyword_any() {
        let t = table(json!([
            {"title": "a", "description": "Remote engineer"},
            {"title": "b", "description": "Onsite cashier"}
        ]));
        let out = filter_by_keywords(&t, "description", &strings(&["remote"]), MatchMode::Any);
        assert_eq!(titles(&out), vec!["a"]);
    }

    #[test]
    fn test_keyword_all() {
        let t = sample();
        let out = filter_by_keywords(
            &t,
            "description",
            &strings(&["REMOTE", "rust"]),
            MatchMode::All,
        );
        assert_eq!(titles(&out), vec!["Rust Developer"]);

        let out = filter_by_keywords(&t, "description", &strings(&["REMOTE", "rust"]), MatchMode::Any);
        assert_eq!(titles(&out), vec!["Rust Developer", "Senior Backend Engineer"]);
    }

    #[test]
    fn test_negative_phrases() {
        let t = table(json!([
            {"title": "a", "description": "Remote, hybrid OK"},
            {"title": "b", "description": "Fully remote"}
        ]));
        let out = filter_out_phrases(&t, "description", &strings(&["hybrid"]));
        assert_eq!(titles(&out), vec!["b"]);
    }

    #[test]
    fn test_negative_phrases_keep_missing_text() {
        let out = filter_out_phrases(&sample(), "description", &strings(&["Onsite"]));
        assert_eq!(titles(&out), vec!["Rust Developer", "Senior Backend Engineer", "Web developer"]);
    }

    #[test]
    fn test_title_substring_and_exact() {
        let t = sample();
        let out = filter_by_values(&t, "title", &strings(&["developer"]), true);
        assert_eq!(titles(&out), vec!["Rust Developer", "Web developer"]);

        let out = filter_by_values(&t, "title", &strings(&["developer"]), false);
        assert!(out.is_empty());

        let out = filter_by_values(&t, "title", &strings(&["web DEVELOPER"]), false);
        assert_eq!(titles(&out), vec!["Web developer"]);
    }

    #[test]
    fn test_country_allow_is_exact() {
        let t = sample();
        let out = filter_by_values(&t, "country", &strings(&["USA", "canada"]), false);
        assert_eq!(titles(&out), vec!["Rust Developer", "Cashier", "Web developer"]);

        let out = filter_by_values(&t, "country", &strings(&["us"]), false);
        assert!(out.is_empty());
    }

    #[test]
    fn test_date_posted_window() {
        let t = sample();
        let out = filter_by_date_posted(&t, Some(1), now());
        assert_eq!(titles(&out), vec!["Rust Developer"]);

        let out = filter_by_date_posted(&t, Some(10), now());
        assert_eq!(titles(&out), vec!["Rust Developer", "Senior Backend Engineer"]);

        let out = filter_by_date_posted(&t, None, now());
        assert_eq!(out, t);
    }

    #[test]
    fn test_date_posted_cutoff_is_inclusive() {
        let t = table(json!([
            {"title": "edge", "date_posted": "2026-10-18T12:00:00"},
            {"title": "late", "date_posted": "2026-10-18T11:59:59"}
        ]));
        let out = filter_by_date_posted(&t, Some(1), now());
        assert_eq!(titles(&out), vec!["edge"]);
    }

    #[test]
    fn test_date_posted_epoch_millis_compare_in_local_time() {
        let now_ms: i64 = 1_792_324_800_000;
        let hour_ms: i64 = 3_600_000;
        let now = DateTime::from_timestamp_millis(now_ms)
            .unwrap()
            .with_timezone(&Local)
            .naive_local();
        let t = table(json!([
            {"title": "fresh", "date_posted": now_ms - 12 * hour_ms},
            {"title": "stale", "date_posted": now_ms - 36 * hour_ms}
        ]));
        let out = filter_by_date_posted(&t, Some(1), now);
        assert_eq!(titles(&out), vec!["fresh"]);
    }

    #[test]
    fn test_stages_are_identity_when_unconfigured() {
        let t = sample();
        assert_eq!(filter_by_date_posted(&t, None, now()), t);
        assert_eq!(filter_by_keywords(&t, "description", &[], MatchMode::All), t);
        assert_eq!(filter_out_phrases(&t, "description", &[]), t);
        assert_eq!(filter_by_values(&t, "title", &[], true), t);
        assert_eq!(filter_by_values(&t, "country", &[], false), t);
        assert_eq!(apply_filters_at(&t, &FilterParams::default(), now()), t);
    }

    #[test]
    fn test_stages_are_identity_when_column_missing() {
        let t = table(json!([{"title": "no other columns"}]));
        let words = strings(&["remote"]);
        assert_eq!(filter_by_date_posted(&t, Some(1), now()), t);
        assert_eq!(filter_by_keywords(&t, "description", &words, MatchMode::Any), t);
        assert_eq!(filter_out_phrases(&t, "description", &words), t);
        assert_eq!(filter_by_values(&t, "country", &words, false), t);
        assert_eq!(truncate_column(&t, "description", 3), t);
    }

    #[test]
    fn test_stages_are_idempotent() {
        let t = sample();
        let params = FilterParams {
            days_back: Some(30),
            keywords_in_description: strings(&["remote"]),
            negatives_in_description: strings(&["hybrid"]),
            title_allow: strings(&["developer", "engineer"]),
            negatives_in_title: strings(&["senior"]),
            country_allow: strings(&["usa", "uk"]),
            ..FilterParams::default()
        };
        let once = apply_filters_at(&t, &params, now());
        let twice = apply_filters_at(&once, &params, now());
        assert_eq!(once, twice);
        assert_eq!(titles(&once), vec!["Rust Developer"]);

        let words = strings(&["remote"]);
        let k = filter_by_keywords(&t, "description", &words, MatchMode::Any);
        assert_eq!(filter_by_keywords(&k, "description", &words, MatchMode::Any), k);
        let n = filter_out_phrases(&t, "title", &strings(&["senior"]));
        assert_eq!(filter_out_phrases(&n, "title", &strings(&["senior"])), n);
    }

    #[test]
    fn test_title_exclusion() {
        let out = filter_out_phrases(&sample(), "title", &strings(&["SENIOR", "cashier"]));
        assert_eq!(titles(&out), vec!["Rust Developer", "Web developer"]);
    }

    #[test]
    fn test_apply_filters_does_not_touch_input() {
        let t = sample();
        let params = FilterParams {
            negatives_in_description: strings(&["hybrid"]),
            ..FilterParams::default()
        };
        let out = apply_filters_at(&t, &params, now());
        assert_eq!(out.len(), 3);
        assert_eq!(t.len(), 4);
    }

    #[test]
    fn test_truncate_column() {
        let t = table(json!([
            {"description": "abcdefghijk"},
            {"description": "short"},
            {"description": "abcdefghij"},
            {"description": null}
        ]));
        let out = truncate_column(&t, "description", 10);
        let values: Vec<Value> = out.rows().iter().map(|r| r["description"].clone()).collect();
        assert_eq!(
            values,
            vec![json!("abcdefghij..."), json!("short"), json!("abcdefghij"), Value::Null]
        );
    }

    #[test]
    fn test_truncate_counts_characters() {
        let t = table(json!([{"description": "teletrabajo híbrido"}]));
        let out = truncate_column(&t, "description", 13);
        assert_eq!(out.rows()[0]["description"], json!("teletrabajo h..."));
    }

    #[test]
    fn test_params_accept_legacy_keys() {
        let params: FilterParams = serde_json::from_value(json!({
            "days_back": 1,
            "title_keywords": ["developer"],
            "country_list": ["usa"],
            "description_match_mode": "all",
            "title_match_mode": "exact"
        }))
        .unwrap();
        assert_eq!(params.days_back, Some(1));
        assert_eq!(params.title_allow, strings(&["developer"]));
        assert_eq!(params.country_allow, strings(&["usa"]));
        assert_eq!(params.description_match_mode, MatchMode::All);
        assert_eq!(params.title_match_mode, TitleMatch::Exact);
        assert!(params.keywords_in_description.is_empty());
    }
}
