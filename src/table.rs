use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::JobPost;

/// One record. A column missing from the map is absent for that row.
pub type Row = serde_json::Map<String, Value>;

/// Ordered set of named columns plus rows as records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobTable {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl JobTable {
    /// Columns are taken from the rows in first-seen order.
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let mut table = Self::default();
        for row in &rows {
            for key in row.keys() {
                table.add_column(key.clone());
            }
        }
        table.rows = rows;
        table
    }

    /// Concatenate segments, unioning their columns and keeping each segment's row order.
    pub fn concat(segments: impl IntoIterator<Item = JobTable>) -> Self {
        let mut merged = Self::default();
        for segment in segments {
            merged.append(segment);
        }
        merged
    }

    pub fn append(&mut self, other: JobTable) {
        for column in other.columns {
            self.add_column(column);
        }
        self.rows.extend(other.rows);
    }

    fn add_column(&mut self, column: String) {
        if !self.columns.contains(&column) {
            self.columns.push(column);
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Copy of the table holding only rows for which `keep` is true.
    pub fn filter_rows(&self, mut keep: impl FnMut(&Row) -> bool) -> JobTable {
        JobTable {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|row| keep(row)).cloned().collect(),
        }
    }

    /// Copy of the table with `f` applied to every present cell of `column`.
    pub fn map_column(&self, column: &str, mut f: impl FnMut(&Value) -> Value) -> JobTable {
        let mut out = self.clone();
        for row in &mut out.rows {
            if let Some(cell) = row.get_mut(column) {
                *cell = f(cell);
            }
        }
        out
    }

    /// Keep the listed columns that exist, in the listed order.
    pub fn project(&self, wanted: &[&str]) -> JobTable {
        let columns: Vec<String> = wanted
            .iter()
            .filter(|c| self.has_column(c))
            .map(|c| c.to_string())
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .filter(|(key, _)| columns.contains(key))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .collect();
        JobTable { columns, rows }
    }

    /// Overwrite (or add) `column` with `value` on every row.
    pub fn set_column(&mut self, column: &str, value: Value) {
        self.add_column(column.to_string());
        for row in &mut self.rows {
            row.insert(column.to_string(), value.clone());
        }
    }

    /// Remove columns whose cells are null or missing in every row.
    pub fn drop_null_columns(&mut self) {
        let rows = &self.rows;
        self.columns.retain(|column| {
            rows.iter()
                .any(|row| row.get(column).is_some_and(|v| !v.is_null()))
        });
        let columns = &self.columns;
        for row in &mut self.rows {
            row.retain(|key, _| columns.contains(key));
        }
    }

    /// Remove rows whose cells outside `ignore` are all null or missing.
    pub fn drop_empty_rows(&mut self, ignore: &[&str]) {
        self.rows.retain(|row| {
            row.iter()
                .any(|(key, value)| !ignore.contains(&key.as_str()) && !value.is_null())
        });
    }

    /// Typed view of the rows; rows lacking a title or URL are skipped.
    #[allow(dead_code)]
    pub fn job_posts(&self) -> Vec<JobPost> {
        self.job_rows().into_iter().map(|(_, job)| job).collect()
    }

    /// Each job paired with the row it was read from.
    pub fn job_rows(&self) -> Vec<(&Row, JobPost)> {
        self.rows
            .iter()
            .filter_map(|row| JobPost::from_row(row).map(|job| (row, job)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_from_rows_collects_columns() {
        let table = JobTable::from_rows(vec![
            row(json!({"title": "a"})),
            row(json!({"job_url": "u", "title": "b"})),
        ]);
        assert_eq!(table.len(), 2);
        assert!(table.has_column("title"));
        assert!(table.has_column("job_url"));
        assert_eq!(table.columns().len(), 2);
    }

    #[test]
    fn test_concat_unions_columns_and_keeps_order() {
        let mut first = JobTable::from_rows(vec![row(json!({"title": "a1", "country": "usa"}))]);
        first.append(JobTable::from_rows(vec![row(json!({"title": "a2", "country": "usa"}))]));
        let second = JobTable::from_rows(vec![row(json!({"description": "d", "title": "b1"}))]);

        let merged = JobTable::concat([first, second]);
        assert_eq!(merged.columns(), &["country", "title", "description"]);
        let titles: Vec<_> = merged.rows().iter().map(|r| r["title"].clone()).collect();
        assert_eq!(titles, vec![json!("a1"), json!("a2"), json!("b1")]);
        assert!(merged.rows()[2].get("country").is_none());
    }

    #[test]
    fn test_project_keeps_only_wanted_existing_columns() {
        let table = JobTable::from_rows(vec![row(json!({
            "title": "t", "company_logo": "x", "job_url": "u"
        }))]);
        let projected = table.project(&["job_url", "title", "description"]);
        assert_eq!(projected.columns(), &["job_url", "title"]);
        assert!(projected.rows()[0].get("company_logo").is_none());
    }

    #[test]
    fn test_drop_null_columns() {
        let mut table = JobTable::from_rows(vec![
            row(json!({"title": "a", "description": null})),
            row(json!({"title": "b"})),
        ]);
        table.drop_null_columns();
        assert_eq!(table.columns(), &["title"]);
        assert!(table.rows()[0].get("description").is_none());
    }

    #[test]
    fn test_drop_empty_rows_ignores_tag_column() {
        let mut table = JobTable::from_rows(vec![
            row(json!({"title": null, "country": "usa"})),
            row(json!({"title": "kept", "country": "usa"})),
        ]);
        table.drop_empty_rows(&["country"]);
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0]["title"], json!("kept"));
    }

    #[test]
    fn test_filter_rows_leaves_source_untouched() {
        let table = JobTable::from_rows(vec![row(json!({"n": 1})), row(json!({"n": 2}))]);
        let filtered = table.filter_rows(|r| r["n"] == json!(2));
        assert_eq!(filtered.len(), 1);
        assert_eq!(table.len(), 2);
        assert_eq!(filtered.columns(), table.columns());
    }

    #[test]
    fn test_set_column_overwrites() {
        let mut table = JobTable::from_rows(vec![row(json!({"country": "Germany"}))]);
        table.set_column("country", json!("usa"));
        assert_eq!(table.rows()[0]["country"], json!("usa"));
        assert_eq!(table.columns(), &["country"]);
    }

    #[test]
    fn test_job_posts_skips_invalid_rows() {
        let table = JobTable::from_rows(vec![
            row(json!({"title": "Dev", "job_url": "https://a"})),
            row(json!({"title": "No url"})),
        ]);
        let jobs = table.job_posts();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].title, "Dev");

        let paired = table.job_rows();
        assert_eq!(paired.len(), 1);
        assert_eq!(paired[0].0["job_url"], json!("https://a"));
    }
}
