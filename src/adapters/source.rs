use crate::domain::model::RawRecord;
use crate::domain::ports::RecordSource;
use crate::utils::error::{Result, TaxonomyError};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Reads robot candidates from a local file holding either a JSON array or one JSON
/// object per line.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Splits the content into records. Broken JSON aborts with the offending line; a
    /// well-formed entry that is not a usable record becomes a record that fails validation,
    /// so the batch reports it and keeps going.
    pub fn parse(content: &str) -> Result<Vec<RawRecord>> {
        let trimmed = content.trim_start();
        if trimmed.is_empty() {
            return Ok(Vec::new());
        }

        if trimmed.starts_with('[') {
            let entries: Vec<Value> =
                serde_json::from_str(content).map_err(|e| TaxonomyError::ParseError {
                    line: e.line(),
                    message: e.to_string(),
                })?;
            return Ok(entries
                .into_iter()
                .enumerate()
                .map(|(index, entry)| to_record(entry, || format!("#{}", index + 1)))
                .collect());
        }

        // NDJSON：逐行解析，錯誤訊息附上行號
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(index, line)| {
                let entry: Value = serde_json::from_str(line).map_err(|e| TaxonomyError::ParseError {
                    line: index + 1,
                    message: e.to_string(),
                })?;
                Ok(to_record(entry, || format!("line {}", index + 1)))
            })
            .collect()
    }
}

fn to_record(entry: Value, position: impl FnOnce() -> String) -> RawRecord {
    if !entry.is_object() {
        return RawRecord::unreadable(position(), &entry, "expected a JSON object");
    }
    let id = match entry.get("id") {
        Some(Value::String(id)) if !id.trim().is_empty() => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => position(),
    };
    serde_json::from_value(entry.clone())
        .unwrap_or_else(|e| RawRecord::unreadable(id, &entry, e.to_string()))
}

impl RecordSource for JsonFileSource {
    async fn fetch_records(&self) -> Result<Vec<RawRecord>> {
        tracing::debug!("Reading records from {}", self.path.display());
        let content = tokio::fs::read_to_string(&self.path).await?;
        Self::parse(&content)
    }
}

/// Records already held in memory, e.g. handed over by a scraper in the same process.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Vec<RawRecord>,
}

impl InMemorySource {
    pub fn new(records: Vec<RawRecord>) -> Self {
        Self { records }
    }
}

impl RecordSource for InMemorySource {
    async fn fetch_records(&self) -> Result<Vec<RawRecord>> {
        Ok(self.records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::registry::TaxonomyRegistry;
    use crate::taxonomy::store::classify_batch;
    use crate::utils::error::ErrorCategory;
    use crate::utils::validation::Validate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_array_and_ndjson() {
        let array = r#"[{"id": 1, "n": "Spot"}, {"id": "atlas", "name": "Atlas", "tags": ["humanoid"]}]"#;
        let records = JsonFileSource::parse(array).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, "1");
        assert!(records[1].tags.contains("humanoid"));

        let ndjson = "{\"id\": 1, \"n\": \"Spot\"}\n\n{\"id\": 2, \"n\": \"Pepper\"}\n";
        let records = JsonFileSource::parse(ndjson).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].name, "Pepper");

        assert!(JsonFileSource::parse("   ").unwrap().is_empty());
    }

    #[test]
    fn test_parse_reports_bad_line() {
        let ndjson = "{\"id\": 1}\n{not json}\n";
        match JsonFileSource::parse(ndjson) {
            Err(TaxonomyError::ParseError { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected line error, got {:?}", other),
        }
    }

    #[test]
    fn test_year_as_text_does_not_abort_the_file() {
        let ndjson = "{\"id\":1,\"n\":\"Spot\",\"yr\":2019}\n{\"id\":2,\"n\":\"Atlas\",\"yr\":\"2013\"}\n{\"id\":3,\"n\":\"Pepper\",\"yr\":\"\"}\n{\"id\":4,\"n\":\"Nao\",\"yr\":null}\n";
        let records = JsonFileSource::parse(ndjson).unwrap();
        let years: Vec<Option<i32>> = records.iter().map(|r| r.year).collect();
        assert_eq!(years, [Some(2019), Some(2013), None, None]);
        assert!(records.iter().all(|r| r.validate().is_ok()));
    }

    #[test]
    fn test_unreadable_year_fails_only_its_record() {
        let ndjson = concat!(
            r#"{"id": 1, "n": "Spot", "description": "four-legged robot", "yr": 2019}"#,
            "\n",
            r#"{"id": 2, "n": "Relic", "yr": "circa 2005"}"#,
            "\n",
        );
        let records = JsonFileSource::parse(ndjson).unwrap();
        assert_eq!(records.len(), 2);

        let registry = TaxonomyRegistry::builtin().unwrap();
        let outcome = classify_batch(&records, &registry).unwrap();
        assert_eq!(outcome.report.classified, 1);
        assert_eq!(outcome.report.failures.len(), 1);
        assert_eq!(outcome.report.failures[0].id, "2");
        assert_eq!(outcome.report.failures[0].category, ErrorCategory::Input);
        assert!(outcome.store.get("1").is_ok());
    }

    #[test]
    fn test_non_object_entries_become_record_failures() {
        let array = r#"[{"id": "spot", "n": "Spot"}, 42, {"id": "dup", "n": "A", "name": "B"}]"#;
        let records = JsonFileSource::parse(array).unwrap();
        assert_eq!(records.len(), 3);
        assert!(records[0].validate().is_ok());
        assert_eq!(records[1].id, "#2");
        assert!(matches!(
            records[1].validate(),
            Err(TaxonomyError::InvalidFieldError { .. })
        ));
        assert_eq!(records[2].id, "dup");
        assert!(records[2].validate().is_err());
    }

    #[test]
    fn test_parse_reports_bad_array_line() {
        match JsonFileSource::parse("[\n{\"id\": 1},\n{oops}\n]") {
            Err(TaxonomyError::ParseError { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected line error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"id": "roomba", "n": "Roomba", "yr": 2002, "rg": "US"}}"#).unwrap();
        file.flush().unwrap();

        let source = JsonFileSource::new(file.path());
        let records = source.fetch_records().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].year, Some(2002));
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let source = JsonFileSource::new("/definitely/not/here.json");
        assert!(matches!(
            source.fetch_records().await,
            Err(TaxonomyError::IoError(_))
        ));
    }
}
