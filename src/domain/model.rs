use crate::utils::error::{Result, TaxonomyError};
use crate::utils::validation::{self, Validate};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Earliest plausible year for a robot record.
pub const MIN_YEAR: i32 = 1950;

/// A rank of the taxonomy, or one of the orthogonal dimensions (`primary_role`, `region`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Domain,
    Kingdom,
    Class,
    Order,
    Family,
    Genus,
    Species,
    PrimaryRole,
    Region,
}

impl Level {
    pub const ALL: [Level; 9] = [
        Level::Domain,
        Level::Kingdom,
        Level::Class,
        Level::Order,
        Level::Family,
        Level::Genus,
        Level::Species,
        Level::PrimaryRole,
        Level::Region,
    ];

    /// Levels resolved by the rule engine, in evaluation order. Higher ranks come first
    /// because the order rules depend on the resolved class.
    pub const CLASSIFIED: [Level; 8] = [
        Level::Domain,
        Level::Kingdom,
        Level::Class,
        Level::Order,
        Level::Family,
        Level::Genus,
        Level::Species,
        Level::PrimaryRole,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Domain => "domain",
            Level::Kingdom => "kingdom",
            Level::Class => "class",
            Level::Order => "order",
            Level::Family => "family",
            Level::Genus => "genus",
            Level::Species => "species",
            Level::PrimaryRole => "primary_role",
            Level::Region => "region",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = TaxonomyError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        Level::ALL
            .iter()
            .copied()
            .find(|level| level.as_str() == normalized)
            .ok_or_else(|| TaxonomyError::UnknownLevelError {
                level: s.to_string(),
            })
    }
}

/// A robot candidate as delivered by the ingestion side.
///
/// Deserialization is lenient: the short keys of the scraped dataset (`n`, `yr`, `rg`,
/// `url`) are accepted, ids may be numbers, years may be numeric strings and tags may be a
/// delimited string. A field that is present but unreadable does not fail deserialization;
/// it is kept as a [`FieldIssue`] and reported by [`Validate`] for this record alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RecordWire")]
pub struct RawRecord {
    pub id: String,
    pub name: String,
    pub description: String,
    pub tags: BTreeSet<String>,
    pub scraped_text: Option<String>,
    pub year: Option<i32>,
    pub region: Option<String>,
    pub source_url: Option<String>,
    #[serde(skip)]
    issues: Vec<FieldIssue>,
}

/// An input field that was present but could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,
    pub value: String,
    pub reason: String,
}

const ISSUE_VALUE_CHARS: usize = 80;

impl FieldIssue {
    fn new(field: &str, value: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            value: value.to_string().chars().take(ISSUE_VALUE_CHARS).collect(),
            reason: reason.into(),
        }
    }
}

impl RawRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Placeholder for an input entry that is not a readable record at all. It always
    /// fails validation, so a batch reports it under `id` and carries on.
    pub fn unreadable(id: impl Into<String>, raw: impl std::fmt::Display, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            issues: vec![FieldIssue::new("record", raw, reason)],
            ..Self::default()
        }
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_scraped_text(mut self, text: impl Into<String>) -> Self {
        self.scraped_text = Some(text.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }
}

impl Validate for RawRecord {
    fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            let record_id = if self.name.trim().is_empty() {
                "<unnamed>"
            } else {
                self.name.as_str()
            };
            return Err(TaxonomyError::MissingFieldError {
                record_id: record_id.to_string(),
                field: "id".to_string(),
            });
        }

        if let Some(issue) = self.issues.first() {
            return Err(validation::field(&issue.field)
                .of_record(&self.id)
                .reject(&issue.value, issue.reason.as_str()));
        }

        if let Some(year) = self.year {
            let current_year = chrono::Utc::now().year();
            validation::field("year")
                .of_record(&self.id)
                .within(year, MIN_YEAR..=current_year)?;
        }

        if let Some(url) = &self.source_url {
            validation::field("source_url").of_record(&self.id).http_url(url)?;
        }

        Ok(())
    }
}

/// On-the-wire shape of a record: every field is read as raw JSON and normalized in
/// [`From<RecordWire>`], so one odd field never rejects the whole entry.
#[derive(Deserialize)]
struct RecordWire {
    #[serde(default)]
    id: Value,
    #[serde(default, alias = "n")]
    name: Value,
    #[serde(default)]
    description: Value,
    #[serde(default)]
    tags: Value,
    // 爬蟲輸出的應用領域清單併入標籤
    #[serde(default)]
    applications: Value,
    #[serde(default)]
    scraped_text: Value,
    #[serde(default, alias = "yr")]
    year: Value,
    #[serde(default, alias = "rg")]
    region: Value,
    #[serde(default, alias = "url")]
    source_url: Value,
}

impl From<RecordWire> for RawRecord {
    fn from(wire: RecordWire) -> Self {
        let mut issues = Vec::new();

        let mut tags = read_tags("tags", wire.tags, &mut issues);
        tags.extend(read_tags("applications", wire.applications, &mut issues));

        Self {
            id: read_text("id", wire.id, &mut issues).unwrap_or_default(),
            name: read_text("name", wire.name, &mut issues).unwrap_or_default(),
            description: read_text("description", wire.description, &mut issues).unwrap_or_default(),
            tags,
            scraped_text: read_text("scraped_text", wire.scraped_text, &mut issues),
            year: read_year(wire.year, &mut issues),
            region: read_text("region", wire.region, &mut issues).filter(|r| !r.trim().is_empty()),
            source_url: read_text("source_url", wire.source_url, &mut issues)
                .filter(|u| !u.trim().is_empty()),
            issues,
        }
    }
}

fn read_text(field: &str, value: Value, issues: &mut Vec<FieldIssue>) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        // 爬蟲資料的 id 可能是數字
        Value::Number(n) => Some(n.to_string()),
        other => {
            issues.push(FieldIssue::new(field, &other, "expected text"));
            None
        }
    }
}

/// Integer, numeric string, or `""`/`null`/`0` for unknown.
fn read_year(value: Value, issues: &mut Vec<FieldIssue>) -> Option<i32> {
    let parsed = match &value {
        Value::Null => return None,
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) if s.trim().is_empty() => return None,
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    };

    match parsed {
        Some(0) => None,
        Some(year) => Some(year),
        None => {
            issues.push(FieldIssue::new("year", &value, "expected a whole year"));
            None
        }
    }
}

/// An array of strings, or one string split on `,` `;` `/` and newlines.
fn read_tags(field: &str, value: Value, issues: &mut Vec<FieldIssue>) -> BTreeSet<String> {
    let clean = |s: &str| Some(s.trim().to_string()).filter(|t| !t.is_empty());
    match value {
        Value::Null => BTreeSet::new(),
        Value::String(s) => s.split([',', ';', '/', '\n']).filter_map(clean).collect(),
        Value::Array(items) => {
            let mut tags = BTreeSet::new();
            for item in items {
                match item {
                    Value::String(s) => tags.extend(clean(&s)),
                    other => issues.push(FieldIssue::new(field, &other, "expected a list of text")),
                }
            }
            tags
        }
        other => {
            issues.push(FieldIssue::new(field, &other, "expected a list of text"));
            BTreeSet::new()
        }
    }
}

/// Normalized evidence for one record. Lives only for the duration of a classification call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvidenceBag {
    tokens: BTreeSet<String>,
    phrases: BTreeSet<String>,
    pub year: Option<i32>,
    pub region: Option<String>,
}

impl EvidenceBag {
    pub fn from_parts(
        tokens: BTreeSet<String>,
        phrases: BTreeSet<String>,
        year: Option<i32>,
        region: Option<String>,
    ) -> Self {
        Self {
            tokens,
            phrases,
            year,
            region,
        }
    }

    /// True when `trigger` was seen either as a unigram token or as a matched phrase.
    pub fn contains(&self, trigger: &str) -> bool {
        self.tokens.contains(trigger) || self.phrases.contains(trigger)
    }

    pub fn tokens(&self) -> &BTreeSet<String> {
        &self.tokens
    }

    pub fn phrases(&self) -> &BTreeSet<String> {
        &self.phrases
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty() && self.phrases.is_empty()
    }
}

/// One fully labeled record. Every classified level carries exactly one label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassifiedRecord {
    pub id: String,
    pub name: String,
    pub domain: String,
    pub kingdom: String,
    pub class: String,
    pub order: String,
    pub family: String,
    pub genus: String,
    pub species: String,
    pub primary_role: String,
    pub year: Option<i32>,
    pub region: String,
}

impl ClassifiedRecord {
    pub fn label(&self, level: Level) -> &str {
        match level {
            Level::Domain => &self.domain,
            Level::Kingdom => &self.kingdom,
            Level::Class => &self.class,
            Level::Order => &self.order,
            Level::Family => &self.family,
            Level::Genus => &self.genus,
            Level::Species => &self.species,
            Level::PrimaryRole => &self.primary_role,
            Level::Region => &self.region,
        }
    }
}
