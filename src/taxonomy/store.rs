use crate::domain::model::{ClassifiedRecord, Level, RawRecord};
use crate::taxonomy::classifier::classify;
use crate::taxonomy::registry::TaxonomyRegistry;
use crate::utils::error::{ErrorCategory, Result, TaxonomyError};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Insertion-ordered collection of classified records, unique by id.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ClassificationStore {
    records: Vec<ClassifiedRecord>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl ClassificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, record: ClassifiedRecord) -> Result<()> {
        if self.index.contains_key(&record.id) {
            return Err(TaxonomyError::DuplicateIdentifierError { id: record.id });
        }
        self.index.insert(record.id.clone(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    /// Swaps in a re-classified record, keeping its original position.
    pub fn replace(&mut self, record: ClassifiedRecord) -> Result<ClassifiedRecord> {
        let position = *self
            .index
            .get(&record.id)
            .ok_or_else(|| TaxonomyError::NotFoundError {
                id: record.id.clone(),
            })?;
        Ok(std::mem::replace(&mut self.records[position], record))
    }

    pub fn get(&self, id: &str) -> Result<&ClassifiedRecord> {
        self.index
            .get(id)
            .map(|&position| &self.records[position])
            .ok_or_else(|| TaxonomyError::NotFoundError { id: id.to_string() })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn all(&self) -> &[ClassifiedRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClassifiedRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn count_by(&self, level: Level) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.label(level).to_string()).or_insert(0) += 1;
        }
        counts
    }
}

impl<'a> IntoIterator for &'a ClassificationStore {
    type Item = &'a ClassifiedRecord;
    type IntoIter = std::slice::Iter<'a, ClassifiedRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// A record that could not be classified, reported without stopping the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    pub id: String,
    pub category: ErrorCategory,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub attempted: usize,
    pub classified: usize,
    pub failures: Vec<RecordFailure>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub store: ClassificationStore,
    pub report: BatchReport,
}

/// Single writer for batch results. Classification may run anywhere, but results are
/// accepted here one at a time and in input order.
#[derive(Debug, Default)]
pub struct BatchCollector {
    outcome: BatchOutcome,
}

impl BatchCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one classification result. Input errors are collected into the report;
    /// anything fatal is returned to abort the batch.
    pub fn accept(&mut self, raw: &RawRecord, result: Result<ClassifiedRecord>) -> Result<()> {
        self.outcome.report.attempted += 1;

        let error = match result.and_then(|record| self.outcome.store.add(record)) {
            Ok(()) => {
                self.outcome.report.classified += 1;
                return Ok(());
            }
            Err(e) => e,
        };

        if error.is_fatal() {
            return Err(error);
        }

        let id = if raw.id.trim().is_empty() {
            raw.name.clone()
        } else {
            raw.id.clone()
        };
        tracing::warn!("⚠️ Skipping record {}: {}", id, error);
        self.outcome.report.failures.push(RecordFailure {
            id,
            category: error.category(),
            message: error.to_string(),
        });
        Ok(())
    }

    pub fn finish(self) -> BatchOutcome {
        self.outcome
    }
}

/// Classifies `records` into a new store, stopping at the first error of any kind.
pub fn build_store(records: &[RawRecord], registry: &TaxonomyRegistry) -> Result<ClassificationStore> {
    let mut store = ClassificationStore::new();
    for record in records {
        store.add(classify(record, registry)?)?;
    }
    Ok(store)
}

/// Classifies what it can. Per-record input errors land in the [`BatchReport`];
/// configuration and invariant errors still abort.
pub fn classify_batch(records: &[RawRecord], registry: &TaxonomyRegistry) -> Result<BatchOutcome> {
    let mut collector = BatchCollector::new();
    for record in records {
        collector.accept(record, classify(record, registry))?;
    }
    Ok(collector.finish())
}
