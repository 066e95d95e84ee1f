use crate::domain::model::{ClassifiedRecord, Level};
use crate::taxonomy::metrics::{self, LevelDiversity};
use crate::taxonomy::registry::TaxonomyRegistry;
use crate::taxonomy::store::{BatchOutcome, BatchReport, ClassificationStore};
use crate::utils::error::Result;
use serde::Serialize;
use std::collections::BTreeMap;

/// Label distributions and year statistics over a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaxonomySummary {
    pub total: usize,
    pub distributions: BTreeMap<Level, BTreeMap<String, usize>>,
    pub year_counts: BTreeMap<i32, usize>,
    pub year_range: Option<(i32, i32)>,
}

impl TaxonomySummary {
    pub fn summarize(store: &ClassificationStore) -> Self {
        let distributions = Level::ALL
            .iter()
            .map(|&level| (level, store.count_by(level)))
            .collect();

        let mut year_counts = BTreeMap::new();
        for year in store.iter().filter_map(|r| r.year) {
            *year_counts.entry(year).or_insert(0) += 1;
        }

        let year_range = match (year_counts.keys().next(), year_counts.keys().next_back()) {
            (Some(&first), Some(&last)) => Some((first, last)),
            _ => None,
        };

        Self {
            total: store.len(),
            distributions,
            year_counts,
            year_range,
        }
    }

    /// Year with the most records; the earliest year wins a tie.
    pub fn peak_year(&self) -> Option<(i32, usize)> {
        self.year_counts
            .iter()
            .fold(None, |best: Option<(i32, usize)>, (&year, &count)| match best {
                Some((_, best_count)) if best_count >= count => best,
                _ => Some((year, count)),
            })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistryInfo {
    pub name: String,
    pub version: String,
}

/// Everything downstream reporting needs from one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub registry: RegistryInfo,
    pub summary: TaxonomySummary,
    pub diversity: Vec<LevelDiversity>,
    pub batch: BatchReport,
    /// The classified records; serialized as the top-level `records` list.
    #[serde(flatten)]
    pub store: ClassificationStore,
}

impl AnalysisReport {
    pub fn build(registry: &TaxonomyRegistry, outcome: BatchOutcome) -> Result<Self> {
        let BatchOutcome { store, report } = outcome;

        let diversity = if store.is_empty() {
            tracing::warn!("⚠️ No records were classified; diversity profile is empty");
            Vec::new()
        } else {
            metrics::diversity_profile(&store)?
        };

        Ok(Self {
            registry: RegistryInfo {
                name: registry.name().to_string(),
                version: registry.version().to_string(),
            },
            summary: TaxonomySummary::summarize(&store),
            diversity,
            batch: report,
            store,
        })
    }

    pub fn records(&self) -> &[ClassifiedRecord] {
        self.store.all()
    }

    pub fn diversity_at(&self, level: Level) -> Option<&LevelDiversity> {
        self.diversity.iter().find(|d| d.level == level)
    }
}
