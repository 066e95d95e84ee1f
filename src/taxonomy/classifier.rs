use crate::domain::model::{ClassifiedRecord, EvidenceBag, Level, RawRecord};
use crate::taxonomy::registry::TaxonomyRegistry;
use crate::utils::error::{Result, TaxonomyError};
use crate::utils::validation::Validate;
use std::collections::BTreeMap;

/// Outcome of scoring one level: the chosen label, its weighted score and the triggers
/// that fired. A zero score means the level fell back to its registered default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelDecision {
    pub label: String,
    pub score: u32,
    pub matched: Vec<String>,
}

impl LevelDecision {
    pub fn is_default(&self) -> bool {
        self.score == 0
    }
}

/// Validates `record`, extracts its evidence and resolves every level against `registry`.
///
/// Pure function of `(record, registry)`: the same input always yields the same
/// [`ClassifiedRecord`].
pub fn classify(record: &RawRecord, registry: &TaxonomyRegistry) -> Result<ClassifiedRecord> {
    record.validate()?;
    let evidence = registry.extractor().extract(record);
    classify_evidence(&record.id, &record.name, &evidence, registry)
}

pub fn classify_evidence(
    id: &str,
    name: &str,
    evidence: &EvidenceBag,
    registry: &TaxonomyRegistry,
) -> Result<ClassifiedRecord> {
    let mut labels: BTreeMap<Level, String> = BTreeMap::new();

    for level in Level::CLASSIFIED {
        let decision = match level {
            Level::Order => {
                let class = labels
                    .get(&Level::Class)
                    .map(String::as_str)
                    .unwrap_or_else(|| registry.default_label(Level::Class));
                let allowed = registry.valid_orders_for_class(class)?;
                resolve_level(registry, level, evidence, Some(allowed))
            }
            _ => resolve_level(registry, level, evidence, None),
        };

        if !decision.is_default() {
            tracing::trace!(
                "{} {} = {} (score {}, matched {:?})",
                id,
                level,
                decision.label,
                decision.score,
                decision.matched
            );
        }
        labels.insert(level, decision.label);
    }

    let mut take = |level: Level| {
        labels
            .remove(&level)
            .unwrap_or_else(|| registry.default_label(level).to_string())
    };

    let classified = ClassifiedRecord {
        id: id.to_string(),
        name: name.to_string(),
        domain: take(Level::Domain),
        kingdom: take(Level::Kingdom),
        class: take(Level::Class),
        order: take(Level::Order),
        family: take(Level::Family),
        genus: take(Level::Genus),
        species: take(Level::Species),
        primary_role: take(Level::PrimaryRole),
        year: evidence.year,
        region: registry.resolve_region(evidence.region.as_deref()),
    };

    check_consistency(&classified, registry)?;

    tracing::debug!(
        "Classified {} as {}/{}/{}/{}",
        classified.id,
        classified.class,
        classified.order,
        classified.species,
        classified.primary_role
    );

    Ok(classified)
}

/// Picks the best-scoring rule for `level`.
///
/// Rules are visited in declaration order and only a strictly higher score replaces the
/// current best, so the earlier rule wins an exact tie. With `allowed` set, rules whose
/// label is outside that vocabulary are skipped. Nothing above zero yields the default.
pub fn resolve_level(
    registry: &TaxonomyRegistry,
    level: Level,
    evidence: &EvidenceBag,
    allowed: Option<&[String]>,
) -> LevelDecision {
    let mut best: Option<LevelDecision> = None;

    for rule in registry.rules(level) {
        if let Some(allowed) = allowed {
            if !allowed.iter().any(|label| label == rule.label()) {
                continue;
            }
        }

        let score = rule.score(evidence);
        if score == 0 {
            continue;
        }
        if best.as_ref().is_some_and(|b| score <= b.score) {
            continue;
        }

        best = Some(LevelDecision {
            label: rule.label().to_string(),
            score,
            matched: rule.matched_triggers(evidence).map(str::to_string).collect(),
        });
    }

    best.unwrap_or_else(|| LevelDecision {
        label: registry.default_label(level).to_string(),
        score: 0,
        matched: Vec::new(),
    })
}

/// Re-checks a finished record against the registry. Any failure here is a defect in the
/// rule tables, never bad input.
fn check_consistency(record: &ClassifiedRecord, registry: &TaxonomyRegistry) -> Result<()> {
    for level in Level::ALL {
        let label = record.label(level);
        if !registry.is_valid(level, label) {
            return Err(invariant_violation(
                &record.id,
                format!("{} label '{}' is not registered", level, label),
            ));
        }
    }

    let allowed = registry.valid_orders_for_class(&record.class)?;
    if !allowed.iter().any(|order| order == &record.order) {
        return Err(invariant_violation(
            &record.id,
            format!(
                "order '{}' is not permitted for class '{}'",
                record.order, record.class
            ),
        ));
    }

    Ok(())
}

fn invariant_violation(record_id: &str, message: String) -> TaxonomyError {
    tracing::error!("🚨 Invariant violation for {}: {}", record_id, message);
    TaxonomyError::InvariantViolation {
        record_id: record_id.to_string(),
        message,
    }
}
