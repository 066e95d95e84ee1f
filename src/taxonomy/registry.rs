use crate::config::registry_config::{normalize_trigger, RegistryConfig};
use crate::domain::model::{EvidenceBag, Level};
use crate::taxonomy::evidence::EvidenceExtractor;
use crate::utils::error::{Result, TaxonomyError};
use crate::utils::validation::Validate;
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// A trigger phrase with its specificity (number of words it spans).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    text: String,
    specificity: u32,
}

impl Trigger {
    pub fn new(raw: &str) -> Self {
        let text = normalize_trigger(raw);
        let specificity = text
            .split(|c: char| c.is_whitespace() || c == '-')
            .filter(|word| !word.is_empty())
            .count() as u32;
        Self { text, specificity }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn specificity(&self) -> u32 {
        self.specificity
    }

    /// Multi-word or punctuated triggers are matched as phrases, not as single tokens.
    pub fn is_phrase(&self) -> bool {
        !self.text.chars().all(char::is_alphanumeric)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    label: String,
    triggers: Vec<Trigger>,
    weight: u32,
}

impl Rule {
    pub fn new<I, S>(label: impl Into<String>, triggers: I, weight: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            label: label.into(),
            triggers: triggers.into_iter().map(|t| Trigger::new(t.as_ref())).collect(),
            weight,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn triggers(&self) -> &[Trigger] {
        &self.triggers
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    /// `weight × Σ specificity` over the triggers present in `evidence`.
    pub fn score(&self, evidence: &EvidenceBag) -> u32 {
        let matched = self
            .triggers
            .iter()
            .filter(|t| evidence.contains(t.text()))
            .map(Trigger::specificity)
            .fold(0u32, u32::saturating_add);
        self.weight.saturating_mul(matched)
    }

    pub fn matched_triggers<'a>(&'a self, evidence: &'a EvidenceBag) -> impl Iterator<Item = &'a str> {
        self.triggers
            .iter()
            .map(Trigger::text)
            .filter(move |t| evidence.contains(t))
    }
}

/// The immutable taxonomy definition every classification call is evaluated against.
///
/// Built once from a validated [`RegistryConfig`] and shared by reference (or `Arc`) across
/// classification calls and worker threads. The class → order vocabulary is kept as a
/// nested lookup so that an order can only ever be chosen from its class's vocabulary.
#[derive(Debug, Clone)]
pub struct TaxonomyRegistry {
    name: String,
    version: String,
    labels: BTreeMap<Level, Vec<String>>,
    defaults: BTreeMap<Level, String>,
    orders_by_class: BTreeMap<String, Vec<String>>,
    generic_orders: Vec<String>,
    rules: BTreeMap<Level, Vec<Rule>>,
    extractor: EvidenceExtractor,
}

impl TaxonomyRegistry {
    pub fn from_config(config: &RegistryConfig) -> Result<Self> {
        config.validate()?;

        let mut labels = BTreeMap::new();
        let mut defaults = BTreeMap::new();
        for level in Level::ALL {
            let level_config = config.level(level)?;
            labels.insert(level, level_config.labels.clone());
            defaults.insert(level, level_config.default.clone());
        }

        let mut rules: BTreeMap<Level, Vec<Rule>> = BTreeMap::new();
        for (name, rule_configs) in &config.rules {
            let level: Level = name.parse()?;
            rules.insert(
                level,
                rule_configs
                    .iter()
                    .map(|r| Rule::new(r.label.clone(), &r.triggers, r.weight))
                    .collect(),
            );
        }

        // 多字觸發詞必須在斷詞前以片語比對，否則會被拆開
        let phrases: BTreeSet<String> = rules
            .values()
            .flatten()
            .flat_map(|rule| rule.triggers().iter())
            .filter(|t| t.is_phrase())
            .map(|t| t.text().to_string())
            .chain(config.evidence.phrases.iter().map(|p| normalize_trigger(p)))
            .filter(|p| !p.is_empty())
            .collect();

        let extractor = EvidenceExtractor::new(phrases, config.stop_words())?;

        tracing::debug!(
            "Loaded taxonomy registry {} v{} ({} rules, {} phrases)",
            config.registry.name,
            config.registry.version,
            rules.values().map(Vec::len).sum::<usize>(),
            extractor.phrases().len()
        );

        Ok(Self {
            name: config.registry.name.clone(),
            version: config.registry.version.clone(),
            labels,
            defaults,
            orders_by_class: config.orders.by_class.clone(),
            generic_orders: config.orders.generic.clone(),
            rules,
            extractor,
        })
    }

    pub fn builtin() -> Result<Self> {
        Self::from_config(&RegistryConfig::builtin()?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_config(&RegistryConfig::from_file(path)?)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn valid_labels(&self, level: Level) -> &[String] {
        self.labels.get(&level).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Same as [`valid_labels`](Self::valid_labels) for a level given by name.
    pub fn valid_labels_by_name(&self, level: &str) -> Result<&[String]> {
        Ok(self.valid_labels(level.parse()?))
    }

    /// The orders permitted under `class_label`, or the generic order set when the class
    /// has no specialized vocabulary.
    pub fn valid_orders_for_class(&self, class_label: &str) -> Result<&[String]> {
        if !self.is_valid(Level::Class, class_label) {
            return Err(TaxonomyError::UnknownClassError {
                class: class_label.to_string(),
            });
        }

        Ok(self
            .orders_by_class
            .get(class_label)
            .map(Vec::as_slice)
            .unwrap_or(&self.generic_orders))
    }

    pub fn is_valid(&self, level: Level, label: &str) -> bool {
        self.valid_labels(level).iter().any(|l| l == label)
    }

    pub fn default_label(&self, level: Level) -> &str {
        self.defaults.get(&level).map(String::as_str).unwrap_or("Other")
    }

    pub fn rules(&self, level: Level) -> &[Rule] {
        self.rules.get(&level).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn extractor(&self) -> &EvidenceExtractor {
        &self.extractor
    }

    /// Region codes pass through when registered; anything else maps to the region default.
    pub fn resolve_region(&self, code: Option<&str>) -> String {
        code.map(|c| c.trim().to_ascii_uppercase())
            .filter(|c| self.is_valid(Level::Region, c))
            .unwrap_or_else(|| self.default_label(Level::Region).to_string())
    }
}
