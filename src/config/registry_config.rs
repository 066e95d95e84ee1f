use crate::domain::model::Level;
use crate::utils::error::{Result, TaxonomyError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

const BUILTIN_REGISTRY: &str = include_str!("default_registry.toml");

/// Upper bound on a rule weight; keeps `weight × Σ specificity` far from `u32` overflow.
pub const MAX_RULE_WEIGHT: u32 = 1000;

/// Levels whose labels are passed through from the record rather than inferred by rules.
const PASSTHROUGH_LEVELS: [Level; 1] = [Level::Region];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub registry: RegistryInfo,
    pub levels: BTreeMap<String, LevelConfig>,
    pub orders: OrdersConfig,
    #[serde(default)]
    pub evidence: EvidenceConfig,
    #[serde(default)]
    pub rules: BTreeMap<String, Vec<RuleConfig>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryInfo {
    pub name: String,
    pub description: Option<String>,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelConfig {
    pub labels: Vec<String>,
    pub default: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrdersConfig {
    pub generic: Vec<String>,
    #[serde(default)]
    pub by_class: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceConfig {
    #[serde(default)]
    pub stop_words: Vec<String>,
    #[serde(default)]
    pub phrases: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleConfig {
    pub label: String,
    pub triggers: Vec<String>,
    #[serde(default = "default_weight")]
    pub weight: u32,
}

fn default_weight() -> u32 {
    1
}

impl RegistryConfig {
    /// 內建的預設分類表
    pub fn builtin() -> Result<Self> {
        Self::from_toml_str(BUILTIN_REGISTRY)
    }

    /// 從檔案載入分類表，依副檔名選擇 TOML 或 JSON
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_toml_str(&content),
        }
    }

    /// 從 TOML 字串解析分類表
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| TaxonomyError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 從 JSON 字串解析分類表
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| TaxonomyError::ConfigError {
            message: format!("JSON parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${TAXONOMY_VERSION})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| TaxonomyError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn level(&self, level: Level) -> Result<&LevelConfig> {
        self.levels
            .get(level.as_str())
            .ok_or_else(|| TaxonomyError::ConfigError {
                message: format!("level '{}' is not defined", level),
            })
    }

    /// Lowercased, whitespace-collapsed stop words.
    pub fn stop_words(&self) -> HashSet<String> {
        self.evidence
            .stop_words
            .iter()
            .map(|w| normalize_trigger(w))
            .collect()
    }

    /// 驗證分類表的一致性，任何錯誤都必須在分類開始前中止
    pub fn validate_config(&self) -> Result<()> {
        validation::field("registry.name").non_empty(&self.registry.name)?;

        for name in self.levels.keys() {
            name.parse::<Level>().map_err(|_| TaxonomyError::ConfigError {
                message: format!("unknown level '{}' in [levels]", name),
            })?;
        }

        for level in Level::ALL {
            let config = self.level(level)?;
            if config.labels.is_empty() {
                return Err(TaxonomyError::ConfigError {
                    message: format!("level '{}' has no labels", level),
                });
            }

            let mut seen = HashSet::new();
            for label in &config.labels {
                validation::field(&format!("levels.{}.labels", level)).non_empty(label)?;
                if !seen.insert(label.as_str()) {
                    return Err(TaxonomyError::ConfigError {
                        message: format!("duplicate label '{}' in level '{}'", label, level),
                    });
                }
            }

            if !config.labels.contains(&config.default) {
                return Err(TaxonomyError::ConfigError {
                    message: format!(
                        "default '{}' of level '{}' is not one of its labels",
                        config.default, level
                    ),
                });
            }
        }

        // 界不參與親緣距離，因此必須是常數
        let kingdom = self.level(Level::Kingdom)?;
        if kingdom.labels.len() != 1 {
            return Err(TaxonomyError::ConfigError {
                message: format!(
                    "kingdom must have exactly one label, found {}",
                    kingdom.labels.len()
                ),
            });
        }

        self.validate_orders()?;
        self.validate_rules()?;

        Ok(())
    }

    fn validate_orders(&self) -> Result<()> {
        let classes = &self.level(Level::Class)?.labels;
        let orders = self.level(Level::Order)?;

        if self.orders.generic.is_empty() {
            return Err(TaxonomyError::ConfigError {
                message: "generic order vocabulary is empty".to_string(),
            });
        }

        let vocabularies = std::iter::once(("<generic>", &self.orders.generic)).chain(
            self.orders
                .by_class
                .iter()
                .map(|(class, vocab)| (class.as_str(), vocab)),
        );

        for (class, vocabulary) in vocabularies {
            if class != "<generic>" && !classes.iter().any(|c| c == class) {
                return Err(TaxonomyError::ConfigError {
                    message: format!("order vocabulary references unknown class '{}'", class),
                });
            }

            for order in vocabulary {
                if !orders.labels.contains(order) {
                    return Err(TaxonomyError::ConfigError {
                        message: format!(
                            "order '{}' in vocabulary of '{}' is not a registered order",
                            order, class
                        ),
                    });
                }
            }

            // 沒有規則命中時會指派預設 order，它必須對每個 class 都合法
            if !vocabulary.contains(&orders.default) {
                return Err(TaxonomyError::ConfigError {
                    message: format!(
                        "default order '{}' is missing from the vocabulary of '{}'",
                        orders.default, class
                    ),
                });
            }
        }

        Ok(())
    }

    fn validate_rules(&self) -> Result<()> {
        let stop_words = self.stop_words();

        for (name, rules) in &self.rules {
            let level: Level = name.parse().map_err(|_| TaxonomyError::ConfigError {
                message: format!("rules defined for unknown level '{}'", name),
            })?;

            if PASSTHROUGH_LEVELS.contains(&level) {
                return Err(TaxonomyError::ConfigError {
                    message: format!("level '{}' is passed through and cannot have rules", level),
                });
            }

            let labels = &self.level(level)?.labels;
            let mut seen = HashSet::new();

            for rule in rules {
                if !labels.contains(&rule.label) {
                    return Err(TaxonomyError::ConfigError {
                        message: format!(
                            "rule label '{}' is not a valid {} label",
                            rule.label, level
                        ),
                    });
                }
                if !seen.insert(rule.label.as_str()) {
                    return Err(TaxonomyError::ConfigError {
                        message: format!("label '{}' has more than one {} rule", rule.label, level),
                    });
                }
                validation::field(&format!("rules.{}.{}.weight", level, rule.label))
                    .within(rule.weight, 1..=MAX_RULE_WEIGHT)?;
                if rule.triggers.is_empty() {
                    return Err(TaxonomyError::ConfigError {
                        message: format!("{} rule '{}' has no triggers", level, rule.label),
                    });
                }

                for trigger in &rule.triggers {
                    let normalized = normalize_trigger(trigger);
                    let single_token = normalized.chars().all(char::is_alphanumeric);
                    // 單字觸發詞在斷詞時若會被捨棄，就永遠不會命中
                    if normalized.is_empty()
                        || (single_token
                            && (normalized.chars().count() < 2 || stop_words.contains(&normalized)))
                    {
                        return Err(TaxonomyError::ConfigError {
                            message: format!(
                                "trigger '{}' of {} rule '{}' can never match",
                                trigger, level, rule.label
                            ),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

impl Validate for RegistryConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

/// Lowercases and collapses runs of whitespace to a single space.
pub fn normalize_trigger(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
