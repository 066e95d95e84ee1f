use crate::config::registry_config::normalize_trigger;
use crate::domain::model::{EvidenceBag, RawRecord};
use crate::utils::error::{Result, TaxonomyError};
use regex::{Regex, RegexSet};
use std::collections::{BTreeSet, HashSet};

const MIN_TOKEN_CHARS: usize = 2;
const FIELD_SEPARATOR: &str = " | ";
const WORD_CHARS: &str = r"\p{Alphabetic}\p{N}";

/// Turns a raw record into an [`EvidenceBag`].
///
/// Phrases are matched against the normalized text before tokenization, so a cue like
/// "self-driving" survives even though the tokenizer splits it into two words. Fields are
/// joined with a separator that no phrase can span, which keeps two unrelated tags from
/// forming a phrase together.
#[derive(Debug, Clone)]
pub struct EvidenceExtractor {
    phrases: Vec<String>,
    phrase_set: RegexSet,
    token_pattern: Regex,
    stop_words: HashSet<String>,
}

impl EvidenceExtractor {
    pub fn new<I>(phrases: I, stop_words: HashSet<String>) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let phrases: Vec<String> = phrases
            .into_iter()
            .map(|p| normalize_trigger(&p))
            .filter(|p| !p.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let patterns = phrases.iter().map(|phrase| {
            format!(
                r"(?:^|[^{w}]){}(?:$|[^{w}])",
                regex::escape(phrase),
                w = WORD_CHARS
            )
        });
        let phrase_set = RegexSet::new(patterns).map_err(|e| TaxonomyError::ConfigError {
            message: format!("invalid evidence phrase: {}", e),
        })?;

        let token_pattern =
            Regex::new(&format!("[{}]+", WORD_CHARS)).map_err(|e| TaxonomyError::ConfigError {
                message: format!("invalid token pattern: {}", e),
            })?;

        Ok(Self {
            phrases,
            phrase_set,
            token_pattern,
            stop_words,
        })
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn extract(&self, record: &RawRecord) -> EvidenceBag {
        let text = Self::normalized_text(record);

        let phrases: BTreeSet<String> = self
            .phrase_set
            .matches(&text)
            .into_iter()
            .map(|index| self.phrases[index].clone())
            .collect();

        let tokens: BTreeSet<String> = self
            .token_pattern
            .find_iter(&text)
            .map(|m| m.as_str())
            .filter(|token| token.chars().count() >= MIN_TOKEN_CHARS)
            .filter(|token| !self.stop_words.contains(*token))
            .map(str::to_string)
            .collect();

        EvidenceBag::from_parts(tokens, phrases, record.year, record.region.clone())
    }

    fn normalized_text(record: &RawRecord) -> String {
        std::iter::once(record.name.as_str())
            .chain(std::iter::once(record.description.as_str()))
            .chain(record.tags.iter().map(String::as_str))
            .chain(record.scraped_text.as_deref())
            .map(normalize_trigger)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(FIELD_SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> EvidenceExtractor {
        let phrases = ["surgical robot", "self-driving", "pipeline inspection"]
            .iter()
            .map(|p| p.to_string());
        let stop_words = ["a", "the", "for"].iter().map(|w| w.to_string()).collect();
        EvidenceExtractor::new(phrases, stop_words).unwrap()
    }

    #[test]
    fn test_tokens_are_lowercased_and_filtered() {
        let record = RawRecord::new("r1", "The X Walker").with_description("A robot for the lab");
        let bag = extractor().extract(&record);

        assert!(bag.contains("walker"));
        assert!(bag.contains("robot"));
        assert!(bag.contains("lab"));
        assert!(!bag.contains("x"));
        assert!(!bag.contains("the"));
        assert!(!bag.contains("for"));
    }

    #[test]
    fn test_phrases_survive_tokenization() {
        let record = RawRecord::new("r2", "Waymo Driver")
            .with_description("A Self-Driving   car platform for pipeline inspection");
        let bag = extractor().extract(&record);

        assert!(bag.contains("self-driving"));
        assert!(bag.contains("pipeline inspection"));
        assert!(bag.contains("self"));
        assert!(bag.contains("driving"));
        assert!(!bag.contains("surgical robot"));
    }

    #[test]
    fn test_phrases_need_word_boundaries() {
        let record = RawRecord::new("r3", "Bot").with_description("nonsurgical robotics kit");
        let bag = extractor().extract(&record);
        assert!(!bag.contains("surgical robot"));
    }

    #[test]
    fn test_phrases_do_not_span_separate_tags() {
        let record = RawRecord::new("r4", "Crawler").with_tags(["pipeline", "inspection"]);
        let bag = extractor().extract(&record);

        assert!(bag.contains("pipeline"));
        assert!(bag.contains("inspection"));
        assert!(!bag.contains("pipeline inspection"));
    }

    #[test]
    fn test_empty_record_yields_empty_bag() {
        let record = RawRecord::default();
        let bag = extractor().extract(&record);
        assert!(bag.is_empty());
        assert_eq!(bag.year, None);
    }

    #[test]
    fn test_passthrough_fields_and_scraped_text() {
        let record = RawRecord::new("r5", "Da Vinci")
            .with_scraped_text("The surgical robot used in hospitals")
            .with_year(2000)
            .with_region("US");
        let bag = extractor().extract(&record);

        assert!(bag.contains("surgical robot"));
        assert!(bag.contains("hospitals"));
        assert_eq!(bag.year, Some(2000));
        assert_eq!(bag.region.as_deref(), Some("US"));
    }

    #[test]
    fn test_extract_is_deterministic() {
        let record = RawRecord::new("r6", "Atlas")
            .with_description("Hydraulic humanoid")
            .with_tags(["research", "bipedal"]);
        let extractor = extractor();
        assert_eq!(extractor.extract(&record), extractor.extract(&record));
    }
}
