//! Diversity and phylogenetic distance over a [`ClassificationStore`].
//!
//! Distance walks [`DISTANCE_LEVELS`] from species up to domain. Kingdom is left out of
//! the walk because the registry only ever holds a single kingdom label, and the
//! orthogonal `primary_role` and `region` dimensions are not ranks. Two records are
//! `d` apart when the most general level at which they disagree sits at position `d - 1`
//! of the walk, so the largest possible distance is [`MAX_DISTANCE`].
//!
//! Taking the most general disagreement (rather than the first agreement from below)
//! makes the distance an ultrametric: `d(a, c) <= max(d(a, b), d(b, c))`, which in turn
//! implies the ordinary triangle inequality.

use crate::domain::model::{ClassifiedRecord, Level};
use crate::taxonomy::store::ClassificationStore;
use crate::utils::error::{Result, TaxonomyError};
use serde::Serialize;

/// Ranks compared by [`distance`], most specific first.
pub const DISTANCE_LEVELS: [Level; 6] = [
    Level::Species,
    Level::Genus,
    Level::Family,
    Level::Order,
    Level::Class,
    Level::Domain,
];

pub const MAX_DISTANCE: u32 = DISTANCE_LEVELS.len() as u32;

/// Shannon entropy `H = -Σ p ln p` of a count distribution. Zero counts are ignored.
/// `None` when the counts sum to zero.
pub fn shannon_index<I>(counts: I) -> Option<f64>
where
    I: IntoIterator<Item = usize>,
{
    let counts: Vec<usize> = counts.into_iter().filter(|&c| c > 0).collect();
    let total: usize = counts.iter().sum();
    if total == 0 {
        return None;
    }

    let total = total as f64;
    // fold from +0.0 so a single label yields 0.0 rather than -0.0
    Some(counts.iter().fold(0.0, |acc, &count| {
        let p = count as f64 / total;
        acc - p * p.ln()
    }))
}

pub fn diversity(store: &ClassificationStore, level: Level) -> Result<f64> {
    shannon_index(store.count_by(level).into_values()).ok_or_else(|| {
        TaxonomyError::EmptyPopulationError {
            level: level.to_string(),
        }
    })
}

/// Same as [`diversity`] for a level given by name.
pub fn diversity_by_name(store: &ClassificationStore, level: &str) -> Result<f64> {
    diversity(store, level.parse()?)
}

pub fn distance(a: &ClassifiedRecord, b: &ClassifiedRecord) -> u32 {
    distance_over(&DISTANCE_LEVELS, a, b)
}

/// Distance over an arbitrary walk, ordered most specific first.
pub fn distance_over(levels: &[Level], a: &ClassifiedRecord, b: &ClassifiedRecord) -> u32 {
    levels
        .iter()
        .rposition(|&level| a.label(level) != b.label(level))
        .map(|position| position as u32 + 1)
        .unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelDiversity {
    pub level: Level,
    pub richness: usize,
    pub shannon: f64,
    /// Pielou's evenness `H / ln S`; absent when only one label is present.
    pub evenness: Option<f64>,
}

/// Richness, Shannon index and evenness for every level, in [`Level::ALL`] order.
pub fn diversity_profile(store: &ClassificationStore) -> Result<Vec<LevelDiversity>> {
    Level::ALL
        .iter()
        .map(|&level| {
            let shannon = diversity(store, level)?;
            let richness = store.count_by(level).len();
            let evenness = (richness > 1).then(|| shannon / (richness as f64).ln());
            Ok(LevelDiversity {
                level,
                richness,
                shannon,
                evenness,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relative {
    pub id: String,
    pub name: String,
    pub distance: u32,
}

/// The `top_n` records closest to `id`, nearest first. Equal distances keep store order.
pub fn nearest_relatives(store: &ClassificationStore, id: &str, top_n: usize) -> Result<Vec<Relative>> {
    let target = store.get(id)?;

    let mut relatives: Vec<Relative> = store
        .iter()
        .filter(|other| other.id != target.id)
        .map(|other| Relative {
            id: other.id.clone(),
            name: other.name.clone(),
            distance: distance(target, other),
        })
        .collect();

    // stable sort keeps insertion order among ties
    relatives.sort_by_key(|r| r.distance);
    relatives.truncate(top_n);
    Ok(relatives)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, labels: [&str; 6]) -> ClassifiedRecord {
        let [domain, class, order, family, genus, species] = labels;
        ClassifiedRecord {
            id: id.to_string(),
            name: id.to_string(),
            domain: domain.to_string(),
            kingdom: "Robotae".to_string(),
            class: class.to_string(),
            order: order.to_string(),
            family: family.to_string(),
            genus: genus.to_string(),
            species: species.to_string(),
            primary_role: "Other".to_string(),
            year: None,
            region: "UN".to_string(),
        }
    }

    const BASE: [&str; 6] = [
        "Physical",
        "Legged",
        "Quadruped",
        "Vision_Based",
        "Electric",
        "Pipeline_Inspection",
    ];

    #[test]
    fn test_shannon_index() {
        assert_eq!(shannon_index(Vec::<usize>::new()), None);
        assert_eq!(shannon_index([0, 0]), None);
        assert_eq!(shannon_index([7]), Some(0.0));
        assert_eq!(shannon_index([5, 0]), Some(0.0));

        let h = shannon_index([1, 1]).unwrap();
        assert!((h - 2f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_single_label_diversity_is_positive_zero() {
        let h = shannon_index([3]).unwrap();
        assert!(h.is_sign_positive());
    }

    #[test]
    fn test_distance_levels() {
        let a = record("a", BASE);

        let mut species = BASE;
        species[5] = "Industrial_Inspection";
        assert_eq!(distance(&a, &record("b", species)), 1);

        let mut genus = BASE;
        genus[4] = "Hydraulic";
        assert_eq!(distance(&a, &record("c", genus)), 2);

        let mut class = BASE;
        class[1] = "Wheeled";
        assert_eq!(distance(&a, &record("d", class)), 5);

        let mut domain = BASE;
        domain[0] = "Virtual";
        assert_eq!(distance(&a, &record("e", domain)), MAX_DISTANCE);
    }

    #[test]
    fn test_distance_ignores_orthogonal_dimensions() {
        let a = record("a", BASE);
        let mut b = record("b", BASE);
        b.primary_role = "Inspection".to_string();
        b.region = "JP".to_string();
        b.year = Some(2010);
        assert_eq!(distance(&a, &b), 0);
    }

    #[test]
    fn test_most_general_difference_decides() {
        // species agree by coincidence but class differs
        let a = record("a", BASE);
        let mut other = BASE;
        other[1] = "Wheeled";
        other[2] = "Car_Like";
        assert_eq!(distance(&a, &record("b", other)), 5);
    }

    #[test]
    fn test_custom_walk() {
        let a = record("a", BASE);
        let mut other = BASE;
        other[1] = "Wheeled";
        let b = record("b", other);
        assert_eq!(distance_over(&[Level::Species, Level::Genus], &a, &b), 0);
        assert_eq!(distance_over(&[Level::Species, Level::Class], &a, &b), 2);
    }

    #[test]
    fn test_nearest_relatives() {
        let mut store = ClassificationStore::new();
        store.add(record("target", BASE)).unwrap();

        let mut far = BASE;
        far[0] = "Virtual";
        store.add(record("far", far)).unwrap();

        let mut near = BASE;
        near[5] = "Other";
        store.add(record("near_1", near)).unwrap();
        store.add(record("near_2", near)).unwrap();

        let relatives = nearest_relatives(&store, "target", 2).unwrap();
        let ids: Vec<&str> = relatives.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["near_1", "near_2"]);
        assert!(relatives.iter().all(|r| r.distance == 1));

        assert!(nearest_relatives(&store, "missing", 3).is_err());
        assert_eq!(nearest_relatives(&store, "target", 10).unwrap().len(), 3);
    }

    #[test]
    fn test_diversity_profile() {
        let mut store = ClassificationStore::new();
        store.add(record("a", BASE)).unwrap();
        let mut other = BASE;
        other[1] = "Aerial";
        store.add(record("b", other)).unwrap();

        let profile = diversity_profile(&store).unwrap();
        assert_eq!(profile.len(), Level::ALL.len());

        let class = profile.iter().find(|d| d.level == Level::Class).unwrap();
        assert_eq!(class.richness, 2);
        assert!((class.evenness.unwrap() - 1.0).abs() < 1e-12);

        let kingdom = profile.iter().find(|d| d.level == Level::Kingdom).unwrap();
        assert_eq!(kingdom.richness, 1);
        assert_eq!(kingdom.shannon, 0.0);
        assert_eq!(kingdom.evenness, None);

        assert!(diversity_profile(&ClassificationStore::new()).is_err());
    }

    #[test]
    fn test_diversity_by_name_rejects_unknown_level() {
        let mut store = ClassificationStore::new();
        store.add(record("a", BASE)).unwrap();
        assert!(matches!(
            diversity_by_name(&store, "phylum"),
            Err(TaxonomyError::UnknownLevelError { .. })
        ));
        assert_eq!(diversity_by_name(&store, "class").unwrap(), 0.0);
    }
}
