//! Translation of candidate feature/state identifiers into the existing
//! project's identifier space.
//!
//! The candidate and existing projects are two independently keyed graphs.
//! Each candidate reference is resolved by a priority-ordered list of
//! strategies, each a strictly weaker signal than the one before it:
//!
//! | features              | states                                 |
//! |-----------------------|----------------------------------------|
//! | 1. id already valid   | 1. id already valid                    |
//! | 2. name of the object | 2. exact normalized label              |
//! | 3. name from id index | 3. partial (substring) label           |
//! |                       | 4. position within the candidate feature |
//! |                       | 5. id parsed as a numeric index        |
//!
//! Resolution is total: failure is `None`, never an error.
//! [`TranslationTable`] runs every resolution once per merge so trait
//! merging is a table lookup.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::matcher::{labels_overlap, normalized_names_match};
use crate::model::{Feature, Project};
use crate::normalize::normalize;

/// How a candidate feature id was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureStrategy {
    DirectId,
    Name,
    IndexedName,
}

/// How a candidate state id was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateStrategy {
    DirectId,
    LabelExact,
    LabelPartial,
    Position,
    NumericIndex,
}

/// Resolver over one (candidate, existing) pair.
#[derive(Debug)]
pub struct IdMapper<'a> {
    candidate: &'a Project,
    existing: &'a Project,
    /// Normalized existing feature names, in feature order.
    existing_names: Vec<(String, &'a str)>,
    /// Candidate feature id -> name.
    names_by_id: HashMap<&'a str, &'a str>,
    /// Loosened candidate feature id -> name, for id-only references whose
    /// spelling drifted (case, spaces, `_`/`-`).
    names_by_loose_id: HashMap<String, &'a str>,
}

impl<'a> IdMapper<'a> {
    /// Build the lookup indexes for `candidate` against `existing`.
    #[must_use]
    pub fn new(candidate: &'a Project, existing: &'a Project) -> Self {
        let existing_names = existing
            .features
            .iter()
            .map(|f| (normalize(&f.name), f.id.as_str()))
            .collect();

        let mut names_by_id = HashMap::new();
        let mut names_by_loose_id = HashMap::new();
        for feature in &candidate.features {
            names_by_id
                .entry(feature.id.as_str())
                .or_insert(feature.name.as_str());
            names_by_loose_id
                .entry(loose_id(&feature.id))
                .or_insert(feature.name.as_str());
        }

        Self {
            candidate,
            existing,
            existing_names,
            names_by_id,
            names_by_loose_id,
        }
    }

    /// The candidate project this mapper reads from.
    #[must_use]
    pub const fn candidate(&self) -> &'a Project {
        self.candidate
    }

    /// The existing project this mapper resolves into.
    #[must_use]
    pub const fn existing(&self) -> &'a Project {
        self.existing
    }

    /// Resolve a candidate feature id to an existing feature id.
    #[must_use]
    pub fn map_feature_id(&self, candidate_feature_id: &str) -> Option<&'a str> {
        self.resolve_feature(candidate_feature_id).map(|(id, _)| id)
    }

    /// [`IdMapper::map_feature_id`] plus the strategy that succeeded.
    #[must_use]
    pub fn resolve_feature(&self, candidate_feature_id: &str) -> Option<(&'a str, FeatureStrategy)> {
        if let Some(feature) = self.existing.feature(candidate_feature_id) {
            return Some((feature.id.as_str(), FeatureStrategy::DirectId));
        }

        if let Some(feature) = self.candidate.feature(candidate_feature_id) {
            let found = self.existing_feature_named(&feature.name);
            debug!(candidate_feature_id, ?found, "feature resolved by name");
            return found.map(|id| (id, FeatureStrategy::Name));
        }

        let name = self
            .names_by_id
            .get(candidate_feature_id)
            .copied()
            .or_else(|| {
                self.names_by_loose_id
                    .get(&loose_id(candidate_feature_id))
                    .copied()
            })?;
        let found = self.existing_feature_named(name);
        debug!(candidate_feature_id, ?found, "feature resolved by id index");
        found.map(|id| (id, FeatureStrategy::IndexedName))
    }

    /// `true` when `candidate_feature_id` names a feature the candidate
    /// defines and the existing project does not know under any strategy.
    #[must_use]
    pub fn is_new_feature(&self, candidate_feature_id: &str) -> bool {
        self.candidate.has_feature(candidate_feature_id)
            && !self.existing.has_feature(candidate_feature_id)
            && self.map_feature_id(candidate_feature_id).is_none()
    }

    /// Resolve a candidate state id into a state of `existing_feature_id`.
    ///
    /// `candidate_feature_id` is the candidate-side feature the state was
    /// referenced under; the two features are assumed to correspond.
    #[must_use]
    pub fn map_state_id(
        &self,
        candidate_state_id: &str,
        existing_feature_id: &str,
        candidate_feature_id: &str,
    ) -> Option<&'a str> {
        self.resolve_state(candidate_state_id, existing_feature_id, candidate_feature_id)
            .map(|(id, _)| id)
    }

    /// [`IdMapper::map_state_id`] plus the strategy that succeeded.
    #[must_use]
    pub fn resolve_state(
        &self,
        candidate_state_id: &str,
        existing_feature_id: &str,
        candidate_feature_id: &str,
    ) -> Option<(&'a str, StateStrategy)> {
        let target = self.existing.feature(existing_feature_id)?;

        if let Some(state) = target.state(candidate_state_id) {
            return Some((state.id.as_str(), StateStrategy::DirectId));
        }

        let candidate_feature = self.candidate.feature(candidate_feature_id);

        if let Some(label) = self.candidate_state_label(candidate_state_id, candidate_feature) {
            let wanted = normalize(&label);
            if !wanted.is_empty() {
                let labels: Vec<String> = target.states.iter().map(|s| normalize(&s.label)).collect();
                if let Some(i) = labels.iter().position(|l| *l == wanted) {
                    return Some((target.states[i].id.as_str(), StateStrategy::LabelExact));
                }
                if let Some(i) = labels.iter().position(|l| labels_overlap(l, &wanted)) {
                    return Some((target.states[i].id.as_str(), StateStrategy::LabelPartial));
                }
            }
        }

        let by_position = candidate_feature
            .and_then(|f| f.state_index(candidate_state_id))
            .and_then(|index| target.states.get(index));
        if let Some(state) = by_position {
            return Some((state.id.as_str(), StateStrategy::Position));
        }

        let digits = candidate_state_id.trim();
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let index = digits.parse::<usize>().ok()?;
        target
            .states
            .get(index)
            .map(|state| (state.id.as_str(), StateStrategy::NumericIndex))
    }

    fn existing_feature_named(&self, name: &str) -> Option<&'a str> {
        let wanted = normalize(name);
        self.existing_names
            .iter()
            .find(|(existing, _)| normalized_names_match(&wanted, existing))
            .map(|(_, id)| *id)
    }

    /// Label of a candidate state: from its own feature, else from any
    /// candidate feature, else derived from an id shaped like `oval-leaf_3`.
    fn candidate_state_label(
        &self,
        candidate_state_id: &str,
        candidate_feature: Option<&'a Feature>,
    ) -> Option<String> {
        let own = candidate_feature
            .and_then(|f| f.state(candidate_state_id))
            .filter(|s| !s.label.trim().is_empty());
        if let Some(state) = own {
            return Some(state.label.clone());
        }

        let anywhere = self
            .candidate
            .features
            .iter()
            .filter_map(|f| f.state(candidate_state_id))
            .find(|s| !s.label.trim().is_empty());
        if let Some(state) = anywhere {
            return Some(state.label.clone());
        }

        label_from_state_id(candidate_state_id)
    }
}

/// Derive a label from a slug-like state id: drop the trailing `_<suffix>`
/// and turn dashes into spaces. Ids without `_` yield `None`.
#[must_use]
pub fn label_from_state_id(state_id: &str) -> Option<String> {
    let (stem, _) = state_id.rsplit_once('_')?;
    let label = stem.replace('-', " ");
    if label.trim().is_empty() {
        None
    } else {
        Some(label)
    }
}

fn loose_id(id: &str) -> String {
    normalize(&id.replace(['_', '-'], " "))
}

/// Resolve a candidate feature id without keeping a mapper around.
#[must_use]
pub fn map_feature_id(
    candidate_feature_id: &str,
    candidate: &Project,
    existing: &Project,
) -> Option<String> {
    IdMapper::new(candidate, existing)
        .map_feature_id(candidate_feature_id)
        .map(str::to_string)
}

/// Resolve a candidate state id without keeping a mapper around.
#[must_use]
pub fn map_state_id(
    candidate_state_id: &str,
    existing_feature_id: &str,
    candidate_feature_id: &str,
    candidate: &Project,
    existing: &Project,
) -> Option<String> {
    IdMapper::new(candidate, existing)
        .map_state_id(candidate_state_id, existing_feature_id, candidate_feature_id)
        .map(str::to_string)
}

/// Every candidate reference resolved once: `candidate id -> existing id | None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationTable {
    features: BTreeMap<String, Option<String>>,
    states: BTreeMap<(String, String), Option<String>>,
    new_features: BTreeMap<String, bool>,
}

impl TranslationTable {
    /// Resolve every feature and state id the candidate mentions, both in
    /// its feature list and in entity trait maps.
    #[must_use]
    pub fn build(mapper: &IdMapper<'_>) -> Self {
        let candidate = mapper.candidate();
        let mut table = Self::default();

        let feature_refs = candidate
            .features
            .iter()
            .map(|f| (f.id.as_str(), f.states.iter().map(|s| s.id.as_str()).collect::<Vec<_>>()))
            .chain(candidate.entities.iter().flat_map(|e| {
                e.traits
                    .iter()
                    .map(|(fid, sids)| (fid.as_str(), sids.iter().map(String::as_str).collect()))
            }));

        for (cfid, sids) in feature_refs {
            let resolved = table
                .features
                .entry(cfid.to_string())
                .or_insert_with(|| mapper.map_feature_id(cfid).map(str::to_string))
                .clone();
            table
                .new_features
                .entry(cfid.to_string())
                .or_insert_with(|| resolved.is_none() && mapper.is_new_feature(cfid));

            let Some(efid) = resolved else {
                continue;
            };
            for csid in sids {
                table
                    .states
                    .entry((cfid.to_string(), csid.to_string()))
                    .or_insert_with(|| {
                        mapper
                            .map_state_id(csid, &efid, cfid)
                            .map(str::to_string)
                    });
            }
        }

        table
    }

    /// Existing feature id for a candidate feature id.
    #[must_use]
    pub fn feature(&self, candidate_feature_id: &str) -> Option<&str> {
        self.features
            .get(candidate_feature_id)
            .and_then(Option::as_deref)
    }

    /// Existing state id for a candidate `(feature, state)` reference.
    #[must_use]
    pub fn state(&self, candidate_feature_id: &str, candidate_state_id: &str) -> Option<&str> {
        self.states
            .get(&(candidate_feature_id.to_string(), candidate_state_id.to_string()))
            .and_then(Option::as_deref)
    }

    /// `true` when the candidate feature is brand new to the existing project.
    #[must_use]
    pub fn is_new_feature(&self, candidate_feature_id: &str) -> bool {
        self.new_features
            .get(candidate_feature_id)
            .copied()
            .unwrap_or(false)
    }

    /// Number of candidate feature ids that resolved.
    #[must_use]
    pub fn resolved_features(&self) -> usize {
        self.features.values().filter(|v| v.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Entity, FeatureState};

    fn state(id: &str, label: &str) -> FeatureState {
        FeatureState {
            id: id.into(),
            label: label.into(),
            image_url: None,
        }
    }

    fn feature(id: &str, name: &str, states: Vec<FeatureState>) -> Feature {
        Feature {
            id: id.into(),
            name: name.into(),
            image_url: None,
            states,
        }
    }

    fn existing() -> Project {
        Project {
            id: "p".into(),
            features: vec![
                feature(
                    "leaf",
                    "Leaf shape",
                    vec![state("oval", "Oval"), state("lanceolate", "Lanceolate"), state("cordate", "Cordate")],
                ),
                feature("flower", "Flower colour", vec![state("red", "Red"), state("white", "White")]),
            ],
            ..Project::default()
        }
    }

    fn candidate() -> Project {
        Project {
            features: vec![
                feature(
                    "f1",
                    "Leaf Shape",
                    vec![state("s1", "oval"), state("s2", "Lanceolate leaves"), state("s3", "???")],
                ),
                feature("f9", "Bark texture", vec![state("smooth", "Smooth")]),
            ],
            ..Project::default()
        }
    }

    #[test]
    fn feature_direct_id_wins() {
        let (c, e) = (candidate(), existing());
        let mapper = IdMapper::new(&c, &e);
        assert_eq!(mapper.resolve_feature("flower"), Some(("flower", FeatureStrategy::DirectId)));
    }

    #[test]
    fn feature_resolves_by_name() {
        let (c, e) = (candidate(), existing());
        let mapper = IdMapper::new(&c, &e);
        assert_eq!(mapper.resolve_feature("f1"), Some(("leaf", FeatureStrategy::Name)));
        assert_eq!(mapper.map_feature_id("f9"), None);
        assert!(mapper.is_new_feature("f9"));
        assert!(!mapper.is_new_feature("f1"));
    }

    #[test]
    fn feature_resolves_drifted_id_through_index() {
        let (c, e) = (candidate(), existing());
        let mapper = IdMapper::new(&c, &e);
        assert_eq!(mapper.resolve_feature(" F1 "), Some(("leaf", FeatureStrategy::IndexedName)));
        assert_eq!(mapper.map_feature_id("unknown"), None);
    }

    #[test]
    fn state_strategies_in_priority_order() {
        let (c, e) = (candidate(), existing());
        let mapper = IdMapper::new(&c, &e);
        assert_eq!(mapper.resolve_state("cordate", "leaf", "f1"), Some(("cordate", StateStrategy::DirectId)));
        assert_eq!(mapper.resolve_state("s1", "leaf", "f1"), Some(("oval", StateStrategy::LabelExact)));
        assert_eq!(
            mapper.resolve_state("s2", "leaf", "f1"),
            Some(("lanceolate", StateStrategy::LabelPartial))
        );
        assert_eq!(mapper.resolve_state("s3", "leaf", "f1"), Some(("cordate", StateStrategy::Position)));
        assert_eq!(mapper.resolve_state("1", "leaf", "f1"), Some(("lanceolate", StateStrategy::NumericIndex)));
        assert_eq!(mapper.resolve_state("7", "leaf", "f1"), None);
        assert_eq!(mapper.resolve_state("-1", "leaf", "f1"), None);
    }

    #[test]
    fn numeric_index_rejects_signs_and_fractions() {
        let (c, e) = (candidate(), existing());
        let mapper = IdMapper::new(&c, &e);
        assert_eq!(mapper.resolve_state("+1", "leaf", "f1"), None);
        assert_eq!(mapper.resolve_state("1.0", "leaf", "f1"), None);
        assert_eq!(mapper.resolve_state(" 2 ", "leaf", "f1"), Some(("cordate", StateStrategy::NumericIndex)));
    }

    #[test]
    fn state_label_found_in_other_candidate_feature() {
        let e = existing();
        let c = Project {
            features: vec![feature("fx", "Flower colour", vec![state("w", "white")])],
            ..Project::default()
        };
        let mapper = IdMapper::new(&c, &e);
        // Referenced under an unknown candidate feature id; label comes from "fx".
        assert_eq!(mapper.map_state_id("w", "flower", "ghost"), Some("white"));
    }

    #[test]
    fn state_label_derived_from_slug_id() {
        let (c, e) = (candidate(), existing());
        let mapper = IdMapper::new(&c, &e);
        assert_eq!(
            mapper.resolve_state("cordate_7", "leaf", "ghost"),
            Some(("cordate", StateStrategy::LabelExact))
        );
        assert_eq!(label_from_state_id("heart-shaped_2").as_deref(), Some("heart shaped"));
        assert_eq!(label_from_state_id("plain"), None);
        assert_eq!(label_from_state_id("_x"), None);
    }

    #[test]
    fn unknown_existing_feature_maps_nothing() {
        let (c, e) = (candidate(), existing());
        let mapper = IdMapper::new(&c, &e);
        assert_eq!(mapper.map_state_id("oval", "nope", "f1"), None);
    }

    #[test]
    fn free_functions_match_mapper() {
        let (c, e) = (candidate(), existing());
        assert_eq!(map_feature_id("f1", &c, &e).as_deref(), Some("leaf"));
        assert_eq!(map_state_id("s1", "leaf", "f1", &c, &e).as_deref(), Some("oval"));
    }

    #[test]
    fn table_covers_features_and_trait_references() {
        let e = existing();
        let mut c = candidate();
        c.entities.push(Entity {
            id: "x".into(),
            traits: [("flower".to_string(), vec!["0".to_string()]), ("ghost".to_string(), vec!["a".to_string()])]
                .into_iter()
                .collect(),
            ..Entity::default()
        });

        let mapper = IdMapper::new(&c, &e);
        let table = TranslationTable::build(&mapper);
        assert_eq!(table.feature("f1"), Some("leaf"));
        assert_eq!(table.state("f1", "s2"), Some("lanceolate"));
        assert_eq!(table.state("flower", "0"), Some("red"));
        assert_eq!(table.feature("ghost"), None);
        assert!(table.is_new_feature("f9"));
        assert!(!table.is_new_feature("ghost"));
        assert_eq!(table.resolved_features(), 2);
    }
}
