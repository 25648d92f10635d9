//! Gap-filling merge of one candidate trait map into an existing one.
//!
//! Existing data always wins: a candidate entry is written only where the
//! existing entity has nothing recorded for the resolved feature. The
//! existing map is first cleaned against the existing feature set so stale
//! references left by an earlier failed merge cannot compound.

use crate::idmap::TranslationTable;
use crate::model::Traits;
use crate::report::TraitStats;
use crate::sanitize::{ValidStates, clean_traits};

/// Inputs shared by every trait merge within one project merge.
#[derive(Debug, Clone, Copy)]
pub struct TraitContext<'t> {
    /// Candidate -> existing id resolutions, computed once per merge.
    pub table: &'t TranslationTable,
    /// Valid state ids of the existing project's features.
    pub existing_valid: &'t ValidStates,
}

/// Merge `candidate` traits into `existing` traits.
///
/// The result never loses a valid `(feature, state)` pair of `existing`.
#[must_use]
pub fn merge_traits(
    candidate: &Traits,
    existing: &Traits,
    context: TraitContext<'_>,
) -> (Traits, TraitStats) {
    let (mut merged, _) = clean_traits(existing, context.existing_valid);
    let mut stats = TraitStats::default();

    for (candidate_feature_id, candidate_state_ids) in candidate {
        if let Some(existing_feature_id) = context.table.feature(candidate_feature_id) {
            let mut mapped: Vec<String> = Vec::new();
            for state_id in candidate_state_ids {
                match context.table.state(candidate_feature_id, state_id) {
                    Some(resolved) if !mapped.iter().any(|m| m == resolved) => {
                        mapped.push(resolved.to_string());
                    }
                    Some(_) => {}
                    None => stats.dropped_states += 1,
                }
            }
            if mapped.is_empty() {
                continue;
            }
            if has_data(&merged, existing_feature_id) {
                stats.kept_existing += 1;
            } else {
                merged.insert(existing_feature_id.to_string(), mapped);
                stats.filled += 1;
            }
        } else if context.table.is_new_feature(candidate_feature_id) {
            if candidate_state_ids.is_empty() || has_data(&merged, candidate_feature_id) {
                continue;
            }
            let mut ids: Vec<String> = Vec::with_capacity(candidate_state_ids.len());
            for state_id in candidate_state_ids {
                if !ids.contains(state_id) {
                    ids.push(state_id.clone());
                }
            }
            merged.insert(candidate_feature_id.clone(), ids);
            stats.new_feature += 1;
        } else {
            stats.dropped_features += 1;
        }
    }

    (merged, stats)
}

fn has_data(traits: &Traits, feature_id: &str) -> bool {
    traits.get(feature_id).is_some_and(|ids| !ids.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idmap::IdMapper;
    use crate::model::{Entity, Feature, FeatureState, Project};
    use crate::sanitize::valid_state_ids;

    fn feature(id: &str, name: &str, states: &[(&str, &str)]) -> Feature {
        Feature {
            id: id.into(),
            name: name.into(),
            image_url: None,
            states: states
                .iter()
                .map(|(sid, label)| FeatureState {
                    id: (*sid).into(),
                    label: (*label).into(),
                    image_url: None,
                })
                .collect(),
        }
    }

    fn traits(pairs: &[(&str, &[&str])]) -> Traits {
        pairs
            .iter()
            .map(|(f, s)| ((*f).to_string(), s.iter().map(|x| (*x).to_string()).collect()))
            .collect()
    }

    fn fixture() -> (Project, Project) {
        let existing = Project {
            features: vec![
                feature("f1", "Leaf shape", &[("s1", "Oval"), ("s2", "Round")]),
                feature("f2", "Flower colour", &[("red", "Red"), ("white", "White")]),
            ],
            ..Project::default()
        };
        let candidate = Project {
            features: vec![
                feature("c-leaf", "Leaf shape", &[("c-oval", "oval"), ("c-round", "round")]),
                feature("c-flower", "Flower colour", &[("c-white", "white")]),
                feature("c-bark", "Bark", &[("rough", "Rough")]),
            ],
            entities: vec![Entity {
                id: "x".into(),
                traits: traits(&[
                    ("c-leaf", &["c-round"]),
                    ("c-flower", &["c-white", "c-white", "bogus"]),
                    ("c-bark", &["rough"]),
                    ("ghost", &["g"]),
                ]),
                ..Entity::default()
            }],
            ..Project::default()
        };
        (candidate, existing)
    }

    #[test]
    fn fills_gaps_without_overwriting() {
        let (candidate, existing) = fixture();
        let mapper = IdMapper::new(&candidate, &existing);
        let table = TranslationTable::build(&mapper);
        let valid = valid_state_ids(&existing.features);
        let context = TraitContext {
            table: &table,
            existing_valid: &valid,
        };

        let existing_traits = traits(&[("f1", &["s1"])]);
        let (merged, stats) = merge_traits(&candidate.entities[0].traits, &existing_traits, context);

        assert_eq!(merged["f1"], vec!["s1"]);
        assert_eq!(merged["f2"], vec!["white"]);
        assert_eq!(merged["c-bark"], vec!["rough"]);
        assert!(!merged.contains_key("ghost"));

        assert_eq!(stats.kept_existing, 1);
        assert_eq!(stats.filled, 1);
        assert_eq!(stats.new_feature, 1);
        assert_eq!(stats.dropped_features, 1);
        // "bogus" has no label, no position, and is not numeric.
        assert_eq!(stats.dropped_states, 1);
    }

    #[test]
    fn stale_existing_references_are_cleaned_first() {
        let (candidate, existing) = fixture();
        let mapper = IdMapper::new(&candidate, &existing);
        let table = TranslationTable::build(&mapper);
        let valid = valid_state_ids(&existing.features);
        let context = TraitContext {
            table: &table,
            existing_valid: &valid,
        };

        // f1 only holds an invalid id, so it is a gap the candidate may fill.
        let existing_traits = traits(&[("f1", &["gone"]), ("old-feature", &["x"])]);
        let (merged, stats) = merge_traits(&candidate.entities[0].traits, &existing_traits, context);

        assert_eq!(merged["f1"], vec!["s2"]);
        assert!(!merged.contains_key("old-feature"));
        assert_eq!(stats.filled, 2);
    }

    #[test]
    fn empty_candidate_keeps_existing() {
        let (candidate, existing) = fixture();
        let mapper = IdMapper::new(&candidate, &existing);
        let table = TranslationTable::build(&mapper);
        let valid = valid_state_ids(&existing.features);
        let context = TraitContext {
            table: &table,
            existing_valid: &valid,
        };

        let existing_traits = traits(&[("f1", &["s1", "s2"]), ("f2", &["red"])]);
        let (merged, stats) = merge_traits(&Traits::new(), &existing_traits, context);
        assert_eq!(merged, existing_traits);
        assert_eq!(stats, TraitStats::default());
    }
}
