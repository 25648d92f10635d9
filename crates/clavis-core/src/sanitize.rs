//! Final cleanup pass that restores the project invariants:
//!
//! - feature ids are unique, and state ids are unique within each feature;
//! - entity ids are unique;
//! - every trait key names an existing feature, and every state id in it
//!   belongs to that feature.
//!
//! Duplicates keep their first occurrence. Features are deduplicated before
//! the valid-state index is built so that a second pass finds nothing to do.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::model::{Entity, Feature, Project, Traits};
use crate::report::SanitizeReport;

/// Valid state ids per feature id.
pub type ValidStates = BTreeMap<String, BTreeSet<String>>;

/// Index the state ids of `features`. On duplicate feature ids the first wins.
#[must_use]
pub fn valid_state_ids(features: &[Feature]) -> ValidStates {
    let mut valid = ValidStates::new();
    for feature in features {
        valid
            .entry(feature.id.clone())
            .or_insert_with(|| feature.states.iter().map(|s| s.id.clone()).collect());
    }
    valid
}

/// Counts of what [`clean_traits`] removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraitCleanup {
    pub removed_entries: usize,
    pub removed_state_ids: usize,
}

/// Drop trait entries for unknown features, filter state ids down to the
/// feature's valid set (collapsing repeats), and drop entries left empty.
#[must_use]
pub fn clean_traits(traits: &Traits, valid: &ValidStates) -> (Traits, TraitCleanup) {
    let mut cleaned = Traits::new();
    let mut cleanup = TraitCleanup::default();

    for (feature_id, state_ids) in traits {
        let Some(allowed) = valid.get(feature_id) else {
            cleanup.removed_entries += 1;
            cleanup.removed_state_ids += state_ids.len();
            continue;
        };

        let mut seen = HashSet::new();
        let kept: Vec<String> = state_ids
            .iter()
            .filter(|sid| allowed.contains(sid.as_str()) && seen.insert(sid.as_str()))
            .cloned()
            .collect();
        cleanup.removed_state_ids += state_ids.len() - kept.len();

        if kept.is_empty() {
            cleanup.removed_entries += 1;
        } else {
            cleaned.insert(feature_id.clone(), kept);
        }
    }

    (cleaned, cleanup)
}

/// Run the full sanitizer over `project`, returning a new project.
#[must_use]
pub fn sanitize(project: &Project) -> (Project, SanitizeReport) {
    let mut report = SanitizeReport::default();

    let (features, duplicate_features, duplicate_states) = dedup_features(&project.features);
    report.duplicate_features = duplicate_features;
    report.duplicate_states = duplicate_states;

    let valid = valid_state_ids(&features);

    let mut seen = HashSet::new();
    let mut entities = Vec::with_capacity(project.entities.len());
    for entity in &project.entities {
        if !seen.insert(entity.id.as_str()) {
            report.duplicate_entities += 1;
            continue;
        }
        let (traits, cleanup) = clean_traits(&entity.traits, &valid);
        report.stale_trait_entries += cleanup.removed_entries;
        report.stale_state_ids += cleanup.removed_state_ids;
        entities.push(Entity {
            traits,
            ..entity.clone()
        });
    }

    if report.duplicate_entities > 0 || report.duplicate_features > 0 {
        warn!(
            duplicate_entities = report.duplicate_entities,
            duplicate_features = report.duplicate_features,
            "dropped duplicate ids"
        );
    }
    debug!(
        stale_trait_entries = report.stale_trait_entries,
        stale_state_ids = report.stale_state_ids,
        "sanitized trait references"
    );

    let sanitized = Project {
        features,
        entities,
        ..project.clone()
    };
    (sanitized, report)
}

fn dedup_features(features: &[Feature]) -> (Vec<Feature>, usize, usize) {
    let mut seen = HashSet::new();
    let mut duplicate_features = 0;
    let mut duplicate_states = 0;
    let mut kept = Vec::with_capacity(features.len());

    for feature in features {
        if !seen.insert(feature.id.as_str()) {
            duplicate_features += 1;
            continue;
        }
        let mut state_ids = HashSet::new();
        let states: Vec<_> = feature
            .states
            .iter()
            .filter(|s| state_ids.insert(s.id.as_str()))
            .cloned()
            .collect();
        duplicate_states += feature.states.len() - states.len();
        kept.push(Feature {
            states,
            ..feature.clone()
        });
    }

    (kept, duplicate_features, duplicate_states)
}

/// One broken project invariant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    DuplicateFeature { feature_id: String },
    DuplicateState { feature_id: String, state_id: String },
    DuplicateEntity { entity_id: String },
    UnknownFeature { entity_id: String, feature_id: String },
    UnknownState { entity_id: String, feature_id: String, state_id: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateFeature { feature_id } => write!(f, "duplicate feature id {feature_id}"),
            Self::DuplicateState {
                feature_id,
                state_id,
            } => write!(f, "duplicate state id {state_id} in feature {feature_id}"),
            Self::DuplicateEntity { entity_id } => write!(f, "duplicate entity id {entity_id}"),
            Self::UnknownFeature {
                entity_id,
                feature_id,
            } => write!(f, "entity {entity_id} references unknown feature {feature_id}"),
            Self::UnknownState {
                entity_id,
                feature_id,
                state_id,
            } => write!(
                f,
                "entity {entity_id} references unknown state {state_id} of feature {feature_id}"
            ),
        }
    }
}

/// List every invariant `project` breaks, without changing it.
#[must_use]
pub fn violations(project: &Project) -> Vec<Violation> {
    let mut found = Vec::new();

    let mut feature_ids = HashSet::new();
    for feature in &project.features {
        if !feature_ids.insert(feature.id.as_str()) {
            found.push(Violation::DuplicateFeature {
                feature_id: feature.id.clone(),
            });
            continue;
        }
        let mut state_ids = HashSet::new();
        for state in &feature.states {
            if !state_ids.insert(state.id.as_str()) {
                found.push(Violation::DuplicateState {
                    feature_id: feature.id.clone(),
                    state_id: state.id.clone(),
                });
            }
        }
    }

    let valid = valid_state_ids(&project.features);
    let mut entity_ids = HashSet::new();
    for entity in &project.entities {
        if !entity_ids.insert(entity.id.as_str()) {
            found.push(Violation::DuplicateEntity {
                entity_id: entity.id.clone(),
            });
        }
        for (feature_id, state_ids) in &entity.traits {
            let Some(allowed) = valid.get(feature_id) else {
                found.push(Violation::UnknownFeature {
                    entity_id: entity.id.clone(),
                    feature_id: feature_id.clone(),
                });
                continue;
            };
            for state_id in state_ids.iter().filter(|s| !allowed.contains(s.as_str())) {
                found.push(Violation::UnknownState {
                    entity_id: entity.id.clone(),
                    feature_id: feature_id.clone(),
                    state_id: state_id.clone(),
                });
            }
        }
    }

    found
}
