//! Lossless merge of a candidate project into an existing project.
//!
//! # Pipeline
//!
//! ```text
//! candidate ──► Safety Gate ──► reconcile entities/features ──► sanitize ──► project
//!                   │                 (IdMapper, TranslationTable,
//!                   └─ rejected ──►    trait gap-fill)
//!                      existing project, unchanged
//! ```
//!
//! # Guarantees
//!
//! - Every existing entity and feature id survives. Existing records the
//!   candidate never mentions are appended unchanged, so a truncated AI
//!   response cannot make anything disappear.
//! - A matched record keeps the existing id. A matched feature keeps the
//!   existing `states` array: trait values were already translated into
//!   existing state ids, and swapping in candidate states would orphan them.
//! - Existing trait data is never overwritten, only gaps are filled.
//! - The output always satisfies the project invariants (see
//!   [`crate::sanitize`]).
//!
//! Inputs are never mutated; every call builds a fresh project.

use tracing::{debug, info, instrument, warn};

use crate::gate::can_merge;
use crate::idmap::{IdMapper, TranslationTable};
use crate::matcher::normalized_names_match;
use crate::model::{Entity, Feature, Project, Traits, non_blank};
use crate::normalize::normalize;
use crate::policy::{MergePolicy, prefer_name, prefer_present};
use crate::report::{CollectionStats, MergeReport, TraitStats};
use crate::sanitize::{sanitize, valid_state_ids};
use crate::traits::{TraitContext, merge_traits};

/// Result of [`merge_projects`]: the project to keep plus what happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub project: Project,
    pub report: MergeReport,
}

/// Gate, reconcile, and sanitize with the default [`MergePolicy`].
///
/// # Examples
///
/// ```
/// use clavis_core::model::Project;
/// use clavis_core::merge_projects;
///
/// let existing = Project { id: "p1".into(), ..Project::default() };
/// let outcome = merge_projects(&Project::default(), &existing);
/// assert_eq!(outcome.project, existing);
/// assert!(!outcome.report.merged());
/// ```
#[must_use]
pub fn merge_projects(candidate: &Project, existing: &Project) -> MergeOutcome {
    merge_projects_with(candidate, existing, &MergePolicy::default())
}

/// Gate, reconcile, and sanitize.
///
/// On a Safety-Gate rejection the existing project is returned unchanged and
/// the rejection is recorded in the report.
#[must_use]
#[instrument(
    skip_all,
    fields(
        candidate_entities = candidate.entities.len(),
        candidate_features = candidate.features.len(),
        existing_entities = existing.entities.len(),
        existing_features = existing.features.len(),
    )
)]
pub fn merge_projects_with(
    candidate: &Project,
    existing: &Project,
    policy: &MergePolicy,
) -> MergeOutcome {
    if let Err(rejection) = can_merge(candidate) {
        warn!(reason = rejection.reason(), "candidate refused; keeping existing project");
        let report = MergeReport {
            rejection: Some(rejection),
            entities: CollectionStats {
                candidate: candidate.entities.len(),
                existing: existing.entities.len(),
                preserved: existing.entities.len(),
                final_count: existing.entities.len(),
                ..CollectionStats::default()
            },
            features: CollectionStats {
                candidate: candidate.features.len(),
                existing: existing.features.len(),
                preserved: existing.features.len(),
                final_count: existing.features.len(),
                ..CollectionStats::default()
            },
            ..MergeReport::default()
        };
        return MergeOutcome {
            project: existing.clone(),
            report,
        };
    }

    let (raw, mut report) = merge_projects_preserving_data(candidate, existing, policy);
    let (project, sanitize_report) = sanitize(&raw);
    report.sanitize = sanitize_report;
    report.entities.final_count = project.entities.len();
    report.features.final_count = project.features.len();

    info!(summary = %report.summary(), "merge complete");
    MergeOutcome { project, report }
}

/// Reconcile entities and features without gating or sanitizing.
///
/// The returned project may transiently hold duplicate ids or dangling trait
/// references; run [`sanitize`] before treating it as final.
#[must_use]
pub fn merge_projects_preserving_data(
    candidate: &Project,
    existing: &Project,
    policy: &MergePolicy,
) -> (Project, MergeReport) {
    let mapper = IdMapper::new(candidate, existing);
    let table = TranslationTable::build(&mapper);
    let existing_valid = valid_state_ids(&existing.features);
    let context = TraitContext {
        table: &table,
        existing_valid: &existing_valid,
    };
    debug!(
        resolved_features = table.resolved_features(),
        "built candidate translation table"
    );

    let mut report = MergeReport::default();
    let (entities, entity_stats, trait_stats) =
        reconcile_entities(candidate, existing, policy, context);
    let (features, feature_stats) = reconcile_features(candidate, existing, policy);
    report.entities = entity_stats;
    report.features = feature_stats;
    report.traits = trait_stats;

    let project = Project {
        id: non_blank(Some(existing.id.as_str()))
            .unwrap_or(candidate.id.as_str())
            .to_string(),
        // Candidate wins unless blank, unlike a plain spread of the candidate project.
        name: prefer_name(&candidate.name, &existing.name),
        description: prefer_name(&candidate.description, &existing.description),
        features,
        entities,
    };
    (project, report)
}

/// Index of the existing record matching by id, else by name.
fn find_counterpart(id: &str, name: &str, ids: &[&str], names: &[String]) -> Option<usize> {
    if let Some(index) = ids.iter().position(|existing| *existing == id) {
        return Some(index);
    }
    let wanted = normalize(name);
    names
        .iter()
        .position(|existing| normalized_names_match(&wanted, existing))
}

fn reconcile_entities(
    candidate: &Project,
    existing: &Project,
    policy: &MergePolicy,
    context: TraitContext<'_>,
) -> (Vec<Entity>, CollectionStats, TraitStats) {
    let ids: Vec<&str> = existing.entities.iter().map(|e| e.id.as_str()).collect();
    let names: Vec<String> = existing.entities.iter().map(|e| normalize(&e.name)).collect();
    let mut matched = vec![false; existing.entities.len()];

    let mut stats = CollectionStats {
        candidate: candidate.entities.len(),
        existing: existing.entities.len(),
        ..CollectionStats::default()
    };
    let mut trait_stats = TraitStats::default();
    let mut entities = Vec::with_capacity(candidate.entities.len() + existing.entities.len());

    for incoming in &candidate.entities {
        match find_counterpart(&incoming.id, &incoming.name, &ids, &names) {
            Some(index) => {
                matched[index] = true;
                let current = &existing.entities[index];
                let (traits, t) = merge_traits(&incoming.traits, &current.traits, context);
                trait_stats.absorb(t);
                debug!(candidate = %incoming.id, existing = %current.id, "entity matched");
                entities.push(merge_entity(incoming, current, traits, policy));
                stats.updated += 1;
            }
            None => {
                let (traits, t) = merge_traits(&incoming.traits, &Traits::new(), context);
                trait_stats.absorb(t);
                entities.push(Entity {
                    traits,
                    ..incoming.clone()
                });
                stats.added += 1;
            }
        }
    }

    for (entity, _) in existing
        .entities
        .iter()
        .zip(&matched)
        .filter(|(_, was_matched)| !**was_matched)
    {
        entities.push(entity.clone());
        stats.preserved += 1;
    }

    stats.final_count = entities.len();
    (entities, stats, trait_stats)
}

fn merge_entity(incoming: &Entity, current: &Entity, traits: Traits, policy: &MergePolicy) -> Entity {
    Entity {
        id: current.id.clone(),
        name: prefer_name(&incoming.name, &current.name),
        scientific_name: prefer_present(
            incoming.scientific_name.as_deref(),
            current.scientific_name.as_deref(),
        ),
        family: prefer_present(incoming.family.as_deref(), current.family.as_deref()),
        description: policy.pick_description(
            incoming.description.as_deref(),
            current.description.as_deref(),
        ),
        image_url: policy.pick_image(incoming.image_url.as_deref(), current.image_url.as_deref()),
        links: if incoming.links.is_empty() {
            current.links.clone()
        } else {
            incoming.links.clone()
        },
        traits,
    }
}

fn reconcile_features(
    candidate: &Project,
    existing: &Project,
    policy: &MergePolicy,
) -> (Vec<Feature>, CollectionStats) {
    let ids: Vec<&str> = existing.features.iter().map(|f| f.id.as_str()).collect();
    let names: Vec<String> = existing.features.iter().map(|f| normalize(&f.name)).collect();
    let mut matched = vec![false; existing.features.len()];

    let mut stats = CollectionStats {
        candidate: candidate.features.len(),
        existing: existing.features.len(),
        ..CollectionStats::default()
    };
    let mut features = Vec::with_capacity(candidate.features.len() + existing.features.len());

    for incoming in &candidate.features {
        if let Some(index) = find_counterpart(&incoming.id, &incoming.name, &ids, &names) {
            matched[index] = true;
            let current = &existing.features[index];
            features.push(Feature {
                id: current.id.clone(),
                name: prefer_name(&incoming.name, &current.name),
                image_url: policy
                    .pick_image(incoming.image_url.as_deref(), current.image_url.as_deref()),
                states: current.states.clone(),
            });
            stats.updated += 1;
        } else {
            features.push(incoming.clone());
            stats.added += 1;
        }
    }

    for (feature, _) in existing
        .features
        .iter()
        .zip(&matched)
        .filter(|(_, was_matched)| !**was_matched)
    {
        features.push(feature.clone());
        stats.preserved += 1;
    }

    stats.final_count = features.len();
    (features, stats)
}
