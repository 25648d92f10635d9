//! End-to-end merge scenarios: truncated AI responses, placeholder images,
//! empty candidates, and duplicate ids left behind by a faulty merge step.

use clavis_core::gate::Rejection;
use clavis_core::ingest::project_from_value;
use clavis_core::model::{Entity, Feature, FeatureState, Project, Traits};
use clavis_core::policy::MergePolicy;
use clavis_core::sanitize::sanitize;
use clavis_core::{merge_projects, merge_projects_preserving_data};
use serde_json::json;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn traits(pairs: &[(&str, &[&str])]) -> Traits {
    pairs
        .iter()
        .map(|(f, s)| ((*f).to_string(), s.iter().map(|x| (*x).to_string()).collect()))
        .collect()
}

fn leaf_shape(state_id: &str) -> Feature {
    Feature {
        id: "f1".into(),
        name: "Leaf shape".into(),
        image_url: None,
        states: vec![FeatureState {
            id: state_id.into(),
            label: "Oval".into(),
            image_url: None,
        }],
    }
}

fn tree(id: &str, name: &str) -> Entity {
    Entity {
        id: id.into(),
        name: name.into(),
        traits: traits(&[("f1", &["s1"])]),
        ..Entity::default()
    }
}

fn five_trees() -> Project {
    Project {
        id: "p-1".into(),
        name: "Trees".into(),
        description: String::new(),
        features: vec![leaf_shape("s1")],
        entities: vec![
            tree("e1", "Inga edulis"),
            tree("e2", "Acacia mangium"),
            tree("e3", "Ficus benjamina"),
            tree("e4", "Cedrela odorata"),
            tree("e5", "Mimosa pudica"),
        ],
    }
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn placeholder_image_and_existing_trait_survive_a_name_match() {
    let existing = Project {
        features: vec![leaf_shape("s1")],
        entities: vec![Entity {
            id: "e1".into(),
            name: "Inga edulis".into(),
            image_url: Some("https://real.jpg".into()),
            traits: traits(&[("f1", &["s1"])]),
            ..Entity::default()
        }],
        ..Project::default()
    };
    let candidate = Project {
        features: vec![leaf_shape("s2")],
        entities: vec![Entity {
            id: "x1".into(),
            name: "Inga edulis Mart.".into(),
            image_url: Some("https://picsum.photos/seed/x/400/300".into()),
            traits: traits(&[("f1", &["s2"])]),
            ..Entity::default()
        }],
        ..Project::default()
    };

    let outcome = merge_projects(&candidate, &existing);
    assert_eq!(outcome.project.entities.len(), 1);
    let merged = &outcome.project.entities[0];
    assert_eq!(merged.id, "e1");
    assert_eq!(merged.image_url.as_deref(), Some("https://real.jpg"));
    assert_eq!(merged.traits["f1"], vec!["s1"]);
    assert_eq!(outcome.report.traits.kept_existing, 1);
}

#[test]
fn truncated_candidate_keeps_every_existing_entity() {
    let existing = five_trees();
    let candidate = Project {
        features: vec![leaf_shape("s1")],
        entities: vec![Entity {
            description: Some("Leguminous tree with long edible pods.".into()),
            ..tree("e3", "Ficus benjamina")
        }],
        ..Project::default()
    };

    let outcome = merge_projects(&candidate, &existing);
    let ids: Vec<&str> = outcome.project.entities.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, ["e3", "e1", "e2", "e4", "e5"]);
    assert_eq!(outcome.report.entities.updated, 1);
    assert_eq!(outcome.report.entities.preserved, 4);
    assert_eq!(outcome.report.entities.final_count, 5);
    assert!(outcome.project.entities[0].description.is_some());
}

#[test]
fn empty_candidate_returns_existing_unchanged() {
    let existing = five_trees();
    let candidate = Project {
        features: vec![leaf_shape("s1")],
        ..Project::default()
    };

    let outcome = merge_projects(&candidate, &existing);
    assert_eq!(outcome.project, existing);
    assert_eq!(outcome.report.rejection, Some(Rejection::EmptyResponse));
    assert!(outcome.report.summary().contains("original project preserved"));
}

#[test]
fn featureless_candidate_is_refused() {
    let existing = five_trees();
    let candidate = Project {
        entities: vec![tree("x", "Inga edulis")],
        ..Project::default()
    };
    let outcome = merge_projects(&candidate, &existing);
    assert_eq!(outcome.project, existing);
    assert_eq!(outcome.report.rejection, Some(Rejection::NoFeatures));
}

#[test]
fn duplicate_feature_ids_collapse_to_the_first() {
    let mut second = leaf_shape("s9");
    second.name = "Leaf outline".into();
    let project = Project {
        features: vec![leaf_shape("s1"), second],
        ..five_trees()
    };

    let (clean, report) = sanitize(&project);
    assert_eq!(clean.features.len(), 1);
    assert_eq!(clean.features[0].name, "Leaf shape");
    assert!(clean.features[0].has_state("s1"));
    assert_eq!(report.duplicate_features, 1);
}

#[test]
fn raw_merge_exposes_duplicates_that_sanitize_removes() {
    let existing = five_trees();
    let candidate = Project {
        features: vec![leaf_shape("s1")],
        entities: vec![tree("e1", "Inga edulis"), tree("e1", "Inga edulis")],
        ..Project::default()
    };
    let (raw, _) = merge_projects_preserving_data(&candidate, &existing, &MergePolicy::default());
    assert_eq!(raw.entities.iter().filter(|e| e.id == "e1").count(), 2);

    let outcome = merge_projects(&candidate, &existing);
    assert_eq!(outcome.project.entities.iter().filter(|e| e.id == "e1").count(), 1);
    assert_eq!(outcome.report.sanitize.duplicate_entities, 1);
}

#[test]
fn malformed_trait_payload_leaves_existing_traits() {
    let existing = five_trees();
    let raw = json!({
        "project": {
            "features": [{"id": "f1", "name": "Leaf shape", "states": ["Oval"]}],
            "entities": [{"id": "e2", "name": "Acacia mangium", "traits": "{\"f1\": ["}]
        }
    });
    let (candidate, ingest) = project_from_value(&raw).expect("candidate is an object");
    assert_eq!(ingest.malformed_traits, vec!["e2"]);

    let outcome = merge_projects(&candidate, &existing);
    let acacia = outcome.project.entity("e2").expect("e2 kept");
    assert_eq!(acacia.traits["f1"], vec!["s1"]);
}
