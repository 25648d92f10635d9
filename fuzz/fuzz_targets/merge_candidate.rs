#![no_main]

use clavis_core::ingest::project_from_str;
use clavis_core::merge_projects;
use clavis_core::model::{Entity, Feature, FeatureState, Project};
use clavis_core::sanitize::violations;
use libfuzzer_sys::fuzz_target;

fn existing() -> Project {
    Project {
        id: "p".into(),
        name: "Fixture".into(),
        description: String::new(),
        features: vec![Feature {
            id: "f1".into(),
            name: "Leaf shape".into(),
            image_url: None,
            states: vec![
                FeatureState {
                    id: "s1".into(),
                    label: "Oval".into(),
                    image_url: None,
                },
                FeatureState {
                    id: "s2".into(),
                    label: "Round".into(),
                    image_url: None,
                },
            ],
        }],
        entities: vec![Entity {
            id: "e1".into(),
            name: "Inga edulis".into(),
            traits: [("f1".to_string(), vec!["s1".to_string()])].into_iter().collect(),
            ..Entity::default()
        }],
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok((candidate, _)) = project_from_str(text) else {
        return;
    };
    let existing = existing();
    let outcome = merge_projects(&candidate, &existing);

    assert!(outcome.project.entity("e1").is_some());
    assert!(outcome.project.feature("f1").is_some());
    if outcome.report.merged() {
        assert!(violations(&outcome.project).is_empty());
    } else {
        assert_eq!(outcome.project, existing);
    }
});
