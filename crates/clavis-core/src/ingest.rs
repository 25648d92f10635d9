//! Lenient conversion of AI-shaped JSON into a [`Project`].
//!
//! Model output is only approximately shaped like a project: ids arrive as
//! numbers, states as bare strings, trait maps as JSON embedded in a string.
//! This module coerces what it can and records what it could not, so one
//! malformed record never fails the whole candidate.
//!
//! A malformed trait payload yields an empty trait map. Since trait merging
//! only fills gaps, the matched existing entity keeps its traits untouched.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::model::{Entity, EntityLink, Feature, FeatureState, Project, Traits};

/// Input that cannot be read as a project at all.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The text is not JSON.
    #[error("candidate is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON root is not an object (nor an object wrapping `project`).
    #[error("candidate root must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// What the lenient reader had to work around.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Entity ids whose trait payload was unreadable and was replaced by an
    /// empty map.
    pub malformed_traits: Vec<String>,
    /// Non-object entries skipped inside `features`.
    pub skipped_features: usize,
    /// Non-object entries skipped inside `entities`.
    pub skipped_entities: usize,
    /// Non-object/non-string entries skipped inside `states`.
    pub skipped_states: usize,
}

/// Parse candidate text leniently.
///
/// # Errors
///
/// Returns [`IngestError`] when the text is not JSON or not an object.
pub fn project_from_str(raw: &str) -> Result<(Project, IngestReport), IngestError> {
    let value: Value = serde_json::from_str(raw)?;
    project_from_value(&value)
}

/// Coerce an already-parsed JSON value into a project.
///
/// # Errors
///
/// Returns [`IngestError::NotAnObject`] when `value` is not an object.
pub fn project_from_value(value: &Value) -> Result<(Project, IngestReport), IngestError> {
    let root = value.as_object().ok_or_else(|| IngestError::NotAnObject(json_kind(value)))?;
    let root = match root.get("project") {
        Some(Value::Object(inner)) => inner,
        _ => root,
    };

    let mut report = IngestReport::default();

    let features = array(root, "features")
        .iter()
        .filter_map(|raw| {
            let parsed = raw.as_object().map(|obj| feature(obj, &mut report));
            if parsed.is_none() {
                report.skipped_features += 1;
            }
            parsed
        })
        .collect();

    let entities = array(root, "entities")
        .iter()
        .filter_map(|raw| {
            let parsed = raw.as_object().map(|obj| entity(obj, &mut report));
            if parsed.is_none() {
                report.skipped_entities += 1;
            }
            parsed
        })
        .collect();

    let project = Project {
        id: text(root, "id"),
        name: text(root, "name"),
        description: text(root, "description"),
        features,
        entities,
    };
    Ok((project, report))
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn feature(obj: &Map<String, Value>, report: &mut IngestReport) -> Feature {
    let id = text(obj, "id");
    let states = array(obj, "states")
        .iter()
        .filter_map(|raw| {
            let parsed = match raw {
                Value::Object(state) => Some(FeatureState {
                    id: text(state, "id"),
                    label: text(state, "label"),
                    image_url: optional_text(state, "imageUrl"),
                }),
                Value::String(_) | Value::Number(_) => scalar(raw).map(|label| FeatureState {
                    id: label.clone(),
                    label,
                    image_url: None,
                }),
                _ => None,
            };
            if parsed.is_none() {
                report.skipped_states += 1;
            }
            parsed
        })
        .collect();

    Feature {
        id,
        name: text(obj, "name"),
        image_url: optional_text(obj, "imageUrl"),
        states,
    }
}

fn entity(obj: &Map<String, Value>, report: &mut IngestReport) -> Entity {
    let id = text(obj, "id");
    let links = array(obj, "links")
        .iter()
        .enumerate()
        .filter_map(|(i, raw)| match raw {
            Value::Object(link) => Some(EntityLink {
                id: text(link, "id"),
                label: text(link, "label"),
                url: text(link, "url"),
            }),
            Value::String(url) if !url.trim().is_empty() => Some(EntityLink {
                id: format!("link-{}", i + 1),
                label: url.clone(),
                url: url.clone(),
            }),
            _ => None,
        })
        .collect();

    let traits = match obj.get("traits") {
        None | Some(Value::Null) => Traits::new(),
        Some(payload) => trait_payload(payload).unwrap_or_else(|| {
            warn!(entity = %id, "malformed trait payload; treating as no update");
            report.malformed_traits.push(id.clone());
            Traits::new()
        }),
    };

    Entity {
        name: text(obj, "name"),
        scientific_name: optional_text(obj, "scientificName"),
        family: optional_text(obj, "family"),
        description: optional_text(obj, "description"),
        image_url: optional_text(obj, "imageUrl"),
        links,
        traits,
        id,
    }
}

/// Read a trait map from an object, or from a string holding a JSON object.
fn trait_payload(payload: &Value) -> Option<Traits> {
    match payload {
        Value::Object(map) => Some(trait_map(map)),
        Value::String(embedded) if embedded.trim().is_empty() => Some(Traits::new()),
        Value::String(embedded) => match serde_json::from_str::<Value>(embedded).ok()? {
            Value::Object(map) => Some(trait_map(&map)),
            _ => None,
        },
        _ => None,
    }
}

fn trait_map(map: &Map<String, Value>) -> Traits {
    map.iter()
        .map(|(feature_id, states)| {
            let ids = match states {
                Value::Array(items) => items.iter().filter_map(scalar).collect(),
                other => scalar(other).into_iter().collect(),
            };
            (feature_id.clone(), ids)
        })
        .collect()
}

fn array<'v>(obj: &'v Map<String, Value>, key: &str) -> &'v [Value] {
    obj.get(key)
        .and_then(Value::as_array)
        .map_or(&[], Vec::as_slice)
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text(obj: &Map<String, Value>, key: &str) -> String {
    obj.get(key).and_then(scalar).unwrap_or_default()
}

fn optional_text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(scalar)
        .filter(|s| !s.trim().is_empty())
}
