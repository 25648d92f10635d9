//! Project data model: features, their discrete states, and the entities
//! tagged with those states.
//!
//! The same types describe both the trusted *existing* project and an
//! untrusted *candidate* project. Nothing here enforces cross-references;
//! [`crate::sanitize`] restores them after a merge.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Trait map of one entity: feature id -> selected state ids.
///
/// A `BTreeMap` keeps serialization and iteration order deterministic.
pub type Traits = BTreeMap<String, Vec<String>>;

/// One discrete value a feature can take (e.g. "Oval").
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureState {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A classification axis (e.g. "Leaf Shape").
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub states: Vec<FeatureState>,
}

impl Feature {
    /// Look up a state of this feature by id.
    #[must_use]
    pub fn state(&self, state_id: &str) -> Option<&FeatureState> {
        self.states.iter().find(|s| s.id == state_id)
    }

    /// Returns `true` when `state_id` is one of this feature's state ids.
    #[must_use]
    pub fn has_state(&self, state_id: &str) -> bool {
        self.state(state_id).is_some()
    }

    /// Position of `state_id` inside [`Feature::states`].
    #[must_use]
    pub fn state_index(&self, state_id: &str) -> Option<usize> {
        self.states.iter().position(|s| s.id == state_id)
    }
}

/// An external reference attached to an entity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityLink {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub url: String,
}

/// An item (usually a species) classified by the key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scientific_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub links: Vec<EntityLink>,
    #[serde(default)]
    pub traits: Traits,
}

/// A complete identification key.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub features: Vec<Feature>,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

impl Project {
    /// First feature with the given id.
    #[must_use]
    pub fn feature(&self, feature_id: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.id == feature_id)
    }

    /// First entity with the given id.
    #[must_use]
    pub fn entity(&self, entity_id: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == entity_id)
    }

    /// Returns `true` when a feature with `feature_id` exists.
    #[must_use]
    pub fn has_feature(&self, feature_id: &str) -> bool {
        self.feature(feature_id).is_some()
    }
}

/// `Some(s)` when `s` holds something other than whitespace.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}
