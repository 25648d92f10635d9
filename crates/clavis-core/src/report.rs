//! Statistics returned by a merge.
//!
//! Every counter is owned by the [`MergeReport`] a single merge call returns;
//! nothing is accumulated in shared state.

use serde::Serialize;

use crate::gate::Rejection;

/// Per-collection counts (entities or features).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    /// Records in the candidate project.
    pub candidate: usize,
    /// Records in the existing project.
    pub existing: usize,
    /// Candidate records merged into an existing counterpart.
    pub updated: usize,
    /// Candidate records with no existing counterpart.
    pub added: usize,
    /// Existing records the candidate never mentioned, appended unchanged.
    pub preserved: usize,
    /// Records in the final project.
    pub final_count: usize,
}

/// What happened to candidate trait entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TraitStats {
    /// Gaps in an existing trait map that candidate data filled.
    pub filled: usize,
    /// Candidate entries skipped because the existing entity already had data.
    pub kept_existing: usize,
    /// Entries passed through for brand-new candidate features.
    pub new_feature: usize,
    /// Entries dropped because their feature could not be resolved.
    pub dropped_features: usize,
    /// Individual state ids that could not be resolved.
    pub dropped_states: usize,
}

impl TraitStats {
    pub(crate) fn absorb(&mut self, other: Self) {
        self.filled += other.filled;
        self.kept_existing += other.kept_existing;
        self.new_feature += other.new_feature;
        self.dropped_features += other.dropped_features;
        self.dropped_states += other.dropped_states;
    }
}

/// What the sanitizer removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SanitizeReport {
    /// Trait entries whose feature no longer exists (or that became empty).
    pub stale_trait_entries: usize,
    /// State ids removed from trait lists.
    pub stale_state_ids: usize,
    /// Entities dropped as duplicate ids.
    pub duplicate_entities: usize,
    /// Features dropped as duplicate ids.
    pub duplicate_features: usize,
    /// States dropped as duplicate ids within a feature.
    pub duplicate_states: usize,
}

impl SanitizeReport {
    /// `true` when the sanitizer changed nothing.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.stale_trait_entries == 0
            && self.stale_state_ids == 0
            && self.duplicate_entities == 0
            && self.duplicate_features == 0
            && self.duplicate_states == 0
    }
}

/// Full account of one merge call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub entities: CollectionStats,
    pub features: CollectionStats,
    pub traits: TraitStats,
    pub sanitize: SanitizeReport,
    /// Set when the Safety Gate refused the candidate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<Rejection>,
}

impl MergeReport {
    /// `true` unless the Safety Gate rejected the candidate.
    #[must_use]
    pub const fn merged(&self) -> bool {
        self.rejection.is_none()
    }

    /// One-line human summary, e.g.
    /// `entities: 1 updated, 4 preserved, 0 new (5 total); features: ...`.
    #[must_use]
    pub fn summary(&self) -> String {
        if let Some(rejection) = &self.rejection {
            return format!("merge refused ({rejection}); original project preserved");
        }
        format!(
            "entities: {} updated, {} preserved, {} new ({} total); \
             features: {} updated, {} preserved, {} new ({} total); \
             traits: {} filled, {} dropped",
            self.entities.updated,
            self.entities.preserved,
            self.entities.added,
            self.entities.final_count,
            self.features.updated,
            self.features.preserved,
            self.features.added,
            self.features.final_count,
            self.traits.filled + self.traits.new_feature,
            self.traits.dropped_features + self.traits.dropped_states,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_mentions_counts() {
        let report = MergeReport {
            entities: CollectionStats {
                candidate: 1,
                existing: 5,
                updated: 1,
                added: 0,
                preserved: 4,
                final_count: 5,
            },
            ..MergeReport::default()
        };
        let text = report.summary();
        assert!(text.starts_with("entities: 1 updated, 4 preserved, 0 new (5 total)"));
        assert!(report.merged());
    }

    #[test]
    fn rejected_summary() {
        let report = MergeReport {
            rejection: Some(Rejection::EmptyResponse),
            ..MergeReport::default()
        };
        assert!(!report.merged());
        assert!(report.summary().contains("original project preserved"));
    }

    #[test]
    fn trait_stats_absorb_sums_fields() {
        let mut total = TraitStats {
            filled: 1,
            ..TraitStats::default()
        };
        total.absorb(TraitStats {
            filled: 2,
            dropped_states: 3,
            ..TraitStats::default()
        });
        assert_eq!(total.filled, 3);
        assert_eq!(total.dropped_states, 3);
    }

    #[test]
    fn clean_sanitize_report() {
        assert!(SanitizeReport::default().is_clean());
        assert!(
            !SanitizeReport {
                duplicate_features: 1,
                ..SanitizeReport::default()
            }
            .is_clean()
        );
    }
}
