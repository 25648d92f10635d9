//! Field-combination rules used when a candidate record meets its existing
//! counterpart.

use serde::{Deserialize, Serialize};

use crate::model::non_blank;

/// Stock image hosts whose URLs mean "no real image yet".
pub const PLACEHOLDER_DOMAINS: &[&str] = &[
    "picsum.photos",
    "placehold.co",
    "placehold.it",
    "placeholder.com",
    "via.placeholder.com",
    "dummyimage.com",
    "loremflickr.com",
    "placekitten.com",
    "fakeimg.pl",
    "source.unsplash.com",
];

/// A candidate description must be longer than this many characters to
/// replace an existing one. Downstream callers depend on this exact cutoff.
pub const DESCRIPTION_MIN_LEN: usize = 20;

/// Tunable merge rules. [`MergePolicy::default`] reproduces the constants above.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergePolicy {
    /// Substrings identifying placeholder image URLs.
    pub placeholder_domains: Vec<String>,
    /// See [`DESCRIPTION_MIN_LEN`].
    pub description_min_len: usize,
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            placeholder_domains: PLACEHOLDER_DOMAINS.iter().map(ToString::to_string).collect(),
            description_min_len: DESCRIPTION_MIN_LEN,
        }
    }
}

impl MergePolicy {
    /// Default policy plus additional placeholder domains.
    #[must_use]
    pub fn with_extra_placeholders<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for domain in extra {
            let domain = domain.into().trim().to_ascii_lowercase();
            if !domain.is_empty() && !self.placeholder_domains.contains(&domain) {
                self.placeholder_domains.push(domain);
            }
        }
        self
    }

    /// `true` when `url` is absent, blank, or served by a placeholder host.
    #[must_use]
    pub fn is_placeholder_or_empty(&self, url: Option<&str>) -> bool {
        let Some(url) = non_blank(url) else {
            return true;
        };
        let lowered = url.to_ascii_lowercase();
        self.placeholder_domains
            .iter()
            .any(|domain| lowered.contains(domain.as_str()))
    }

    /// Pick an image URL: a real existing image survives a placeholder or
    /// empty candidate; otherwise the candidate's wins when present.
    #[must_use]
    pub fn pick_image(&self, candidate: Option<&str>, existing: Option<&str>) -> Option<String> {
        let existing_is_real = !self.is_placeholder_or_empty(existing);
        if existing_is_real && self.is_placeholder_or_empty(candidate) {
            return existing.map(str::to_string);
        }
        non_blank(candidate)
            .or_else(|| non_blank(existing))
            .map(str::to_string)
    }

    /// Pick a description: a candidate longer than the threshold wins, else
    /// a present existing one, else whatever the candidate had.
    #[must_use]
    pub fn pick_description(
        &self,
        candidate: Option<&str>,
        existing: Option<&str>,
    ) -> Option<String> {
        if let Some(c) = candidate.filter(|c| c.chars().count() > self.description_min_len) {
            return Some(c.to_string());
        }
        non_blank(existing)
            .or(candidate)
            .map(str::to_string)
    }
}

/// Candidate's value when non-blank, else the existing one.
pub(crate) fn prefer_present(candidate: Option<&str>, existing: Option<&str>) -> Option<String> {
    non_blank(candidate)
        .or_else(|| non_blank(existing))
        .map(str::to_string)
}

/// Candidate's name when non-blank, else the existing name.
pub(crate) fn prefer_name(candidate: &str, existing: &str) -> String {
    if candidate.trim().is_empty() {
        existing.to_string()
    } else {
        candidate.to_string()
    }
}
