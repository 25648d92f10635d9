//! Heuristic "same real-world item" test for entity and feature names.
//!
//! Permissive on purpose: a missed match duplicates a species in the key.
//!
//! Rules, applied to [`normalize`]d names:
//!
//! 1. exact equality;
//! 2. substring containment in either direction ("Eugenia uniflora" vs
//!    "Eugenia uniflora L.");
//! 3. token overlap: with tokens of length <= 2 dropped, both names start with
//!    the same token and share at least [`MIN_SHARED_TOKENS`] distinct tokens,
//!    or share exactly one when the shorter name has a single token.
//!
//! Blank names never match.

use std::collections::BTreeSet;

use crate::normalize::{normalize, significant_tokens};

/// Shared distinct tokens needed for a token-overlap match.
pub const MIN_SHARED_TOKENS: usize = 2;

/// Returns `true` when `a` and `b` name the same item. Symmetric.
///
/// # Examples
///
/// ```
/// use clavis_core::matcher::names_match;
///
/// assert!(names_match("Eugenia uniflora", "Eugenia uniflora L."));
/// assert!(names_match("Inga edulis Mart.", "inga edulis"));
/// assert!(!names_match("Inga edulis", "Inga laurina"));
/// ```
#[must_use]
pub fn names_match(a: &str, b: &str) -> bool {
    normalized_names_match(&normalize(a), &normalize(b))
}

/// [`names_match`] on names that are already normalized.
#[must_use]
pub fn normalized_names_match(na: &str, nb: &str) -> bool {
    if na.is_empty() || nb.is_empty() {
        return false;
    }
    if na == nb || na.contains(nb) || nb.contains(na) {
        return true;
    }

    let tokens_a = significant_tokens(na);
    let tokens_b = significant_tokens(nb);
    let (Some(first_a), Some(first_b)) = (tokens_a.first(), tokens_b.first()) else {
        return false;
    };
    if first_a != first_b {
        return false;
    }

    let set_a: BTreeSet<&str> = tokens_a.iter().copied().collect();
    let set_b: BTreeSet<&str> = tokens_b.iter().copied().collect();
    let shared = set_a.intersection(&set_b).count();
    let shorter = tokens_a.len().min(tokens_b.len());

    shared >= MIN_SHARED_TOKENS || (shared == 1 && shorter == 1)
}

/// Returns `true` when normalized labels are equal or one contains the other.
pub(crate) fn labels_overlap(na: &str, nb: &str) -> bool {
    !na.is_empty() && !nb.is_empty() && (na.contains(nb) || nb.contains(na))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_after_normalization() {
        assert!(names_match("Ipê Amarelo", "ipe   amarelo"));
    }

    #[test]
    fn author_suffix_is_substring_match() {
        assert!(names_match("Eugenia uniflora", "Eugenia uniflora L."));
        assert!(names_match("Eugenia uniflora L.", "Eugenia uniflora"));
    }

    #[test]
    fn two_shared_tokens_with_same_genus() {
        assert!(names_match(
            "Handroanthus impetiginosus (Mart.) Mattos",
            "Handroanthus impetiginosus Standl."
        ));
    }

    #[test]
    fn single_token_genus_matches_binomial() {
        // "sp" is dropped as a short token, leaving a one-token name.
        assert!(names_match("Acacia sp", "Acacia mangium"));
        assert!(names_match("Acacia mangium", "Acacia sp"));
    }

    #[test]
    fn same_genus_different_species_does_not_match() {
        assert!(!names_match("Inga edulis", "Inga laurina"));
    }

    #[test]
    fn different_first_token_does_not_match() {
        assert!(!names_match("Leaf shape", "Shape of leaf blade"));
    }

    #[test]
    fn short_tokens_are_ignored_for_overlap() {
        // Only "ab" and "cd" tokens, all dropped: no token overlap possible.
        assert!(!names_match("ab cd", "ab ef"));
    }

    #[test]
    fn blank_names_never_match() {
        assert!(!names_match("", ""));
        assert!(!names_match("   ", "Inga"));
        assert!(!names_match("Inga", ""));
    }

    #[test]
    fn symmetric_on_samples() {
        let names = [
            "Inga edulis",
            "Inga edulis Mart.",
            "Inga",
            "Leaf shape",
            "leaf",
            "Handroanthus impetiginosus",
            "",
        ];
        for a in names {
            for b in names {
                assert_eq!(names_match(a, b), names_match(b, a), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn label_overlap_requires_non_empty() {
        assert!(labels_overlap("oval", "oval to round"));
        assert!(!labels_overlap("", "oval"));
    }
}
