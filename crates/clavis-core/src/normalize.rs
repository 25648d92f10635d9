//! Canonical form of free-text names for fuzzy comparison.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Canonicalize a name: lowercase, NFD-decompose, strip combining marks,
/// trim, and collapse whitespace runs to a single space.
///
/// Total and idempotent.
///
/// # Examples
///
/// ```
/// use clavis_core::normalize::normalize;
///
/// assert_eq!(normalize("  Ipê   Amarelo "), "ipe amarelo");
/// ```
#[must_use]
pub fn normalize(name: &str) -> String {
    let stripped: String = name
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();

    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Tokens of a normalized name longer than two characters.
pub(crate) fn significant_tokens(normalized: &str) -> Vec<&str> {
    normalized
        .split_whitespace()
        .filter(|t| t.chars().count() > 2)
        .collect()
}
