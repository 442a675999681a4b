//! URL slugs for articles.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

const FALLBACK_SLUG: &str = "article";

fn non_alphanumeric_runs() -> &'static Regex {
    static PATTERN: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"[^a-z0-9]+").expect("Valid slug separator regex"));
    &PATTERN
}

/// Lowercase ASCII slug: diacritics stripped, every other run of characters
/// collapsed to a single `-`. Never empty.
pub fn slugify(title: &str) -> String {
    let lowered = title.trim().to_lowercase();
    let stripped: String = lowered.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let dashed = non_alphanumeric_runs().replace_all(&stripped, "-");
    let slug = dashed.trim_matches('-');

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug.to_string()
    }
}

/// `base` if free, otherwise the first of `base-2`, `base-3`, ... not in `taken`.
pub fn unique_slug(base: &str, taken: &HashSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{base}-{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}
