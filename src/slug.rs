//! URL-safe slugs for city and country names.
//!
//! The forward transform is deterministic and lossy: reverse lookup works by
//! re-slugging every candidate and taking the first match, so two names that
//! slug identically are ambiguous by construction. [`detect_slug_collisions`]
//! lets callers surface such duplicates when the cluster set is built.

use std::collections::HashMap;

/// Convert a display name to a URL-safe slug.
///
/// ASCII letters and digits are lowercased and kept; runs of separator
/// characters collapse to a single `-`; anything else (including non-ASCII)
/// is dropped. Trailing dashes are trimmed.
///
/// # Example
/// ```
/// use profile_mapper::to_slug;
///
/// assert_eq!(to_slug("New York"), "new-york");
/// assert_eq!(to_slug("St. Louis"), "st-louis");
/// assert_eq!(to_slug("  Rio de Janeiro  "), "rio-de-janeiro");
/// ```
pub fn to_slug(name: &str) -> String {
    let mut slug = String::new();
    let mut last_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if matches!(ch, '-' | '_' | ' ' | '/' | ':' | '.') {
            if !last_dash && !slug.is_empty() {
                slug.push('-');
                last_dash = true;
            }
        }
    }
    slug.trim_end_matches('-').to_string()
}

/// Reverse-lookup a slug against a candidate set.
///
/// Re-slugs each candidate's name and returns the first match in iteration
/// order, or `None`. O(n) per lookup; with colliding slugs the first
/// candidate wins.
///
/// # Example
/// ```
/// use profile_mapper::{from_slug, to_slug};
///
/// let cities = vec!["Lagos".to_string(), "New York".to_string()];
/// let hit = from_slug("new-york", &cities, |c| c.as_str());
/// assert_eq!(hit.map(String::as_str), Some("New York"));
/// assert!(from_slug("atlantis", &cities, |c| c.as_str()).is_none());
/// ```
pub fn from_slug<'a, T, F>(slug: &str, candidates: &'a [T], name: F) -> Option<&'a T>
where
    F: Fn(&T) -> &str,
{
    candidates.iter().find(|c| to_slug(name(c)) == slug)
}

/// Report slugs shared by more than one name.
///
/// Returns `(slug, names)` pairs sorted by slug. Useful at cluster-build
/// time to reject or rename ambiguous cities before they reach the router.
pub fn detect_slug_collisions<'a, I>(names: I) -> Vec<(String, Vec<String>)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut by_slug: HashMap<String, Vec<String>> = HashMap::new();
    for name in names {
        by_slug.entry(to_slug(name)).or_default().push(name.to_string());
    }

    let mut collisions: Vec<(String, Vec<String>)> = by_slug
        .into_iter()
        .filter(|(_, names)| names.len() > 1)
        .collect();
    collisions.sort_by(|a, b| a.0.cmp(&b.0));
    collisions
}
