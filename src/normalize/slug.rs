//! URL-safe slugs for newly inserted places

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s-]").expect("slug pattern is valid"));
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s-]+").expect("slug pattern is valid"));

/// Slug base used when a name has no word characters at all
const EMPTY_SLUG: &str = "place";

/// Lower-cases, strips non-word characters, collapses whitespace runs to a
/// single hyphen and trims hyphens from both ends.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped = NON_WORD.replace_all(&lowered, "");
    let hyphenated = SEPARATORS.replace_all(stripped.trim(), "-");
    hyphenated.trim_matches('-').to_string()
}

/// Slug for a new place: the name slug suffixed with the head of its id
pub fn place_slug(name: &str, id: &Uuid) -> String {
    let base = slugify(name);
    let base = if base.is_empty() { EMPTY_SLUG } else { base.as_str() };
    let simple = id.simple().to_string();
    format!("{}-{}", base, &simple[..8])
}
