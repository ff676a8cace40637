use std::sync::LazyLock;

use regex::Regex;

static PARENTHESISED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("valid parenthesis pattern"));
static BRACKETED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("valid bracket pattern"));
static EDITION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)-\s*(Remastered|Live|Edit|Version|Mono|Stereo|Explicit|Single Mix|Radio Edit).*",
    )
    .expect("valid edition marker pattern")
});

/// Strip bracketed qualifiers and trailing edition markers.
pub fn clean_query(query: &str) -> String {
    let cleaned = PARENTHESISED.replace_all(query, "");
    let cleaned = BRACKETED.replace_all(&cleaned, "");
    let cleaned = EDITION_MARKER.replace(&cleaned, "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lookup variants for a query, most specific first and without repeats:
/// the query itself, its cleaned form, then the cleaned form with
/// `Artist - Track` swapped to `Track - Artist`.
pub fn query_variants(query: &str) -> Vec<String> {
    let original = query.trim().to_string();
    let cleaned = clean_query(&original);
    let swapped = cleaned
        .split_once(" - ")
        .map(|(artist, track)| format!("{track} - {artist}"));

    let mut variants: Vec<String> = Vec::with_capacity(3);
    for candidate in [Some(original), Some(cleaned), swapped].into_iter().flatten() {
        if !candidate.is_empty() && !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}
