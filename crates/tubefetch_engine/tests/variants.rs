use pretty_assertions::assert_eq;
use tubefetch_engine::{clean_query, query_variants};

#[test]
fn cleaning_strips_brackets_and_edition_markers() {
    assert_eq!(clean_query("Band - Song (feat. Guest) [Official]"), "Band - Song");
    assert_eq!(clean_query("Band - Song - Remastered 2011"), "Band - Song");
    assert_eq!(clean_query("Band - Song - live at Wembley"), "Band - Song");
    assert_eq!(clean_query("Band - Song"), "Band - Song");
}

#[test]
fn variants_go_from_most_to_least_specific() {
    assert_eq!(
        query_variants("Band - Song (Radio Edit)"),
        vec![
            "Band - Song (Radio Edit)".to_string(),
            "Band - Song".to_string(),
            "Song - Band".to_string(),
        ]
    );
}

#[test]
fn variants_skip_repeats_and_missing_separator() {
    assert_eq!(
        query_variants("Band - Song"),
        vec!["Band - Song".to_string(), "Song - Band".to_string()]
    );
    assert_eq!(query_variants("Instrumental"), vec!["Instrumental".to_string()]);
}

#[test]
fn variants_are_deterministic() {
    let query = "Artist - Track [2019 Remaster] - Mono";
    assert_eq!(query_variants(query), query_variants(query));
}
