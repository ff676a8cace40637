use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;
use tubefetch_core::ResolutionRecord;
use tubefetch_engine::{
    append_records, parse_table, read_records, read_table, sniff_delimiter, write_failed,
    TableError,
};

#[test]
fn sniffs_common_delimiters_from_the_header() {
    assert_eq!(sniff_delimiter("a,b,c\n1;2;3\n"), b',');
    assert_eq!(sniff_delimiter("Track Name;Artist Name(s);Album\n"), b';');
    assert_eq!(sniff_delimiter("query\turl\n"), b'\t');
    assert_eq!(sniff_delimiter("\"a;b\",c\n"), b',');
    assert_eq!(sniff_delimiter("query\n"), b',');
}

#[test]
fn parses_semicolon_export_with_bom_and_quotes() {
    let table = parse_table(
        "\u{feff}Track Name;Artist Name(s)\n\"Song; Part 2\";Band\nOther;\"A, B\"\n",
    )
    .unwrap();

    assert_eq!(table.headers(), ["Track Name", "Artist Name(s)"]);
    assert_eq!(table.len(), 2);
    assert_eq!(table.cell(0, 0), "Song; Part 2");
    assert_eq!(table.cell(1, 1), "A, B");
}

#[test]
fn missing_output_table_reads_as_empty() {
    let temp = TempDir::new().unwrap();
    let records = read_records(&temp.path().join("none.csv")).unwrap();
    assert!(records.is_empty());
}

#[test]
fn output_table_without_query_column_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("links.csv");
    fs::write(&path, "name,url\nx,y\n").unwrap();

    let err = read_records(&path).unwrap_err();
    assert!(matches!(err, TableError::MissingColumn { column: "query", .. }));
}

#[test]
fn append_writes_header_once_and_preserves_existing_rows() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("out").join("links.csv");

    append_records(
        &path,
        &[ResolutionRecord::resolved("A - X", "https://youtube.com/watch?v=1")],
    )
    .unwrap();
    let after_first = fs::read_to_string(&path).unwrap();
    assert_eq!(after_first, "query,url\nA - X,https://youtube.com/watch?v=1\n");

    append_records(
        &path,
        &[ResolutionRecord::resolved("B, Inc - Y", "https://youtube.com/watch?v=2")],
    )
    .unwrap();
    let after_second = fs::read_to_string(&path).unwrap();
    assert!(after_second.starts_with(&after_first));
    assert_eq!(
        read_records(&path).unwrap(),
        vec![
            ResolutionRecord::resolved("A - X", "https://youtube.com/watch?v=1"),
            ResolutionRecord::resolved("B, Inc - Y", "https://youtube.com/watch?v=2"),
        ]
    );
}

#[test]
fn append_completes_a_missing_trailing_newline() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("links.csv");
    fs::write(&path, "query,url\nA - X,https://youtube.com/watch?v=1").unwrap();

    append_records(&path, &[ResolutionRecord::resolved("B - Y", "https://youtube.com/watch?v=2")])
        .unwrap();

    assert_eq!(read_records(&path).unwrap().len(), 2);
}

#[test]
fn appending_nothing_does_not_create_the_table() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("links.csv");
    append_records(&path, &[]).unwrap();
    assert!(!path.exists());
}

#[test]
fn failed_table_is_rewritten_each_time() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("failed.csv");

    write_failed(&path, &["A - X".to_string(), "B - Y".to_string()]).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "query\nA - X\nB - Y\n");

    write_failed(&path, &["C - Z".to_string()]).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "query\nC - Z\n");

    write_failed(&path, &[]).unwrap();
    let table = read_table(&path).unwrap();
    assert_eq!(table.headers(), ["query"]);
    assert!(table.is_empty());
}
