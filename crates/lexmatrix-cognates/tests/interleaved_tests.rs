//! Interleaved form / cognate-code sheets and their missing-data tokens

use lexmatrix_cognates::interleaved::import_interleaved;
use lexmatrix_cognates::Diagnostics;
use lexmatrix_grid::Grid;

fn grid(unknown: &str) -> Grid {
    Grid::from_text_rows([
        vec!["", "Duala", "Ntomba"],
        vec!["all", "ɓɛ́sɛ̃(nk)", "umá"],
        vec!["", "1", unknown],
        vec!["arm", unknown, "lobɔ́kɔ"],
        vec!["", "7", "1"],
    ])
}

#[test]
fn question_marks_are_skipped() {
    let mut diagnostics = Diagnostics::new();
    let records = import_interleaved(&grid("?"), &mut diagnostics);
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["duala_all", "ntomba_arm"]);
    assert_eq!(records[0].form, "ɓɛ́sɛ̃(nk)");
    assert_eq!(records[0].cognateset.as_deref(), Some("1"));
    assert_eq!(records[1].concept, "arm");
    assert!(diagnostics.is_empty());
}

#[test]
fn dashes_are_real_forms() {
    let mut diagnostics = Diagnostics::new();
    let records = import_interleaved(&grid("-"), &mut diagnostics);
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["duala_all", "duala_arm", "ntomba_all", "ntomba_arm"]);
    assert_eq!(records[1].form, "-");
    assert_eq!(records[2].cognateset.as_deref(), Some("-"));
}

#[test]
fn records_serialize_with_table_headers() {
    let mut diagnostics = Diagnostics::new();
    let records = import_interleaved(&grid("?"), &mut diagnostics);
    let json = serde_json::to_value(&records[0]).unwrap();
    assert_eq!(json["ID"], "duala_all");
    assert_eq!(json["Language_ID"], "duala");
    assert_eq!(json["Parameter_ID"], "all");
    assert_eq!(json["Cognateset_ID"], "1");
    assert!(json["Comment"].is_null());
}
