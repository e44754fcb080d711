//! Export → import round trips of the cognate matrix
//!
//! 1. (form, cognateset) pairs survive unchanged
//! 2. Multi-valued cognateset properties keep order and separator
//! 3. Alignments and comments come back from the rendered cells
//! 4. Hand-edited quirks (continuation rows, unknown ids) are tolerated
//! 5. Languages without a usable name are still told apart

use lexmatrix_cognates::export::{ExportOptions, MatrixWriter};
use lexmatrix_cognates::import::{ImportOptions, MatrixImporter};
use lexmatrix_cognates::{DiagnosticKind, Snapshot};
use lexmatrix_dataset::{ColumnSchema, Dataset, DatasetSchema, Row, Value, COGNATESET_TABLE};
use lexmatrix_grid::{Cell, Grid};
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

// ============================================================================
// Fixtures
// ============================================================================

fn schema_with_tags() -> DatasetSchema {
    let mut schema = DatasetSchema::wordlist();
    schema
        .table_mut(COGNATESET_TABLE)
        .unwrap()
        .columns
        .push(ColumnSchema::new("Tags").with_separator(","));
    schema
}

/// `languages` languages with `forms_per_language` forms each; form `i` is
/// `f{i}` in language `l{i / forms_per_language}`.
fn wordlist(languages: usize, forms_per_language: usize) -> Dataset {
    let names: Vec<Option<String>> = (0..languages).map(|l| Some(format!("Language {l}"))).collect();
    named_wordlist(&names, forms_per_language)
}

/// Like [`wordlist`], with language `l{i}` named `names[i]`.
fn named_wordlist(names: &[Option<String>], forms_per_language: usize) -> Dataset {
    let languages = names.len();
    let mut dataset = Dataset::new(schema_with_tags());
    let language_rows = names
        .iter()
        .enumerate()
        .map(|(l, name)| {
            let row = Row::new().with("ID", format!("l{l}"));
            match name {
                Some(name) => row.with("Name", name.as_str()),
                None => row,
            }
        })
        .collect();
    let form_rows = (0..languages * forms_per_language)
        .map(|i| {
            Row::new()
                .with("ID", format!("f{i}"))
                .with("Language_ID", format!("l{}", i / forms_per_language))
                .with("Concept_ID", format!("c{}", i % forms_per_language))
                .with("Form", format!("wo{i}"))
                .with("Segments", Value::list(["w", "o"]))
        })
        .collect();
    dataset
        .write([("LanguageTable", language_rows), ("FormTable", form_rows)])
        .unwrap();
    dataset
}

fn pairs(rows: &[Row]) -> BTreeSet<(String, String)> {
    rows.iter()
        .map(|j| {
            (
                j.text("Form_ID").unwrap().to_string(),
                j.text("Cognateset").unwrap().to_string(),
            )
        })
        .collect()
}

fn tags(rows: &[Row]) -> BTreeMap<String, Vec<String>> {
    rows.iter()
        .map(|s| (s.text("ID").unwrap().to_string(), s.list("Tags")))
        .collect()
}

fn round_trip(dataset: &Dataset) -> (Vec<Row>, Vec<Row>, usize) {
    let snapshot = Snapshot::capture(dataset).unwrap();
    let exported = MatrixWriter::new(&snapshot, ExportOptions::default()).write();
    let outcome = MatrixImporter::new(&snapshot, ImportOptions::default())
        .unwrap()
        .import(&exported.grid)
        .unwrap();
    (
        outcome.cognatesets,
        outcome.judgements,
        outcome.diagnostics.len(),
    )
}

// ============================================================================
// Fixed cases
// ============================================================================

#[test]
fn multi_valued_properties_are_symmetric() {
    let mut dataset = wordlist(1, 1);
    let sets = vec![
        Row::new().with("ID", "s1").with("Tags", Value::list(["two", "tags"])),
        Row::new().with("ID", "s2").with("Tags", Value::List(Vec::new())),
        Row::new()
            .with("ID", "s3")
            .with("Tags", Value::list(["tag;containing;other;separator"])),
    ];
    dataset.write_table("CognatesetTable", sets.clone()).unwrap();

    let (cognatesets, _, diagnostics) = round_trip(&dataset);
    assert_eq!(tags(&cognatesets), tags(&sets));
    assert_eq!(diagnostics, 0);
}

#[test]
fn alignment_and_comments_survive() {
    let mut dataset = wordlist(2, 2);
    dataset
        .write([
            (
                "CognatesetTable",
                vec![Row::new()
                    .with("ID", "s1")
                    .with("Name", "first")
                    .with("Comment", "a set comment")],
            ),
            (
                "CognateTable",
                vec![
                    Row::new()
                        .with("ID", "f0-s1")
                        .with("Form_ID", "f0")
                        .with("Cognateset", "s1")
                        .with("Segment_Slice", Value::list(["2:2"]))
                        .with("Alignment", Value::list(["o"]))
                        .with("Comment", "only the vowel"),
                    Row::new()
                        .with("ID", "f2-s1")
                        .with("Form_ID", "f2")
                        .with("Cognateset", "s1"),
                ],
            ),
        ])
        .unwrap();

    let (cognatesets, judgements, diagnostics) = round_trip(&dataset);
    assert_eq!(diagnostics, 0);
    assert_eq!(cognatesets[0].text("Comment"), Some("a set comment"));
    assert_eq!(cognatesets[0].text("Name"), Some("first"));

    let f0 = judgements.iter().find(|j| j.text("ID") == Some("f0-s1")).unwrap();
    assert_eq!(f0.list("Segment_Slice"), vec!["2:2".to_string()]);
    assert_eq!(f0.list("Alignment"), vec!["o".to_string()]);
    assert_eq!(f0.text("Comment"), Some("only the vowel"));

    let f2 = judgements.iter().find(|j| j.text("ID") == Some("f2-s1")).unwrap();
    assert!(f2.list("Alignment").is_empty());
    assert_eq!(f2.text("Comment"), None);
}

#[test]
fn annotation_wins_over_comment_column() {
    let dataset = wordlist(1, 2);
    let snapshot = Snapshot::capture(&dataset).unwrap();
    let grid = Grid::from_rows(vec![
        vec![Cell::text("CogSet"), Cell::text("Comment"), Cell::text("Language 0")],
        vec![
            Cell::text("s1").with_comment("from the note"),
            Cell::text("from the column"),
            Cell::text("wo0").with_link("https://example.org/lexicon/f0"),
        ],
        vec![
            Cell::text("s2"),
            Cell::text("column only"),
            Cell::text("wo1").with_link("https://example.org/lexicon/f1"),
        ],
    ]);
    let outcome = MatrixImporter::new(&snapshot, ImportOptions::default())
        .unwrap()
        .import(&grid)
        .unwrap();

    assert_eq!(outcome.cognatesets[0].text("Comment"), Some("from the note"));
    assert_eq!(outcome.cognatesets[1].text("Comment"), Some("column only"));
    assert_eq!(outcome.diagnostics.count(DiagnosticKind::ParseAmbiguity), 1);
}

#[test]
fn continuation_rows_extend_the_previous_set() {
    let dataset = wordlist(1, 3);
    let snapshot = Snapshot::capture(&dataset).unwrap();
    let link = |id: &str| Cell::text(id).with_link(format!("https://example.org/lexicon/{id}"));
    let grid = Grid::from_rows(vec![
        vec![Cell::text("CogSet"), Cell::text("Language 0")],
        vec![Cell::empty(), link("f2")],
        vec![Cell::text("s1"), link("f0")],
        vec![Cell::empty(), link("f1")],
    ]);
    let outcome = MatrixImporter::new(&snapshot, ImportOptions::default())
        .unwrap()
        .import(&grid)
        .unwrap();

    assert_eq!(outcome.cognatesets.len(), 1);
    assert_eq!(
        pairs(&outcome.judgements),
        BTreeSet::from([
            ("f0".to_string(), "s1".to_string()),
            ("f1".to_string(), "s1".to_string()),
        ])
    );
    assert_eq!(outcome.diagnostics.count(DiagnosticKind::ParseAmbiguity), 1);
}

#[test]
fn unknown_form_ids_and_languages_are_skipped() {
    let dataset = wordlist(1, 2);
    let snapshot = Snapshot::capture(&dataset).unwrap();
    let grid = Grid::from_rows(vec![
        vec![Cell::text("CogSet"), Cell::text("Language 0"), Cell::text("Klingon")],
        vec![
            Cell::text("s1"),
            Cell::text("wo0\nghost")
                .with_link("https://example.org/lexicon/f0")
                .with_link("https://example.org/lexicon/nowhere"),
            Cell::text("x").with_link("https://example.org/lexicon/f1"),
        ],
    ]);
    let outcome = MatrixImporter::new(&snapshot, ImportOptions::default())
        .unwrap()
        .import(&grid)
        .unwrap();

    assert_eq!(
        pairs(&outcome.judgements),
        BTreeSet::from([("f0".to_string(), "s1".to_string())])
    );
    assert_eq!(outcome.diagnostics.count(DiagnosticKind::ReferenceMismatch), 2);
}

#[test]
fn form_back_references_are_refreshed() {
    let mut schema = schema_with_tags();
    let forms = schema.table_mut("FormTable").unwrap();
    forms.columns.push(ColumnSchema::new("Cognate_ID"));
    *forms = forms.clone().with_foreign_key("Cognate_ID", "cognates.csv");
    let mut dataset = Dataset::new(schema);
    dataset
        .write([
            (
                "LanguageTable",
                vec![Row::new().with("ID", "l0").with("Name", "Language 0")],
            ),
            (
                "FormTable",
                vec![
                    Row::new()
                        .with("ID", "f0")
                        .with("Language_ID", "l0")
                        .with("Concept_ID", "c0")
                        .with("Cognate_ID", "stale"),
                    Row::new()
                        .with("ID", "f1")
                        .with("Language_ID", "l0")
                        .with("Concept_ID", "c1"),
                ],
            ),
        ])
        .unwrap();
    let snapshot = Snapshot::capture(&dataset).unwrap();
    let grid = Grid::from_rows(vec![
        vec![Cell::text("CogSet"), Cell::text("Language 0")],
        vec![Cell::text("s1"), Cell::text("f1").with_link("https://example.org/lexicon/f1")],
    ]);
    let outcome = MatrixImporter::new(&snapshot, ImportOptions::default())
        .unwrap()
        .import(&grid)
        .unwrap();

    outcome.apply(&mut dataset).unwrap();
    let forms = dataset.rows("FormTable").unwrap();
    assert_eq!(forms[0].text("Cognate_ID"), None);
    assert_eq!(forms[1].text("Cognate_ID"), Some("f1-s1"));
    assert_eq!(dataset.rows("CognateTable").unwrap().len(), 1);
}

#[test]
fn nameless_and_shared_language_names_keep_their_judgements() {
    let names = [
        None,
        Some("Bantu".to_string()),
        Some("Bantu".to_string()),
        Some("l0".to_string()),
    ];
    let mut dataset = named_wordlist(&names, 1);
    let judgements: Vec<Row> = (0..4)
        .map(|i| {
            Row::new()
                .with("ID", format!("f{i}-s0"))
                .with("Form_ID", format!("f{i}"))
                .with("Cognateset", "s0")
        })
        .collect();
    dataset
        .write([
            ("CognatesetTable", vec![Row::new().with("ID", "s0")]),
            ("CognateTable", judgements.clone()),
        ])
        .unwrap();

    let snapshot = Snapshot::capture(&dataset).unwrap();
    let grid = MatrixWriter::new(&snapshot, ExportOptions::default()).write().grid;
    let labels: Vec<String> = (3..grid.width()).map(|c| grid.cell(0, c).clean_value()).collect();
    assert_eq!(labels, vec!["l0", "l1", "l2", "l3"]);

    let (_, imported, diagnostics) = round_trip(&dataset);
    assert_eq!(diagnostics, 0);
    assert_eq!(pairs(&imported), pairs(&judgements));
}

#[test]
fn braces_in_unaligned_forms_do_not_invent_alignments() {
    let mut dataset = wordlist(1, 1);
    let mut forms = dataset.rows("FormTable").unwrap().to_vec();
    forms[0].set("Form", "ab{c}");
    forms[0].set("Segments", Value::list(["a", "b", "c"]));
    dataset
        .write([
            ("FormTable", forms),
            ("CognatesetTable", vec![Row::new().with("ID", "s0")]),
            (
                "CognateTable",
                vec![Row::new()
                    .with("ID", "f0-s0")
                    .with("Form_ID", "f0")
                    .with("Cognateset", "s0")],
            ),
        ])
        .unwrap();

    let (_, judgements, diagnostics) = round_trip(&dataset);
    assert_eq!(diagnostics, 0);
    assert_eq!(judgements.len(), 1);
    assert!(judgements[0].list("Segment_Slice").is_empty());
    assert!(judgements[0].list("Alignment").is_empty());
}

#[test]
fn cell_values_are_whitespace_normalized() {
    let mut dataset = wordlist(1, 1);
    dataset
        .write_table(
            "CognatesetTable",
            vec![Row::new().with("ID", "s1").with("Tags", Value::list([" lead", "x "]))],
        )
        .unwrap();

    let (cognatesets, _, _) = round_trip(&dataset);
    assert_eq!(cognatesets[0].list("Tags"), vec!["lead", "x"]);
}

// ============================================================================
// Properties
// ============================================================================

#[derive(Debug, Clone)]
struct Case {
    language_names: Vec<Option<String>>,
    forms_per_language: usize,
    tags: Vec<Vec<String>>,
    memberships: Vec<BTreeSet<usize>>,
}

fn case_strategy() -> impl Strategy<Value = Case> {
    (1usize..4, 1usize..4, 1usize..5).prop_flat_map(|(languages, forms_per_language, sets)| {
        (
            prop::collection::vec(prop::option::of("Language [ab]|l[0-3]"), languages),
            prop::collection::vec(prop::collection::vec("[a-z]{1,5}", 0..3), sets),
            prop::collection::vec(
                prop::collection::vec(0..sets, 0..3),
                languages * forms_per_language,
            ),
        )
            .prop_map(move |(language_names, tags, memberships)| Case {
                language_names,
                forms_per_language,
                tags,
                memberships: memberships
                    .into_iter()
                    .map(|sets| sets.into_iter().collect())
                    .collect(),
            })
    })
}

fn dataset_for(case: &Case) -> Dataset {
    let mut dataset = named_wordlist(&case.language_names, case.forms_per_language);
    let sets = case
        .tags
        .iter()
        .enumerate()
        .map(|(k, tags)| {
            Row::new()
                .with("ID", format!("s{k}"))
                .with("Tags", Value::list(tags.iter().cloned()))
        })
        .collect();
    let judgements = case
        .memberships
        .iter()
        .enumerate()
        .flat_map(|(i, sets)| {
            sets.iter().map(move |k| {
                Row::new()
                    .with("ID", format!("f{i}-s{k}"))
                    .with("Form_ID", format!("f{i}"))
                    .with("Cognateset", format!("s{k}"))
            })
        })
        .collect();
    dataset
        .write([("CognatesetTable", sets), ("CognateTable", judgements)])
        .unwrap();
    dataset
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn export_then_import_is_identity(case in case_strategy()) {
        let dataset = dataset_for(&case);
        let (cognatesets, judgements, diagnostics) = round_trip(&dataset);

        prop_assert_eq!(diagnostics, 0);
        prop_assert_eq!(pairs(&judgements), pairs(dataset.rows("CognateTable").unwrap()));
        prop_assert_eq!(tags(&cognatesets), tags(dataset.rows("CognatesetTable").unwrap()));
        let ids: BTreeSet<_> = judgements.iter().filter_map(|j| j.text("ID")).collect();
        let original: BTreeSet<_> = dataset
            .rows("CognateTable")
            .unwrap()
            .iter()
            .filter_map(|j| j.text("ID"))
            .collect();
        prop_assert_eq!(ids, original);
    }
}
