//! Give every form that is in no cognateset a cognateset of its own.
//!
//! Forms are visited in table order. Each form without a judgement takes the
//! next running number `n`, and a coded one gets the set `X{n}_{language}`,
//! named after its primary concept id, with one judgement carrying the same
//! id. Uncoded forms (`?` or empty) still consume their number, so ids stay
//! stable when such a form is coded later.

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::na;
use crate::snapshot::Snapshot;
use lexmatrix_dataset::{Dataset, DatasetError, Row, Value, COGNATESET_TABLE, COGNATE_TABLE, FORM_TABLE};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SingletonOptions {
    /// Status given to synthesized cognatesets, when the dataset has a
    /// status column.
    pub status: String,
}

impl Default for SingletonOptions {
    fn default() -> Self {
        Self {
            status: "automatic singleton".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SingletonOutcome {
    /// Existing cognatesets followed by the new ones.
    pub cognatesets: Vec<Row>,
    /// Existing judgements followed by the new ones.
    pub judgements: Vec<Row>,
    /// Forms with back-references to their new judgement, when modelled.
    pub forms: Option<Vec<Row>>,
    pub added: usize,
    pub diagnostics: Diagnostics,
}

impl SingletonOutcome {
    pub fn apply(self, dataset: &mut Dataset) -> Result<Diagnostics, DatasetError> {
        let SingletonOutcome {
            cognatesets,
            judgements,
            forms,
            added,
            diagnostics,
        } = self;
        tracing::info!(added, "writing singleton cognatesets");
        let mut tables = vec![(COGNATESET_TABLE, cognatesets), (COGNATE_TABLE, judgements)];
        if let Some(forms) = forms {
            tables.push((FORM_TABLE, forms));
        }
        dataset.write(tables)?;
        Ok(diagnostics)
    }
}

pub fn add_singleton_cognatesets(snapshot: &Snapshot, options: &SingletonOptions) -> SingletonOutcome {
    let names = snapshot.names();
    let mut diagnostics = Diagnostics::new();
    if names.cognateset.status.is_none() {
        diagnostics.report(
            DiagnosticKind::MissingStatusColumn,
            None,
            "singleton cognatesets are added without a status",
        );
    }

    let covered: HashSet<&str> = snapshot
        .judgements()
        .iter()
        .filter_map(|j| j.text(&names.cognate.form))
        .collect();
    // Judgements reuse the cognateset id, so both id spaces are taken.
    let mut taken: HashSet<String> = snapshot
        .cognatesets()
        .iter()
        .filter_map(|s| s.text(&names.cognateset.id))
        .chain(
            snapshot
                .judgements()
                .iter()
                .filter_map(|j| j.text(&names.cognate.id)),
        )
        .map(str::to_string)
        .collect();

    let mut cognatesets = snapshot.cognatesets().to_vec();
    let mut judgements = snapshot.judgements().to_vec();
    let mut back_references: HashMap<String, String> = HashMap::new();
    let mut n = 0;

    for form in snapshot.forms() {
        let Some(form_id) = snapshot.form_id(form) else {
            continue;
        };
        if covered.contains(form_id) {
            continue;
        }
        n += 1;
        let uncoded = names
            .form
            .form
            .as_deref()
            .is_some_and(|c| na::is_uncoded(form.text(c)));
        if uncoded {
            tracing::debug!(form = %form_id, "uncoded form gets no singleton");
            continue;
        }
        let language = snapshot.form_language(form).unwrap_or_default();
        let mut cognateset_id = format!("X{n}_{language}");
        while taken.contains(&cognateset_id) {
            n += 1;
            cognateset_id = format!("X{n}_{language}");
        }
        taken.insert(cognateset_id.clone());

        let mut cognateset = Row::new().with(names.cognateset.id.clone(), cognateset_id.as_str());
        if let Some(column) = &names.cognateset.name {
            let concept = snapshot.form_concept(form).unwrap_or_default();
            cognateset.set(column.clone(), Value::non_empty(concept));
        }
        if let Some(column) = &names.cognateset.status {
            cognateset.set(column.clone(), options.status.as_str());
        }
        cognatesets.push(cognateset);

        let c = &names.cognate;
        let mut judgement = Row::new()
            .with(c.id.clone(), cognateset_id.as_str())
            .with(c.form.clone(), form_id)
            .with(c.cognateset.clone(), cognateset_id.as_str());
        let segments = names
            .form
            .segments
            .as_deref()
            .map(|s| form.list(s))
            .unwrap_or_default();
        if let (Some(slice), Some(alignment)) = (&c.segment_slice, &c.alignment) {
            if segments.is_empty() {
                judgement.set(slice.clone(), Value::List(Vec::new()));
                judgement.set(alignment.clone(), Value::List(Vec::new()));
            } else {
                judgement.set(slice.clone(), Value::list([format!("1:{}", segments.len())]));
                judgement.set(alignment.clone(), Value::List(segments));
            }
        }
        judgements.push(judgement);
        back_references.insert(form_id.to_string(), cognateset_id);
    }

    let added = back_references.len();
    tracing::info!(added, "singleton cognatesets synthesized");

    let forms = names.form.cognate.as_deref().map(|column| {
        snapshot
            .forms()
            .iter()
            .map(|form| {
                let mut form = form.clone();
                let id = snapshot.form_id(&form).and_then(|id| back_references.get(id)).cloned();
                if let Some(id) = id {
                    form.set(column, id);
                }
                form
            })
            .collect()
    });

    SingletonOutcome {
        cognatesets,
        judgements,
        forms,
        added,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::STATUS_COLUMN;
    use lexmatrix_dataset::{ColumnSchema, DatasetSchema};

    fn dataset(schema: DatasetSchema) -> Dataset {
        let mut dataset = Dataset::new(schema);
        dataset
            .write([
                (
                    "FormTable",
                    vec![
                        Row::new()
                            .with("ID", "f1")
                            .with("Language_ID", "l1")
                            .with("Concept_ID", "hand")
                            .with("Form", "mano")
                            .with("Segments", Value::list(["m", "a", "n", "o"])),
                        Row::new()
                            .with("ID", "f2")
                            .with("Language_ID", "l1")
                            .with("Concept_ID", "foot")
                            .with("Form", "?"),
                    ],
                ),
                (
                    "ParameterTable",
                    vec![Row::new().with("ID", "hand").with("Name", "Hand")],
                ),
            ])
            .unwrap();
        dataset
    }

    #[test]
    fn singleton_covers_whole_form_and_is_tagged() {
        let mut schema = DatasetSchema::wordlist();
        schema
            .table_mut(COGNATESET_TABLE)
            .unwrap()
            .columns
            .push(ColumnSchema::new(STATUS_COLUMN));
        let snapshot = Snapshot::capture(&dataset(schema)).unwrap();
        let outcome = add_singleton_cognatesets(&snapshot, &SingletonOptions::default());

        assert_eq!(outcome.added, 1);
        assert!(outcome.diagnostics.is_empty());
        let set = &outcome.cognatesets[0];
        assert_eq!(set.text("ID"), Some("X1_l1"));
        assert_eq!(set.text("Name"), Some("hand"));
        assert_eq!(set.text(STATUS_COLUMN), Some("automatic singleton"));
        let judgement = &outcome.judgements[0];
        assert_eq!(judgement.text("ID"), Some("X1_l1"));
        assert_eq!(judgement.list("Segment_Slice"), vec!["1:4".to_string()]);
        assert_eq!(judgement.list("Alignment").len(), 4);
    }

    #[test]
    fn missing_status_column_is_reported() {
        let snapshot = Snapshot::capture(&dataset(DatasetSchema::wordlist())).unwrap();
        let outcome = add_singleton_cognatesets(&snapshot, &SingletonOptions::default());
        assert_eq!(outcome.diagnostics.count(DiagnosticKind::MissingStatusColumn), 1);
        assert_eq!(outcome.added, 1);
    }

    #[test]
    fn taken_ids_are_skipped() {
        let mut dataset = dataset(DatasetSchema::wordlist());
        dataset
            .write_table("CognatesetTable", vec![Row::new().with("ID", "X1_l1")])
            .unwrap();
        let snapshot = Snapshot::capture(&dataset).unwrap();
        let outcome = add_singleton_cognatesets(&snapshot, &SingletonOptions::default());
        assert_eq!(outcome.cognatesets[1].text("ID"), Some("X2_l1"));
    }
}
