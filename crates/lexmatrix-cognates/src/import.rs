//! Cognate matrix → Cognateset and Cognate tables.
//!
//! The sheet is the authoritative state of the cognate coding: an import
//! produces complete replacement tables, not a patch. Every problem with an
//! individual cell, column or row is recorded in [`Diagnostics`] and the
//! offending piece skipped; the run itself only fails on schema errors.

use crate::cell_parser::{self, CellEntry, CellParser, CellSyntax, DEFAULT_FORM_ID_PATTERN};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::header::{cognateset_header, HeaderColumn};
use crate::schema::ResolvedSchema;
use crate::snapshot::Snapshot;
use crate::{string_to_id, CognateError};
use lexmatrix_dataset::{
    Dataset, DatasetError, Row, Value, COGNATESET_TABLE, COGNATE_TABLE, FORM_TABLE,
};
use lexmatrix_grid::{coordinate, Grid, RowView, SheetView};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportOptions {
    /// Rows above the data that describe languages.
    pub header_rows: usize,
    pub syntax: CellSyntax,
    /// Extracts the form id from a hyperlink target; needs a group `ID`.
    pub formid_regex: String,
    /// Separator for [`CellSyntax::MultiValue`] cells.
    pub multi_value_separator: String,
    /// Language columns (or property terms) compared with the header label,
    /// in order of preference. Empty: the label is the language id.
    pub check_for_language_match: Vec<String>,
    /// Form columns compared with ids read from cells.
    pub check_for_match: Vec<String>,
    /// Cognateset columns that identify the same set across rows.
    pub check_for_row_match: Vec<String>,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            header_rows: 1,
            syntax: CellSyntax::default(),
            formid_regex: DEFAULT_FORM_ID_PATTERN.to_string(),
            multi_value_separator: ";".to_string(),
            check_for_language_match: vec!["id".to_string(), "name".to_string()],
            check_for_match: vec!["id".to_string()],
            check_for_row_match: vec!["id".to_string()],
        }
    }
}

/// Id of the judgement linking `form_id` to `cognateset_id`.
pub fn judgement_id(form_id: &str, cognateset_id: &str) -> String {
    format!("{form_id}-{cognateset_id}")
}

/// Result of one import, not yet written anywhere.
#[derive(Debug, Clone, Default)]
pub struct ImportOutcome {
    pub cognatesets: Vec<Row>,
    pub judgements: Vec<Row>,
    /// Forms with their judgement back-reference refreshed, when the dataset
    /// models one.
    pub forms: Option<Vec<Row>>,
    pub diagnostics: Diagnostics,
}

impl ImportOutcome {
    /// Replace the tables in `dataset` in one bulk write.
    pub fn apply(self, dataset: &mut Dataset) -> Result<Diagnostics, DatasetError> {
        let ImportOutcome {
            cognatesets,
            judgements,
            forms,
            diagnostics,
        } = self;
        tracing::info!(
            cognatesets = cognatesets.len(),
            judgements = judgements.len(),
            "writing imported cognate tables"
        );
        let mut tables = vec![(COGNATESET_TABLE, cognatesets), (COGNATE_TABLE, judgements)];
        if let Some(forms) = forms {
            tables.push((FORM_TABLE, forms));
        }
        dataset.write(tables)?;
        Ok(diagnostics)
    }
}

/// Tables being assembled during one import.
#[derive(Default)]
struct Assembly {
    cognatesets: Vec<Row>,
    by_key: HashMap<Vec<String>, usize>,
    by_id: HashMap<String, usize>,
    judgements: Vec<Row>,
    judgement_ids: HashSet<String>,
}

impl Assembly {
    /// `base`, or `base` with a numeric suffix when a set with a different
    /// name already holds it.
    fn unused_id(&self, base: &str, name_column: &str, name: &str) -> String {
        let mut id = base.to_string();
        let mut n = 1;
        while let Some(&existing) = self.by_id.get(&id) {
            if self.cognatesets[existing].text(name_column) == Some(name) {
                break;
            }
            n += 1;
            id = format!("{base}_{n}");
        }
        id
    }

    fn add_judgement(
        &mut self,
        names: &ResolvedSchema,
        form_id: &str,
        cognateset_id: &str,
        entry: CellEntry,
        location: &str,
        diagnostics: &mut Diagnostics,
    ) {
        let id = judgement_id(form_id, cognateset_id);
        if !self.judgement_ids.insert(id.clone()) {
            diagnostics.report(
                DiagnosticKind::ParseAmbiguity,
                Some(location),
                format!("form `{form_id}` listed twice for cognateset `{cognateset_id}`; keeping the first"),
            );
            return;
        }
        let c = &names.cognate;
        let mut row = Row::new()
            .with(c.id.clone(), id)
            .with(c.form.clone(), form_id)
            .with(c.cognateset.clone(), cognateset_id);
        if let Some(column) = &c.segment_slice {
            row.set(column.clone(), entry.segment_slice.map(Value::List).unwrap_or_default());
        }
        if let Some(column) = &c.alignment {
            row.set(column.clone(), entry.alignment.map(Value::List).unwrap_or_default());
        }
        if let Some(column) = &c.comment {
            row.set(column.clone(), entry.comment);
        }
        self.judgements.push(row);
    }
}

/// Reads a cognate matrix against a dataset snapshot.
pub struct MatrixImporter<'s> {
    snapshot: &'s Snapshot,
    options: ImportOptions,
    parser: Box<dyn CellParser>,
}

impl<'s> MatrixImporter<'s> {
    pub fn new(snapshot: &'s Snapshot, options: ImportOptions) -> Result<Self, CognateError> {
        let parser = cell_parser::build(
            options.syntax,
            &options.formid_regex,
            &options.multi_value_separator,
        )?;
        Ok(Self::with_parser(snapshot, options, parser))
    }

    /// Use a custom cell syntax instead of the one named in `options`.
    pub fn with_parser(
        snapshot: &'s Snapshot,
        options: ImportOptions,
        parser: Box<dyn CellParser>,
    ) -> Self {
        Self {
            snapshot,
            options,
            parser,
        }
    }

    pub fn import(&self, grid: &Grid) -> Result<ImportOutcome, CognateError> {
        let names = self.snapshot.names();
        let mut diagnostics = Diagnostics::new();
        tracing::info!(
            sheet = grid.title.as_deref().unwrap_or("<untitled>"),
            rows = grid.height(),
            columns = grid.width(),
            "importing cognate matrix"
        );

        let header = cognateset_header(
            grid,
            self.snapshot.cognateset_table(),
            &names.cognateset,
            &mut diagnostics,
        );
        if !header.iter().any(|h| h.name == names.cognateset.id) {
            return Err(CognateError::NoCognatesetHeader);
        }
        let view = grid.view(self.options.header_rows.max(1), header.len())?;
        let languages = self.resolve_languages(&view, &mut diagnostics);

        let mut row_keys = self
            .snapshot
            .cognateset_columns(&self.options.check_for_row_match);
        if row_keys.is_empty() {
            row_keys.push(names.cognateset.id.clone());
        }
        let form_keys = self.snapshot.form_columns(&self.options.check_for_match);

        let mut state = Assembly::default();
        let mut current: Option<usize> = None;
        for row in view.rows() {
            if row.header_is_blank() {
                if row.data.iter().all(|c| c.is_blank()) {
                    continue;
                }
                if current.is_none() {
                    diagnostics.report(
                        DiagnosticKind::ParseAmbiguity,
                        Some(&format!("row {}", row.index + 1)),
                        "judgements without a cognateset row above them; skipped",
                    );
                    continue;
                }
            } else {
                current = self.cognateset_from_row(&row, &header, &row_keys, &mut state, &mut diagnostics);
            }
            let Some(set) = current else {
                continue;
            };
            let cognateset_id = state.cognatesets[set]
                .text(&names.cognateset.id)
                .unwrap_or_default()
                .to_string();

            for (col, language_id) in &languages {
                let cell = row.cell_at(*col, view.header_cols());
                if cell.is_blank() {
                    continue;
                }
                let location = coordinate(row.index, *col);
                for entry in self.parser.parse(cell, &location, &mut diagnostics) {
                    if let Some(form_id) =
                        self.check_form(&entry, language_id, &form_keys, &location, &mut diagnostics)
                    {
                        state.add_judgement(
                            names,
                            &form_id,
                            &cognateset_id,
                            entry,
                            &location,
                            &mut diagnostics,
                        );
                    }
                }
            }
        }

        let forms = names
            .form
            .cognate
            .as_deref()
            .map(|column| self.back_references(column, &state.judgements));
        tracing::info!(
            cognatesets = state.cognatesets.len(),
            judgements = state.judgements.len(),
            diagnostics = diagnostics.len(),
            "cognate matrix read"
        );
        Ok(ImportOutcome {
            cognatesets: state.cognatesets,
            judgements: state.judgements,
            forms,
            diagnostics,
        })
    }

    /// Language id for every data column that names a known language.
    fn resolve_languages(&self, view: &SheetView<'_>, diagnostics: &mut Diagnostics) -> Vec<(usize, String)> {
        let match_columns = self
            .snapshot
            .language_columns(&self.options.check_for_language_match);
        let mut languages = Vec::new();
        for column in view.columns() {
            let label = column
                .header
                .first()
                .map(|c| c.clean_value())
                .unwrap_or_default();
            if label.is_empty() {
                continue;
            }
            if match_columns.is_empty() {
                languages.push((column.index, label));
                continue;
            }
            match self
                .snapshot
                .find_language(&label, &match_columns)
                .and_then(|l| self.snapshot.language_id(l))
            {
                Some(id) => languages.push((column.index, id.to_string())),
                None => diagnostics.report(
                    DiagnosticKind::ReferenceMismatch,
                    Some(&coordinate(0, column.index)),
                    format!("language `{label}` is not in the dataset; column skipped"),
                ),
            }
        }
        languages
    }

    /// Build the cognateset of a row and register it, or find the set it
    /// repeats. Returns its index in the assembly.
    fn cognateset_from_row(
        &self,
        row: &RowView<'_>,
        header: &[HeaderColumn],
        row_keys: &[String],
        state: &mut Assembly,
        diagnostics: &mut Diagnostics,
    ) -> Option<usize> {
        let names = &self.snapshot.names().cognateset;
        let location = format!("row {}", row.index + 1);

        let mut cognateset = Row::new();
        for (column, cell) in header.iter().zip(row.header) {
            let text = cell.clean_value();
            let value = match &column.separator {
                Some(sep) => Value::from_field(&text, Some(sep)),
                None => Value::non_empty(&text),
            };
            cognateset.set(column.name.clone(), value);
        }

        // Notes on the row's header cells win over a comment column.
        let notes: Vec<&str> = row.header.iter().filter_map(|c| c.annotation()).collect();
        match &names.comment {
            Some(column) if !notes.is_empty() => cognateset.set(column.clone(), notes.join("\t")),
            Some(column) if !cognateset.contains(column) => cognateset.set(column.clone(), Value::Null),
            Some(_) => {}
            None if !notes.is_empty() => diagnostics.report(
                DiagnosticKind::ParseAmbiguity,
                Some(&location),
                "cognateset table has no comment column; cell notes dropped",
            ),
            None => {}
        }

        let id = match cognateset.text(&names.id) {
            Some(id) => id.to_string(),
            None => {
                let named = names
                    .name
                    .as_deref()
                    .and_then(|column| Some((column, cognateset.text(column)?)))
                    .map(|(column, name)| (column, name, string_to_id(name)))
                    .filter(|(_, _, id)| !id.is_empty());
                let Some((column, name, derived)) = named else {
                    diagnostics.report(
                        DiagnosticKind::ReferenceMismatch,
                        Some(&location),
                        "row has neither cognateset id nor name; skipped",
                    );
                    return None;
                };
                let id = state.unused_id(&derived, column, name);
                if id != derived {
                    diagnostics.report(
                        DiagnosticKind::ParseAmbiguity,
                        Some(&location),
                        format!("name `{name}` gives id `{derived}`, already used by another cognateset; using `{id}`"),
                    );
                }
                cognateset.set(names.id.clone(), id.clone());
                id
            }
        };
        if let Some(name) = &names.name {
            if cognateset.text(name).is_none() {
                cognateset.set(name.clone(), id.clone());
            }
        }

        let key: Vec<String> = row_keys
            .iter()
            .map(|k| cognateset.text(k).unwrap_or_default().to_string())
            .collect();
        if let Some(&existing) = state.by_key.get(&key).or_else(|| state.by_id.get(&id)) {
            if state.cognatesets[existing] != cognateset {
                diagnostics.report(
                    DiagnosticKind::ReferenceMismatch,
                    Some(&location),
                    format!("cognateset `{id}` repeats with different properties; keeping the first"),
                );
            }
            return Some(existing);
        }

        let index = state.cognatesets.len();
        state.by_key.insert(key, index);
        state.by_id.insert(id, index);
        state.cognatesets.push(cognateset);
        Some(index)
    }

    /// Check that a parsed form exists and belongs to the column's language.
    fn check_form(
        &self,
        entry: &CellEntry,
        language_id: &str,
        form_keys: &[String],
        location: &str,
        diagnostics: &mut Diagnostics,
    ) -> Option<String> {
        if form_keys.is_empty() {
            return Some(entry.form_id.clone());
        }
        let Some(form) = self.snapshot.find_form(&entry.form_id, form_keys) else {
            diagnostics.report(
                DiagnosticKind::ReferenceMismatch,
                Some(location),
                format!("no form `{}` in the dataset; skipped", entry.form_id),
            );
            return None;
        };
        let form_language = self.snapshot.form_language(form);
        if form_language != Some(language_id) {
            diagnostics.report(
                DiagnosticKind::ReferenceMismatch,
                Some(location),
                format!(
                    "form `{}` belongs to `{}`, not `{language_id}`; skipped",
                    entry.form_id,
                    form_language.unwrap_or("?"),
                ),
            );
            return None;
        }
        self.snapshot.form_id(form).map(str::to_string)
    }

    /// Forms with `column` pointing at their first judgement, or empty.
    fn back_references(&self, column: &str, judgements: &[Row]) -> Vec<Row> {
        let c = &self.snapshot.names().cognate;
        let mut first: HashMap<&str, &str> = HashMap::new();
        for judgement in judgements {
            if let (Some(form), Some(id)) = (judgement.text(&c.form), judgement.text(&c.id)) {
                first.entry(form).or_insert(id);
            }
        }
        self.snapshot
            .forms()
            .iter()
            .map(|form| {
                let value = self
                    .snapshot
                    .form_id(form)
                    .and_then(|id| first.get(id))
                    .map(|id| Value::text(*id))
                    .unwrap_or_default();
                let mut form = form.clone();
                form.set(column, value);
                form
            })
            .collect()
    }
}
