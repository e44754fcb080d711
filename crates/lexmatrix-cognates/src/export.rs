//! Cognateset and Cognate tables → cognate matrix.
//!
//! The grid has one row per cognateset and one column per language. The
//! left block carries the cognateset properties (the id under `CogSet`), the
//! top band carries the language properties named in
//! [`ExportOptions::language_header`]. A data cell lists every judgement of
//! that set in that language, one line and one hyperlink per judgement, and
//! reads back through [`crate::import`] without loss.

use crate::cell_parser::{parse_slice, render_with_braces, ENTRY_SEPARATOR};
use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::header::ID_LABEL;
use crate::snapshot::Snapshot;
use lexmatrix_dataset::{ColumnSchema, Row};
use lexmatrix_grid::{Cell, Grid};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};

/// Placeholder in [`ExportOptions::url_template`] replaced by the form id.
pub const URL_PLACEHOLDER: &str = "{}";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    /// As stored in the table.
    Table,
    /// Most judgements first; ties keep table order.
    #[default]
    SizeDescending,
    /// By the value of a column or property term.
    Alphabetical(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    pub row_order: Order,
    pub language_order: Order,
    /// Hyperlink target for a form; `{}` is replaced by the form id.
    pub url_template: String,
    /// Language columns (or property terms) shown as header rows, top down.
    pub language_header: Vec<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            row_order: Order::SizeDescending,
            language_order: Order::Table,
            url_template: format!("https://example.org/lexicon/{URL_PLACEHOLDER}"),
            language_header: vec!["name".to_string()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExportOutcome {
    pub grid: Grid,
    pub diagnostics: Diagnostics,
}

pub struct MatrixWriter<'s> {
    snapshot: &'s Snapshot,
    options: ExportOptions,
}

impl<'s> MatrixWriter<'s> {
    pub fn new(snapshot: &'s Snapshot, options: ExportOptions) -> Self {
        Self { snapshot, options }
    }

    pub fn write(&self) -> ExportOutcome {
        let snapshot = self.snapshot;
        let names = snapshot.names();
        let mut diagnostics = Diagnostics::new();

        // Id first, comment goes into the id cell's note.
        let mut header: Vec<&ColumnSchema> = snapshot
            .cognateset_table()
            .columns
            .iter()
            .filter(|c| names.cognateset.comment.as_deref() != Some(c.name.as_str()))
            .collect();
        header.sort_by_key(|c| c.name != names.cognateset.id);
        let header_cols = header.len();

        let mut language_header = snapshot.language_columns(&self.options.language_header);
        if language_header.is_empty() {
            language_header.push(names.language.id.clone());
        }
        let header_rows = language_header.len();

        let known_sets: HashSet<&str> = snapshot
            .cognatesets()
            .iter()
            .filter_map(|s| s.text(&names.cognateset.id))
            .collect();
        let mut cells: HashMap<(&str, &str), Vec<&Row>> = HashMap::new();
        let mut set_sizes: HashMap<&str, usize> = HashMap::new();
        let mut language_sizes: HashMap<&str, usize> = HashMap::new();
        for judgement in snapshot.judgements() {
            let id = judgement.text(&names.cognate.id).unwrap_or("<no id>");
            let form = judgement
                .text(&names.cognate.form)
                .and_then(|f| snapshot.form(f));
            let Some(form) = form else {
                diagnostics.report(
                    DiagnosticKind::ReferenceMismatch,
                    Some(id),
                    "judgement references an unknown form; left out",
                );
                continue;
            };
            let Some(set) = judgement
                .text(&names.cognate.cognateset)
                .filter(|s| known_sets.contains(s))
            else {
                diagnostics.report(
                    DiagnosticKind::ReferenceMismatch,
                    Some(id),
                    "judgement references an unknown cognateset; left out",
                );
                continue;
            };
            let Some(language) = snapshot.form_language(form) else {
                diagnostics.report(
                    DiagnosticKind::ReferenceMismatch,
                    Some(id),
                    "judged form has no language; left out",
                );
                continue;
            };
            cells.entry((set, language)).or_default().push(judgement);
            *set_sizes.entry(set).or_default() += 1;
            *language_sizes.entry(language).or_default() += 1;
        }

        let mut languages: Vec<&Row> = snapshot
            .languages()
            .iter()
            .filter(|l| snapshot.language_id(l).is_some())
            .collect();
        let language_property = match &self.options.language_order {
            Order::Alphabetical(key) => snapshot.language_columns(std::slice::from_ref(key)).pop(),
            _ => None,
        };
        sort_rows(
            &mut languages,
            &self.options.language_order,
            &names.language.id,
            language_property.as_deref(),
            &language_sizes,
        );

        let mut cognatesets: Vec<&Row> = snapshot
            .cognatesets()
            .iter()
            .filter(|s| s.text(&names.cognateset.id).is_some())
            .collect();
        let set_property = match &self.options.row_order {
            Order::Alphabetical(key) => snapshot.cognateset_columns(std::slice::from_ref(key)).pop(),
            _ => None,
        };
        sort_rows(
            &mut cognatesets,
            &self.options.row_order,
            &names.cognateset.id,
            set_property.as_deref(),
            &set_sizes,
        );

        let mut grid = Grid::new().with_title("Cognates");
        for (k, column) in header.iter().enumerate() {
            let label = if column.name == names.cognateset.id {
                ID_LABEL
            } else {
                column.name.as_str()
            };
            grid.set(0, k, Cell::text(label));
        }
        // The first header row identifies the column on import: a value that
        // is missing or shared with another language is replaced by the id.
        let mut uses: HashMap<&str, usize> = HashMap::new();
        for language in snapshot.languages() {
            let id = snapshot.language_id(language);
            let label = language.text(&language_header[0]).filter(|l| Some(*l) != id);
            for key in id.into_iter().chain(label) {
                *uses.entry(key).or_default() += 1;
            }
        }
        for (j, language) in languages.iter().enumerate() {
            let id = snapshot.language_id(language).unwrap_or_default();
            for (r, column) in language_header.iter().enumerate() {
                let label = match language.text(column).filter(|l| !l.is_empty()) {
                    Some(label) if r > 0 || uses.get(label) == Some(&1) || label == id => label,
                    _ => id,
                };
                grid.set(r, header_cols + j, Cell::text(label));
            }
        }

        for (i, cognateset) in cognatesets.iter().enumerate() {
            let r = header_rows + i;
            let set_id = cognateset.text(&names.cognateset.id).unwrap_or_default();
            for (k, column) in header.iter().enumerate() {
                let text = cognateset
                    .get(&column.name)
                    .map(|v| v.to_field(column.separator.as_deref()))
                    .unwrap_or_default();
                let mut cell = Cell::text(escape_text(text));
                if k == 0 {
                    if let Some(comment) = names
                        .cognateset
                        .comment
                        .as_deref()
                        .and_then(|c| cognateset.text(c))
                    {
                        cell = cell.with_comment(comment);
                    }
                }
                grid.set(r, k, cell);
            }
            for (j, language) in languages.iter().enumerate() {
                let language_id = snapshot.language_id(language).unwrap_or_default();
                if let Some(judgements) = cells.get(&(set_id, language_id)) {
                    grid.set(r, header_cols + j, self.judgement_cell(judgements));
                } else {
                    grid.set(r, header_cols + j, Cell::empty());
                }
            }
        }

        tracing::info!(
            cognatesets = cognatesets.len(),
            languages = languages.len(),
            diagnostics = diagnostics.len(),
            "cognate matrix written"
        );
        ExportOutcome { grid, diagnostics }
    }

    fn judgement_cell(&self, judgements: &[&Row]) -> Cell {
        let names = self.snapshot.names();
        let mut texts = Vec::with_capacity(judgements.len());
        let mut links = Vec::with_capacity(judgements.len());
        let mut comments = Vec::new();
        for judgement in judgements {
            let form_id = judgement.text(&names.cognate.form).unwrap_or_default();
            texts.push(match self.snapshot.form(form_id) {
                Some(form) => self.render(form, judgement),
                None => form_id.to_string(),
            });
            links.push(self.options.url_template.replace(URL_PLACEHOLDER, form_id));
            if let Some(comment) = names
                .cognate
                .comment
                .as_deref()
                .and_then(|c| judgement.text(c))
            {
                comments.push(comment);
            }
        }
        let mut cell = Cell::text(texts.join(ENTRY_SEPARATOR)).with_comment(comments.join("\t"));
        cell.links = links;
        cell
    }

    /// One line of a data cell: the aligned part in braces when there is an
    /// alignment, the transcription otherwise. Unaligned text never carries
    /// braces, which would read back as an alignment.
    fn render(&self, form: &Row, judgement: &Row) -> String {
        let names = self.snapshot.names();
        let segments = names
            .form
            .segments
            .as_deref()
            .map(|c| form.list(c))
            .unwrap_or_default();
        let slice = names
            .cognate
            .segment_slice
            .as_deref()
            .and_then(|c| parse_slice(&judgement.list(c)));
        let alignment = names
            .cognate
            .alignment
            .as_deref()
            .map(|c| judgement.list(c))
            .filter(|a| !a.is_empty());
        if let Some(text) = render_with_braces(&segments, slice, alignment.as_deref()) {
            return text;
        }
        let transcription = names
            .form
            .form
            .as_deref()
            .and_then(|c| form.text(c))
            .filter(|t| !t.trim().is_empty());
        let text = match transcription {
            Some(text) => text.trim().to_string(),
            None if !segments.is_empty() => segments.join(" "),
            None => self.snapshot.form_id(form).unwrap_or_default().to_string(),
        };
        text.replace(['{', '}'], "")
    }
}

/// Keep a leading `'` through the text-forcing prefix that readers strip.
fn escape_text(text: String) -> String {
    if text.starts_with('\'') {
        format!("'{text}")
    } else {
        text
    }
}

fn sort_rows(
    rows: &mut [&Row],
    order: &Order,
    id_column: &str,
    property: Option<&str>,
    sizes: &HashMap<&str, usize>,
) {
    match order {
        Order::Table => {}
        Order::SizeDescending => rows.sort_by_key(|row| {
            let id = row.text(id_column).unwrap_or_default();
            Reverse(sizes.get(id).copied().unwrap_or(0))
        }),
        Order::Alphabetical(key) => match property {
            Some(column) => rows.sort_by(|a, b| {
                let a = a.get(column).map(|v| v.to_field(Some(" "))).unwrap_or_default();
                let b = b.get(column).map(|v| v.to_field(Some(" "))).unwrap_or_default();
                a.cmp(&b)
            }),
            None => tracing::warn!(column = %key, "unknown sort column; keeping table order"),
        },
    }
}
