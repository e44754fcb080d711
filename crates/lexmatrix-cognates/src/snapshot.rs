//! Read-only copy of the tables one run needs.
//!
//! The caller captures a snapshot, hands it to one importer, writer or
//! completion pass, and drops it afterwards. Nothing is cached between runs.

use crate::schema::ResolvedSchema;
use crate::CognateError;
use lexmatrix_dataset::{
    Dataset, Row, TableSchema, COGNATESET_TABLE, COGNATE_TABLE, FORM_TABLE, LANGUAGE_TABLE,
};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct Snapshot {
    names: ResolvedSchema,
    form_table: TableSchema,
    language_table: TableSchema,
    cognateset_table: TableSchema,
    forms: Vec<Row>,
    languages: Vec<Row>,
    cognatesets: Vec<Row>,
    judgements: Vec<Row>,
    form_index: HashMap<String, usize>,
}

impl Snapshot {
    /// Resolve the schema and copy the tables the cognate tooling reads.
    pub fn capture(dataset: &Dataset) -> Result<Self, CognateError> {
        let names = ResolvedSchema::resolve(dataset.schema())?;
        let table = |component: &'static str| {
            dataset
                .schema()
                .table(component)
                .cloned()
                .ok_or(crate::schema::SchemaError::MissingTable(component))
        };
        let form_table = table(FORM_TABLE)?;
        let language_table = table(LANGUAGE_TABLE)?;
        let cognateset_table = table(COGNATESET_TABLE)?;

        let forms = dataset.rows(FORM_TABLE)?.to_vec();
        let form_index = forms
            .iter()
            .enumerate()
            .filter_map(|(i, f)| f.text(&names.form.id).map(|id| (id.to_string(), i)))
            .collect();

        Ok(Self {
            form_table,
            language_table,
            cognateset_table,
            forms,
            languages: dataset.rows(LANGUAGE_TABLE)?.to_vec(),
            cognatesets: dataset.rows(COGNATESET_TABLE)?.to_vec(),
            judgements: dataset.rows(COGNATE_TABLE)?.to_vec(),
            form_index,
            names,
        })
    }

    pub fn names(&self) -> &ResolvedSchema {
        &self.names
    }

    pub fn cognateset_table(&self) -> &TableSchema {
        &self.cognateset_table
    }

    pub fn forms(&self) -> &[Row] {
        &self.forms
    }

    pub fn languages(&self) -> &[Row] {
        &self.languages
    }

    pub fn cognatesets(&self) -> &[Row] {
        &self.cognatesets
    }

    pub fn judgements(&self) -> &[Row] {
        &self.judgements
    }

    pub fn form(&self, id: &str) -> Option<&Row> {
        self.form_index.get(id).map(|&i| &self.forms[i])
    }

    pub fn form_id<'r>(&self, form: &'r Row) -> Option<&'r str> {
        form.text(&self.names.form.id)
    }

    pub fn form_language<'r>(&self, form: &'r Row) -> Option<&'r str> {
        form.text(&self.names.form.language)
    }

    /// Primary (first) concept of a form.
    pub fn form_concept<'r>(&self, form: &'r Row) -> Option<&'r str> {
        form.text(&self.names.form.concept)
    }

    pub fn language_id<'r>(&self, language: &'r Row) -> Option<&'r str> {
        language.text(&self.names.language.id)
    }

    /// Find a form whose value in one of `columns` equals `value`. Earlier
    /// columns take precedence.
    pub fn find_form(&self, value: &str, columns: &[String]) -> Option<&Row> {
        if columns.len() == 1 && columns[0] == self.names.form.id {
            return self.form(value);
        }
        find(&self.forms, value, columns)
    }

    /// Find a language whose value in one of `columns` equals `value`.
    /// Earlier columns take precedence.
    pub fn find_language(&self, value: &str, columns: &[String]) -> Option<&Row> {
        find(&self.languages, value, columns)
    }

    /// Map property terms or column names to Form table column names.
    pub fn form_columns(&self, keys: &[String]) -> Vec<String> {
        resolve_keys(&self.form_table, keys)
    }

    pub fn language_columns(&self, keys: &[String]) -> Vec<String> {
        resolve_keys(&self.language_table, keys)
    }

    pub fn cognateset_columns(&self, keys: &[String]) -> Vec<String> {
        resolve_keys(&self.cognateset_table, keys)
    }
}

fn find<'a>(rows: &'a [Row], value: &str, columns: &[String]) -> Option<&'a Row> {
    columns
        .iter()
        .find_map(|c| rows.iter().find(|row| row.text(c) == Some(value)))
}

fn resolve_keys(table: &TableSchema, keys: &[String]) -> Vec<String> {
    keys.iter()
        .filter_map(|key| match table.column(key) {
            Some(column) => Some(column.name.clone()),
            None => {
                tracing::warn!(table = %table.component, column = %key, "ignoring unknown match column");
                None
            }
        })
        .collect()
}
