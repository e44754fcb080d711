//! Resolution of logical column roles to the names a dataset actually uses.
//!
//! Foreign keys are found by the table they point at; when a dataset declares
//! no foreign key, the column carrying the matching property term is used.

use lexmatrix_dataset::{
    DatasetSchema, TableSchema, COGNATESET_TABLE, COGNATE_TABLE, FORM_TABLE, LANGUAGE_TABLE,
    PARAMETER_TABLE,
};

/// Name of the column used to tag cognatesets with a curation status.
pub const STATUS_COLUMN: &str = "Status_Column";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("dataset has no {0}")]
    MissingTable(&'static str),
    #[error("{table} has no column for `{role}`")]
    MissingColumn {
        table: &'static str,
        role: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormColumns {
    pub id: String,
    pub language: String,
    pub concept: String,
    /// Transcription, used to recognize uncoded (`?`) forms.
    pub form: Option<String>,
    pub segments: Option<String>,
    /// Back-reference to a judgement, if the dataset models one.
    pub cognate: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageColumns {
    pub id: String,
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CognatesetColumns {
    pub id: String,
    pub name: Option<String>,
    pub comment: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CognateColumns {
    pub id: String,
    pub form: String,
    pub cognateset: String,
    pub segment_slice: Option<String>,
    pub alignment: Option<String>,
    pub comment: Option<String>,
}

/// Column names for every role the cognate tooling reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSchema {
    pub form: FormColumns,
    pub language: LanguageColumns,
    pub cognateset: CognatesetColumns,
    pub cognate: CognateColumns,
}

fn table<'s>(schema: &'s DatasetSchema, name: &'static str) -> Result<&'s TableSchema, SchemaError> {
    schema.table(name).ok_or(SchemaError::MissingTable(name))
}

fn optional(table: &TableSchema, key: &str) -> Option<String> {
    table.column(key).map(|c| c.name.clone())
}

fn required(
    table: &TableSchema,
    component: &'static str,
    role: &'static str,
) -> Result<String, SchemaError> {
    optional(table, role).ok_or(SchemaError::MissingColumn {
        table: component,
        role,
    })
}

/// Foreign key column of `from` pointing at `to`, falling back to `term`.
fn reference(
    from: &TableSchema,
    to: &TableSchema,
    component: &'static str,
    term: &'static str,
) -> Result<String, SchemaError> {
    from.foreign_key_to(&to.url)
        .map(|fk| fk.column.clone())
        .or_else(|| optional(from, term))
        .ok_or(SchemaError::MissingColumn {
            table: component,
            role: term,
        })
}

impl ResolvedSchema {
    pub fn resolve(schema: &DatasetSchema) -> Result<Self, SchemaError> {
        let forms = table(schema, FORM_TABLE)?;
        let languages = table(schema, LANGUAGE_TABLE)?;
        let concepts = table(schema, PARAMETER_TABLE)?;
        let cognatesets = table(schema, COGNATESET_TABLE)?;
        let cognates = table(schema, COGNATE_TABLE)?;

        let form = FormColumns {
            id: required(forms, FORM_TABLE, "id")?,
            language: reference(forms, languages, FORM_TABLE, "languageReference")?,
            concept: reference(forms, concepts, FORM_TABLE, "parameterReference")?,
            form: optional(forms, "form"),
            segments: optional(forms, "segments"),
            cognate: forms
                .foreign_key_to(&cognates.url)
                .map(|fk| fk.column.clone()),
        };

        let status = cognatesets
            .columns
            .iter()
            .find(|c| c.name == STATUS_COLUMN || c.property.as_deref() == Some("status"))
            .map(|c| c.name.clone());
        if status.is_none() {
            tracing::warn!(
                "no status column in {COGNATESET_TABLE}; synthesized cognatesets will not be status-tagged"
            );
        }

        Ok(Self {
            form,
            language: LanguageColumns {
                id: required(languages, LANGUAGE_TABLE, "id")?,
                name: optional(languages, "name"),
            },
            cognateset: CognatesetColumns {
                id: required(cognatesets, COGNATESET_TABLE, "id")?,
                name: optional(cognatesets, "name"),
                comment: optional(cognatesets, "comment"),
                status,
            },
            cognate: CognateColumns {
                id: required(cognates, COGNATE_TABLE, "id")?,
                form: reference(cognates, forms, COGNATE_TABLE, "formReference")?,
                cognateset: reference(cognates, cognatesets, COGNATE_TABLE, "cognatesetReference")?,
                segment_slice: optional(cognates, "segmentSlice"),
                alignment: optional(cognates, "alignment"),
                comment: optional(cognates, "comment"),
            },
        })
    }
}
