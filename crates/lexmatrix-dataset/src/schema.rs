//! Table/column/foreign-key declarations of a wordlist dataset.
//!
//! Columns are addressed either by their literal name (`Form_ID`) or by the
//! property term they carry (`formReference`), so callers never have to know
//! how a particular dataset spells its headers.

use serde::{Deserialize, Serialize};

pub const FORM_TABLE: &str = "FormTable";
pub const LANGUAGE_TABLE: &str = "LanguageTable";
pub const PARAMETER_TABLE: &str = "ParameterTable";
pub const COGNATE_TABLE: &str = "CognateTable";
pub const COGNATESET_TABLE: &str = "CognatesetTable";

/// Declared schema of a dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetSchema {
    pub tables: Vec<TableSchema>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Component name, e.g. `FormTable`.
    pub component: String,
    /// File name of the table, relative to the metadata file.
    pub url: String,
    pub columns: Vec<ColumnSchema>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    /// Multi-valued columns join their values with this separator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub separator: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub column: String,
    /// Url of the referenced table.
    pub reference: String,
    #[serde(default = "default_reference_column")]
    pub reference_column: String,
}

fn default_reference_column() -> String {
    "ID".to_string()
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            property: None,
            separator: None,
        }
    }

    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }
}

impl TableSchema {
    pub fn new(component: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            url: url.into(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: ColumnSchema) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_foreign_key(mut self, column: &str, reference: &str) -> Self {
        self.foreign_keys.push(ForeignKey {
            column: column.to_string(),
            reference: reference.to_string(),
            reference_column: default_reference_column(),
        });
        self
    }

    /// Look a column up by property term first, then by literal name.
    pub fn column(&self, key: &str) -> Option<&ColumnSchema> {
        self.columns
            .iter()
            .find(|c| c.property.as_deref() == Some(key))
            .or_else(|| self.columns.iter().find(|c| c.name == key))
    }

    /// First foreign key of this table pointing at the table with `url`.
    pub fn foreign_key_to(&self, url: &str) -> Option<&ForeignKey> {
        self.foreign_keys.iter().find(|fk| fk.reference == url)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn separator(&self, column_name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.name == column_name)
            .and_then(|c| c.separator.as_deref())
    }
}

impl DatasetSchema {
    /// Find a table by component name or by url.
    pub fn table(&self, key: &str) -> Option<&TableSchema> {
        self.tables
            .iter()
            .find(|t| t.component == key)
            .or_else(|| self.tables.iter().find(|t| t.url == key))
    }

    pub fn table_mut(&mut self, key: &str) -> Option<&mut TableSchema> {
        let idx = self
            .tables
            .iter()
            .position(|t| t.component == key)
            .or_else(|| self.tables.iter().position(|t| t.url == key))?;
        self.tables.get_mut(idx)
    }

    pub fn column(&self, table: &str, key: &str) -> Option<&ColumnSchema> {
        self.table(table)?.column(key)
    }

    /// Foreign key column of `from` referencing `to`, both given as component names.
    pub fn foreign_key(&self, from: &str, to: &str) -> Option<&ForeignKey> {
        let target = self.table(to)?;
        self.table(from)?.foreign_key_to(&target.url)
    }

    /// Minimal wordlist schema with the five tables the cognate tooling uses.
    pub fn wordlist() -> Self {
        let languages = TableSchema::new(LANGUAGE_TABLE, "languages.csv")
            .with_column(ColumnSchema::new("ID").with_property("id"))
            .with_column(ColumnSchema::new("Name").with_property("name"));
        let parameters = TableSchema::new(PARAMETER_TABLE, "concepts.csv")
            .with_column(ColumnSchema::new("ID").with_property("id"))
            .with_column(ColumnSchema::new("Name").with_property("name"));
        let forms = TableSchema::new(FORM_TABLE, "forms.csv")
            .with_column(ColumnSchema::new("ID").with_property("id"))
            .with_column(ColumnSchema::new("Language_ID").with_property("languageReference"))
            .with_column(ColumnSchema::new("Concept_ID").with_property("parameterReference"))
            .with_column(ColumnSchema::new("Form").with_property("form"))
            .with_column(
                ColumnSchema::new("Segments")
                    .with_property("segments")
                    .with_separator(" "),
            )
            .with_column(ColumnSchema::new("Value").with_property("value"))
            .with_column(ColumnSchema::new("Comment").with_property("comment"))
            .with_foreign_key("Language_ID", "languages.csv")
            .with_foreign_key("Concept_ID", "concepts.csv");
        let cognatesets = TableSchema::new(COGNATESET_TABLE, "cognatesets.csv")
            .with_column(ColumnSchema::new("ID").with_property("id"))
            .with_column(ColumnSchema::new("Name").with_property("name"))
            .with_column(ColumnSchema::new("Comment").with_property("comment"));
        let cognates = TableSchema::new(COGNATE_TABLE, "cognates.csv")
            .with_column(ColumnSchema::new("ID").with_property("id"))
            .with_column(ColumnSchema::new("Form_ID").with_property("formReference"))
            .with_column(ColumnSchema::new("Cognateset").with_property("cognatesetReference"))
            .with_column(
                ColumnSchema::new("Segment_Slice")
                    .with_property("segmentSlice")
                    .with_separator(","),
            )
            .with_column(
                ColumnSchema::new("Alignment")
                    .with_property("alignment")
                    .with_separator(" "),
            )
            .with_column(ColumnSchema::new("Comment").with_property("comment"))
            .with_foreign_key("Form_ID", "forms.csv")
            .with_foreign_key("Cognateset", "cognatesets.csv");

        Self {
            tables: vec![languages, parameters, forms, cognatesets, cognates],
        }
    }
}
