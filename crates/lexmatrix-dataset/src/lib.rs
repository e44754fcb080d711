//! Relational wordlist storage for lexmatrix
//!
//! A dataset is a JSON metadata file declaring tables, columns and foreign
//! keys ([`DatasetSchema`]) next to one CSV file per table. Everything is held
//! in memory:
//! - [`Dataset::load`] reads metadata and every table,
//! - [`Dataset::write`] replaces whole tables (one bulk write per table),
//! - [`Dataset::persist`] puts the current state back on disk.
//!
//! Nothing here is transactional beyond "validate every table name before
//! replacing any of them".

pub mod schema;
pub mod value;

pub use schema::{
    ColumnSchema, DatasetSchema, ForeignKey, TableSchema, COGNATESET_TABLE, COGNATE_TABLE,
    FORM_TABLE, LANGUAGE_TABLE, PARAMETER_TABLE,
};
pub use value::{Row, Value};

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid metadata {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("dataset has no table `{0}`")]
    UnknownTable(String),
    #[error("dataset was not loaded from disk; use persist_to")]
    NoLocation,
}

/// In-memory snapshot of a dataset.
#[derive(Debug, Clone)]
pub struct Dataset {
    schema: DatasetSchema,
    /// Rows per table, keyed by table url.
    tables: BTreeMap<String, Vec<Row>>,
    metadata_path: Option<PathBuf>,
}

impl Dataset {
    /// Empty dataset for `schema`, not backed by any file.
    pub fn new(schema: DatasetSchema) -> Self {
        let tables = schema
            .tables
            .iter()
            .map(|t| (t.url.clone(), Vec::new()))
            .collect();
        Self {
            schema,
            tables,
            metadata_path: None,
        }
    }

    /// Load metadata and all tables. A declared table without a CSV file is empty.
    pub fn load(metadata_path: &Path) -> Result<Self, DatasetError> {
        let text = fs::read_to_string(metadata_path).map_err(|source| DatasetError::Io {
            path: metadata_path.to_path_buf(),
            source,
        })?;
        let schema: DatasetSchema =
            serde_json::from_str(&text).map_err(|source| DatasetError::Metadata {
                path: metadata_path.to_path_buf(),
                source,
            })?;

        let dir = metadata_path.parent().unwrap_or_else(|| Path::new("."));
        let mut tables = BTreeMap::new();
        for table in &schema.tables {
            let path = dir.join(&table.url);
            let rows = if path.exists() {
                read_table(&path, table)?
            } else {
                tracing::debug!(table = %table.component, path = %path.display(), "no table file, starting empty");
                Vec::new()
            };
            tables.insert(table.url.clone(), rows);
        }

        tracing::info!(
            metadata = %metadata_path.display(),
            tables = tables.len(),
            "loaded dataset"
        );

        Ok(Self {
            schema,
            tables,
            metadata_path: Some(metadata_path.to_path_buf()),
        })
    }

    pub fn schema(&self) -> &DatasetSchema {
        &self.schema
    }

    pub fn metadata_path(&self) -> Option<&Path> {
        self.metadata_path.as_deref()
    }

    /// Rows of a table addressed by component name or url.
    pub fn rows(&self, table: &str) -> Result<&[Row], DatasetError> {
        let url = self.url_of(table)?;
        Ok(self.tables.get(url).map(Vec::as_slice).unwrap_or(&[]))
    }

    /// Replace the rows of each given table.
    ///
    /// All table names are resolved before anything is replaced, so an unknown
    /// table leaves the dataset untouched.
    pub fn write<I, K>(&mut self, tables: I) -> Result<(), DatasetError>
    where
        I: IntoIterator<Item = (K, Vec<Row>)>,
        K: AsRef<str>,
    {
        let mut staged = Vec::new();
        for (key, rows) in tables {
            let url = self.url_of(key.as_ref())?.to_string();
            staged.push((url, rows));
        }
        for (url, rows) in staged {
            tracing::debug!(table = %url, rows = rows.len(), "replacing table");
            self.tables.insert(url, rows);
        }
        Ok(())
    }

    pub fn write_table(&mut self, table: &str, rows: Vec<Row>) -> Result<(), DatasetError> {
        self.write([(table, rows)])
    }

    /// Write metadata and all tables back to where the dataset was loaded from.
    pub fn persist(&self) -> Result<(), DatasetError> {
        let path = self.metadata_path.as_ref().ok_or(DatasetError::NoLocation)?;
        self.write_files(path)
    }

    /// Write metadata and tables to a new location and remember it.
    pub fn persist_to(&mut self, metadata_path: &Path) -> Result<(), DatasetError> {
        self.write_files(metadata_path)?;
        self.metadata_path = Some(metadata_path.to_path_buf());
        Ok(())
    }

    fn write_files(&self, metadata_path: &Path) -> Result<(), DatasetError> {
        let dir = metadata_path.parent().unwrap_or_else(|| Path::new("."));
        let io_err = |path: &Path| {
            let path = path.to_path_buf();
            move |source| DatasetError::Io { path, source }
        };
        fs::create_dir_all(dir).map_err(io_err(dir))?;

        let json = serde_json::to_string_pretty(&self.schema).map_err(|source| {
            DatasetError::Metadata {
                path: metadata_path.to_path_buf(),
                source,
            }
        })?;
        fs::write(metadata_path, json).map_err(io_err(metadata_path))?;

        for table in &self.schema.tables {
            let rows = self.tables.get(&table.url).map(Vec::as_slice).unwrap_or(&[]);
            write_table(&dir.join(&table.url), table, rows)?;
        }
        Ok(())
    }

    fn url_of(&self, key: &str) -> Result<&str, DatasetError> {
        self.schema
            .table(key)
            .map(|t| t.url.as_str())
            .ok_or_else(|| DatasetError::UnknownTable(key.to_string()))
    }
}

fn read_table(path: &Path, table: &TableSchema) -> Result<Vec<Row>, DatasetError> {
    let csv_err = |source| DatasetError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = csv::Reader::from_path(path).map_err(csv_err)?;
    let headers = reader.headers().map_err(csv_err)?.clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(csv_err)?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(column, field)| (column, Value::from_field(field, table.separator(column))))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

fn write_table(path: &Path, table: &TableSchema, rows: &[Row]) -> Result<(), DatasetError> {
    let csv_err = |source| DatasetError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer.write_record(table.column_names()).map_err(csv_err)?;

    let undeclared: BTreeSet<&String> = rows
        .iter()
        .flat_map(|row| row.iter().map(|(column, _)| column))
        .filter(|column| table.columns.iter().all(|c| &c.name != *column))
        .collect();
    for column in undeclared {
        tracing::warn!(table = %table.component, column = %column, "dropping undeclared column on write");
    }

    for row in rows {
        let record: Vec<String> = table
            .columns
            .iter()
            .map(|c| {
                row.get(&c.name)
                    .map(|v| v.to_field(c.separator.as_deref()))
                    .unwrap_or_default()
            })
            .collect();
        writer.write_record(&record).map_err(csv_err)?;
    }
    writer.flush().map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(())
}
