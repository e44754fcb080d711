//! Cognate matrix ⇄ relational tables
//!
//! ```text
//! ┌──────────────┐   import    ┌──────────────┐   singletons   ┌──────────────┐
//! │  sheet grid  │────────────►│  Cognateset  │───────────────►│  every form  │
//! │ (rows=sets,  │             │  + Cognate   │                │  in ≥1 set   │
//! │  cols=langs) │◄────────────│    tables    │                │              │
//! └──────────────┘   export    └──────────────┘                └──────────────┘
//! ```
//!
//! - [`import::MatrixImporter`] reads a grid into full replacement Cognateset
//!   and Cognate tables.
//! - [`export::MatrixWriter`] renders those tables back into the same grid shape.
//! - [`singletons::add_singleton_cognatesets`] gives every uncovered form its
//!   own cognateset.
//! - [`interleaved::import_interleaved`] reads sheets with paired form and
//!   cognate-code rows.
//!
//! Every pass works on a [`Snapshot`] taken by the caller and returns its
//! result together with [`Diagnostics`]; only schema problems are fatal.

pub mod cell_parser;
pub mod diagnostics;
pub mod export;
pub mod header;
pub mod import;
pub mod interleaved;
pub mod na;
pub mod schema;
pub mod singletons;
pub mod snapshot;

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use schema::{ResolvedSchema, SchemaError};
pub use snapshot::Snapshot;

use lexmatrix_dataset::DatasetError;
use lexmatrix_grid::GridError;

#[derive(Debug, thiserror::Error)]
pub enum CognateError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("invalid form id pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("form id pattern `{0}` has no named group `ID`")]
    PatternWithoutId(String),
    #[error("sheet header has no cognateset columns")]
    NoCognatesetHeader,
}

/// Turn a free-text label into an identifier: transliterated to ASCII, then
/// lowercase letters, digits and single underscores.
pub fn string_to_id(s: &str) -> String {
    let ascii = deunicode::deunicode(s);
    let mut out = String::with_capacity(ascii.len());
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}
