//! Options file for `--config`.
//!
//! ```json
//! {
//!   "import": { "header_rows": 2, "syntax": "multi_value" },
//!   "export": { "row_order": { "alphabetical": "name" } },
//!   "singletons": { "status": "needs review" }
//! }
//! ```
//!
//! Every section and field is optional; flags given on the command line
//! override what the file says.

use anyhow::{Context, Result};
use lexmatrix_cognates::export::ExportOptions;
use lexmatrix_cognates::import::ImportOptions;
use lexmatrix_cognates::singletons::SingletonOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub import: ImportOptions,
    pub export: ExportOptions,
    pub singletons: SingletonOptions,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        tracing::debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }
}
