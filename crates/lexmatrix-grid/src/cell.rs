//! Single spreadsheet cells.

use serde::{Deserialize, Serialize};

/// Raw value of a cell as the spreadsheet stores it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

/// A cell: value, hyperlink targets and an attached free-text note.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "CellRepr")]
pub struct Cell {
    #[serde(default, skip_serializing_if = "CellValue::is_empty")]
    pub value: CellValue,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Sheet files may spell a plain cell as a bare JSON scalar.
#[derive(Deserialize)]
#[serde(untagged)]
enum CellRepr {
    Bare(CellValue),
    Full {
        #[serde(default)]
        value: CellValue,
        #[serde(default)]
        links: Vec<String>,
        #[serde(default)]
        comment: Option<String>,
    },
}

impl From<CellRepr> for Cell {
    fn from(repr: CellRepr) -> Self {
        match repr {
            CellRepr::Bare(value) => Cell {
                value,
                ..Cell::default()
            },
            CellRepr::Full {
                value,
                links,
                comment,
            } => Cell {
                value,
                links,
                comment,
            },
        }
    }
}

impl Cell {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn text(s: impl Into<String>) -> Self {
        let s = s.into();
        Cell {
            value: if s.is_empty() {
                CellValue::Empty
            } else {
                CellValue::Text(s)
            },
            ..Cell::default()
        }
    }

    pub fn number(n: f64) -> Self {
        Cell {
            value: CellValue::Number(n),
            ..Cell::default()
        }
    }

    pub fn with_link(mut self, target: impl Into<String>) -> Self {
        self.links.push(target.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        let comment = comment.into();
        self.comment = if comment.is_empty() { None } else { Some(comment) };
        self
    }

    /// Display text normalized for parsing.
    ///
    /// Whitespace around the whole cell is trimmed, a leading `'`
    /// (text-forcing prefix) is dropped and integral numbers lose their
    /// fractional part. For a cell holding a joined list this also trims the
    /// outer edges of its first and last element.
    pub fn clean_value(&self) -> String {
        match &self.value {
            CellValue::Empty => String::new(),
            CellValue::Number(n) => {
                if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            CellValue::Text(s) => {
                let s = s.trim();
                s.strip_prefix('\'').unwrap_or(s).trim().to_string()
            }
        }
    }

    /// The note attached to the cell, if it has any content.
    pub fn annotation(&self) -> Option<&str> {
        self.comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// No value, no links, no note.
    pub fn is_blank(&self) -> bool {
        self.clean_value().is_empty() && self.links.is_empty() && self.annotation().is_none()
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::text(s)
    }
}
