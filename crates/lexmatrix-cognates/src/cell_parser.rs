//! Turning one data cell into the judgements it encodes.
//!
//! The syntax is chosen once per run ([`CellSyntax`]) and the importer holds
//! the resulting strategy as a `Box<dyn CellParser>`. Parsers only read the
//! cell; whether a form id actually exists is the importer's business.
//!
//! Segment alignments are written inline with braces: `t { a - b } e` means
//! the form's segments are `t a b e` and the judgement covers segments 2 to 3,
//! aligned as `a - b`.

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::{na, CognateError};
use lexmatrix_grid::Cell;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default form-id pattern: the last component of a URL path.
pub const DEFAULT_FORM_ID_PATTERN: &str = r"/(?P<ID>[^/]*)/?$";

/// Separates the texts of several judgements in one cell.
pub const ENTRY_SEPARATOR: &str = "\n";

/// Marks gaps in an alignment; gaps are not segments.
pub const GAP: &str = "-";

/// One judgement read from a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellEntry {
    pub form_id: String,
    pub segment_slice: Option<Vec<String>>,
    pub alignment: Option<Vec<String>>,
    /// The cell note, passed through untouched.
    pub comment: Option<String>,
}

impl CellEntry {
    fn plain(form_id: impl Into<String>, cell: &Cell) -> Self {
        Self {
            form_id: form_id.into(),
            segment_slice: None,
            alignment: None,
            comment: cell.annotation().map(str::to_string),
        }
    }
}

pub trait CellParser {
    /// Parse one data cell into its judgements, in cell order. Blank cells
    /// yield nothing.
    fn parse(&self, cell: &Cell, location: &str, diagnostics: &mut Diagnostics) -> Vec<CellEntry>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellSyntax {
    /// The cell text is one form id.
    PlainText,
    /// Every hyperlink in the cell points at one form.
    #[default]
    Hyperlink,
    /// The cell text is a list of form ids.
    MultiValue,
}

/// Build the parser for `syntax`.
pub fn build(
    syntax: CellSyntax,
    form_id_pattern: &str,
    separator: &str,
) -> Result<Box<dyn CellParser>, CognateError> {
    Ok(match syntax {
        CellSyntax::PlainText => Box::new(PlainTextParser),
        CellSyntax::Hyperlink => Box::new(HyperlinkParser::new(form_id_pattern)?),
        CellSyntax::MultiValue => Box::new(MultiValueParser::new(separator)),
    })
}

// ============================================================================
// Hyperlinks
// ============================================================================

#[derive(Debug, Clone)]
pub struct HyperlinkParser {
    extractor: Regex,
}

impl HyperlinkParser {
    /// `pattern` must contain a named group `ID`.
    pub fn new(pattern: &str) -> Result<Self, CognateError> {
        let extractor = Regex::new(pattern)?;
        if !extractor.capture_names().any(|name| name == Some("ID")) {
            return Err(CognateError::PatternWithoutId(pattern.to_string()));
        }
        Ok(Self { extractor })
    }

    pub fn form_id(&self, target: &str) -> Option<String> {
        self.extractor
            .captures(target)
            .and_then(|caps| caps.name("ID"))
            .map(|m| m.as_str().to_string())
            .filter(|id| !id.is_empty())
    }
}

impl Default for HyperlinkParser {
    fn default() -> Self {
        Self {
            extractor: Regex::new(DEFAULT_FORM_ID_PATTERN).expect("default pattern is valid"),
        }
    }
}

impl CellParser for HyperlinkParser {
    fn parse(&self, cell: &Cell, location: &str, diagnostics: &mut Diagnostics) -> Vec<CellEntry> {
        let text = cell.clean_value();
        if cell.links.is_empty() {
            if na::classify(&text).is_none() {
                diagnostics.report(
                    DiagnosticKind::ParseAmbiguity,
                    Some(location),
                    format!("cell text `{text}` carries no link to a form; skipped"),
                );
            }
            return Vec::new();
        }

        let texts: Vec<&str> = text.split(ENTRY_SEPARATOR).map(str::trim).collect();
        let paired = texts.len() == cell.links.len();
        if !paired && cell.links.len() > 1 {
            diagnostics.report(
                DiagnosticKind::ParseAmbiguity,
                Some(location),
                format!(
                    "{} links but {} text lines; alignments of this cell are ignored",
                    cell.links.len(),
                    texts.len()
                ),
            );
        }

        let mut entries = Vec::new();
        for (i, target) in cell.links.iter().enumerate() {
            let Some(form_id) = self.form_id(target) else {
                diagnostics.report(
                    DiagnosticKind::ReferenceMismatch,
                    Some(location),
                    format!("link `{target}` does not match the form id pattern; skipped"),
                );
                continue;
            };
            let piece = if paired {
                texts.get(i).copied()
            } else if cell.links.len() == 1 {
                Some(text.as_str())
            } else {
                None
            };
            let mut entry = CellEntry::plain(form_id, cell);
            if let Some((slice, alignment)) = piece.and_then(alignment_from_braces) {
                entry.segment_slice = Some(slice);
                entry.alignment = Some(alignment);
            }
            entries.push(entry);
        }
        entries
    }
}

// ============================================================================
// Plain text / separated lists
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextParser;

impl CellParser for PlainTextParser {
    fn parse(&self, cell: &Cell, _location: &str, _diagnostics: &mut Diagnostics) -> Vec<CellEntry> {
        let text = cell.clean_value();
        if na::classify(&text).is_some() {
            return Vec::new();
        }
        vec![CellEntry::plain(text, cell)]
    }
}

#[derive(Debug, Clone)]
pub struct MultiValueParser {
    separator: String,
}

impl MultiValueParser {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl CellParser for MultiValueParser {
    fn parse(&self, cell: &Cell, location: &str, diagnostics: &mut Diagnostics) -> Vec<CellEntry> {
        let text = cell.clean_value();
        let mut entries = Vec::new();
        for piece in text.split(self.separator.as_str()).map(str::trim) {
            match na::classify(piece) {
                None => entries.push(CellEntry::plain(piece, cell)),
                Some(na::NaKind::Absent) if text.contains(self.separator.as_str()) => {
                    diagnostics.report(
                        DiagnosticKind::ParseAmbiguity,
                        Some(location),
                        format!("absence marker `{piece}` mixed with form ids; ignored"),
                    );
                }
                Some(_) => {}
            }
        }
        entries
    }
}

// ============================================================================
// Brace alignments
// ============================================================================

/// Read `before { aligned } after` into a 1-based segment slice and the
/// aligned symbols. Text without a complete brace pair has no alignment.
pub fn alignment_from_braces(text: &str) -> Option<(Vec<String>, Vec<String>)> {
    let (before, rest) = text.split_once('{')?;
    let (inside, _after) = rest.split_once('}')?;
    let start = before.split_whitespace().count();
    let alignment: Vec<String> = inside.split_whitespace().map(str::to_string).collect();
    let segments = alignment.iter().filter(|s| s.as_str() != GAP).count();
    let slice = if segments == 0 {
        Vec::new()
    } else {
        vec![format!("{}:{}", start + 1, start + segments)]
    };
    Some((slice, alignment))
}

/// Parse slice ranges (`2:4`, `5`) into the covering 1-based inclusive range.
pub fn parse_slice(ranges: &[String]) -> Option<(usize, usize)> {
    let mut bounds: Option<(usize, usize)> = None;
    for range in ranges {
        let (lo, hi) = match range.split_once(':') {
            Some((lo, hi)) => (lo.trim().parse().ok()?, hi.trim().parse().ok()?),
            None => {
                let n = range.trim().parse().ok()?;
                (n, n)
            }
        };
        bounds = Some(match bounds {
            Some((a, b)) => (a.min(lo), b.max(hi)),
            None => (lo, hi),
        });
    }
    bounds.filter(|(lo, hi)| *lo >= 1 && lo <= hi)
}

/// Inverse of [`alignment_from_braces`]. `None` when there is nothing to
/// align, in which case callers show the plain form.
pub fn render_with_braces(
    segments: &[String],
    slice: Option<(usize, usize)>,
    alignment: Option<&[String]>,
) -> Option<String> {
    let (before, inside, after): (&[String], Vec<String>, &[String]) = match slice {
        Some((lo, hi)) if hi <= segments.len() => (
            &segments[..lo - 1],
            alignment.map_or_else(|| segments[lo - 1..hi].to_vec(), <[String]>::to_vec),
            &segments[hi..],
        ),
        _ => (&[], alignment?.to_vec(), &[]),
    };
    let mut parts = Vec::new();
    if !before.is_empty() {
        parts.push(before.join(" "));
    }
    parts.push(format!("{{ {} }}", inside.join(" ")));
    if !after.is_empty() {
        parts.push(after.join(" "));
    }
    Some(parts.join(" "))
}
