//! Sheets with interleaved form and cognate-code rows.
//!
//! ```text
//!          | Duala        | Ntomba
//! all      | ɓɛ́sɛ̃         | (nk)umá, nkúmá
//!          | 1            | 9, 10
//! arm      | dia          | ?
//!          | 7            | ?
//! ```
//!
//! Row 0 names the languages. Data comes in pairs of rows: the first carries
//! the concept in column 0 and the forms, the second the cognate codes for
//! those forms in the same order.

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::na::UNKNOWN;
use crate::string_to_id;
use lexmatrix_grid::{coordinate, Grid};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::OnceLock;

fn code_separator() -> &'static Regex {
    static CODE_SEPARATOR: OnceLock<Regex> = OnceLock::new();
    CODE_SEPARATOR.get_or_init(|| Regex::new(r"[,;]\s*").expect("static pattern is valid"))
}

/// One form read from an interleaved sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterleavedRecord {
    #[serde(rename = "ID")]
    pub id: String,
    #[serde(rename = "Language_ID")]
    pub language: String,
    #[serde(rename = "Parameter_ID")]
    pub concept: String,
    #[serde(rename = "Form")]
    pub form: String,
    #[serde(rename = "Comment")]
    pub comment: Option<String>,
    #[serde(rename = "Cognateset_ID")]
    pub cognateset: Option<String>,
}

/// Split on `separators` wherever no bracket is open. Pieces are trimmed and
/// empty pieces dropped.
pub fn split_outside_brackets(text: &str, separators: &[char]) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for c in text.chars() {
        match c {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        if depth == 0 && separators.contains(&c) {
            pieces.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    pieces.push(current);
    pieces
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn split_codes(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    code_separator()
        .split(text.trim())
        .map(|c| c.trim().to_string())
        .collect()
}

/// Read every form of an interleaved sheet, language by language. Labels
/// that slug to an id already given out get a numeric suffix.
pub fn import_interleaved(grid: &Grid, diagnostics: &mut Diagnostics) -> Vec<InterleavedRecord> {
    let mut records = Vec::new();
    let mut taken: HashSet<String> = HashSet::new();
    for col in 1..grid.width() {
        let language = grid.cell(0, col).clean_value();
        if language.is_empty() {
            continue;
        }
        let language = string_to_id(&language);

        for row in (1..grid.height()).step_by(2) {
            let concept = grid.cell(row, 0).clean_value();
            let forms = split_outside_brackets(&grid.cell(row, col).clean_value(), &[',', ';']);
            if forms.is_empty() {
                continue;
            }
            if concept.is_empty() {
                diagnostics.report(
                    DiagnosticKind::ParseAmbiguity,
                    Some(&coordinate(row, 0)),
                    "forms without a concept; skipped",
                );
                continue;
            }
            let codes = split_codes(&grid.cell(row + 1, col).clean_value());
            let codes: Vec<Option<String>> = if codes.len() == 1 {
                vec![codes.into_iter().next(); forms.len()]
            } else {
                if !codes.is_empty() && codes.len() != forms.len() {
                    diagnostics.report(
                        DiagnosticKind::ParseAmbiguity,
                        Some(&coordinate(row + 1, col)),
                        format!(
                            "{} forms but {} cognate codes; pairing them in order",
                            forms.len(),
                            codes.len()
                        ),
                    );
                }
                let mut codes: Vec<Option<String>> = codes.into_iter().map(Some).collect();
                codes.resize(forms.len(), None);
                codes
            };

            let base = string_to_id(&format!("{language}_{concept}"));
            for (f, (form, code)) in forms.into_iter().zip(codes).enumerate() {
                if form == UNKNOWN || code.as_deref() == Some(UNKNOWN) {
                    continue;
                }
                let wanted = if f == 0 {
                    base.clone()
                } else {
                    format!("{base}_s{}", f + 1)
                };
                let mut id = wanted.clone();
                let mut n = 1;
                while !taken.insert(id.clone()) {
                    n += 1;
                    id = format!("{wanted}_{n}");
                }
                if id != wanted {
                    diagnostics.report(
                        DiagnosticKind::ParseAmbiguity,
                        Some(&coordinate(row, col)),
                        format!("form id `{wanted}` already used; `{form}` becomes `{id}`"),
                    );
                }
                records.push(InterleavedRecord {
                    id,
                    language: language.clone(),
                    concept: concept.clone(),
                    form,
                    comment: None,
                    cognateset: code.filter(|c| !c.is_empty()),
                });
            }
        }
    }
    tracing::info!(forms = records.len(), "interleaved sheet read");
    records
}
