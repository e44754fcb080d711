//! Row-metadata header of a cognate sheet.
//!
//! The left block of the first row names Cognateset table columns. `CogSet`
//! (or an empty label, once) stands for the id column. Scanning stops at the
//! first label that is not a cognateset column; everything to the right of it
//! is a language column.

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::schema::CognatesetColumns;
use lexmatrix_dataset::TableSchema;
use lexmatrix_grid::{coordinate, Grid};

/// Header label of the cognateset id column.
pub const ID_LABEL: &str = "CogSet";

/// One row-metadata column: the Cognateset table column it fills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderColumn {
    pub name: String,
    pub separator: Option<String>,
}

/// Resolve the row-metadata labels in the first row of `grid`.
pub fn cognateset_header(
    grid: &Grid,
    table: &TableSchema,
    names: &CognatesetColumns,
    diagnostics: &mut Diagnostics,
) -> Vec<HeaderColumn> {
    let mut header: Vec<HeaderColumn> = Vec::new();
    let mut has_id = false;

    for col in 0..table.columns.len().min(grid.width()) {
        let label = grid.cell(0, col).clean_value();
        let column = if label.is_empty() || label == ID_LABEL {
            if has_id {
                break;
            }
            table.column(&names.id)
        } else {
            table.column(&label)
        };
        let Some(column) = column else {
            break;
        };
        if header.iter().any(|h| h.name == column.name) {
            break;
        }
        if column.name == names.id {
            has_id = true;
        }
        if names.comment.as_deref() == Some(column.name.as_str()) {
            diagnostics.report(
                DiagnosticKind::ParseAmbiguity,
                Some(&coordinate(0, col)),
                format!(
                    "cognateset comments come from cell notes; column `{}` is only used for rows without notes",
                    column.name
                ),
            );
        }
        header.push(HeaderColumn {
            name: column.name.clone(),
            separator: column.separator.clone(),
        });
    }

    tracing::debug!(
        columns = ?header.iter().map(|h| h.name.as_str()).collect::<Vec<_>>(),
        "cognateset header"
    );
    header
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ResolvedSchema;
    use lexmatrix_dataset::{DatasetSchema, COGNATESET_TABLE};

    fn resolve(grid: &Grid) -> (Vec<HeaderColumn>, Diagnostics) {
        let schema = DatasetSchema::wordlist();
        let names = ResolvedSchema::resolve(&schema).unwrap();
        let mut diagnostics = Diagnostics::new();
        let header = cognateset_header(
            grid,
            schema.table(COGNATESET_TABLE).unwrap(),
            &names.cognateset,
            &mut diagnostics,
        );
        (header, diagnostics)
    }

    fn names(header: &[HeaderColumn]) -> Vec<&str> {
        header.iter().map(|h| h.name.as_str()).collect()
    }

    #[test]
    fn stops_at_first_language() {
        let grid = Grid::from_text_rows([vec!["CogSet", "Name", "Duala", "Ntomba"]]);
        let (header, diagnostics) = resolve(&grid);
        assert_eq!(names(&header), vec!["ID", "Name"]);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn empty_label_means_id_only_once() {
        let grid = Grid::from_text_rows([vec!["", "", "Duala"]]);
        let (header, _) = resolve(&grid);
        assert_eq!(names(&header), vec!["ID"]);
    }

    #[test]
    fn comment_column_in_header_is_flagged() {
        let grid = Grid::from_text_rows([vec!["CogSet", "Comment", "Duala"]]);
        let (header, diagnostics) = resolve(&grid);
        assert_eq!(names(&header), vec!["ID", "Comment"]);
        assert_eq!(diagnostics.count(DiagnosticKind::ParseAmbiguity), 1);
    }
}
