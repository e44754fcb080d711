//! Spreadsheet grids for lexmatrix
//!
//! A [`Grid`] is a rectangular block of [`Cell`]s (value, hyperlinks, note),
//! read completely into memory and never mutated while it is being parsed.
//!
//! Matrix-shaped sheets give rows and columns two roles at once: the top
//! `header_rows` rows describe the columns, the left `header_cols` columns
//! describe the rows, and the rest is data. [`SheetView`] keeps that split in
//! one place and hands out typed [`RowView`]s and [`ColumnView`]s instead of
//! leaving index arithmetic to every caller.

pub mod cell;

pub use cell::{Cell, CellValue};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid sheet file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("header band {header_rows}x{header_cols} does not fit a {height}x{width} grid")]
    Layout {
        header_rows: usize,
        header_cols: usize,
        height: usize,
        width: usize,
    },
}

static EMPTY: Cell = Cell {
    value: CellValue::Empty,
    links: Vec::new(),
    comment: None,
};

/// Rectangular cell grid (one sheet).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Grid {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    rows: Vec<Vec<Cell>>,
}

impl Grid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from rows of possibly different lengths; short rows are padded.
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Self {
        let mut grid = Grid {
            title: None,
            rows,
        };
        grid.pad();
        grid
    }

    /// Convenience for sheets made only of text.
    pub fn from_text_rows<R, S>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_rows(
            rows.into_iter()
                .map(|row| row.into_iter().map(|s| Cell::text(s.as_ref())).collect())
                .collect(),
        )
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Cell at (row, column), 0-based; out-of-range cells read as empty.
    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    /// Set a cell, growing the grid as needed.
    pub fn set(&mut self, row: usize, col: usize, cell: Cell) {
        if row >= self.rows.len() {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let width = self.width().max(col + 1);
        for r in &mut self.rows {
            if r.len() < width {
                r.resize_with(width, Cell::default);
            }
        }
        self.rows[row][col] = cell;
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// View the grid with a header band of the given size.
    pub fn view(&self, header_rows: usize, header_cols: usize) -> Result<SheetView<'_>, GridError> {
        if header_rows > self.height() || header_cols > self.width() {
            return Err(GridError::Layout {
                header_rows,
                header_cols,
                height: self.height(),
                width: self.width(),
            });
        }
        Ok(SheetView {
            grid: self,
            header_rows,
            header_cols,
        })
    }

    pub fn load_json(path: &Path) -> Result<Self, GridError> {
        let text = fs::read_to_string(path).map_err(|source| GridError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut grid: Grid = serde_json::from_str(&text).map_err(|source| GridError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        grid.pad();
        Ok(grid)
    }

    pub fn save_json(&self, path: &Path) -> Result<(), GridError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| GridError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| GridError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    fn pad(&mut self) {
        let width = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut self.rows {
            row.resize_with(width, Cell::default);
        }
    }
}

/// A grid split into header band and data band.
#[derive(Debug, Clone, Copy)]
pub struct SheetView<'g> {
    grid: &'g Grid,
    header_rows: usize,
    header_cols: usize,
}

/// One data row: its row-metadata cells and its data cells.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'g> {
    /// 0-based row index in the grid.
    pub index: usize,
    pub header: &'g [Cell],
    pub data: &'g [Cell],
}

/// One data column: its column-metadata cells, top to bottom.
#[derive(Debug, Clone)]
pub struct ColumnView<'g> {
    /// 0-based column index in the grid.
    pub index: usize,
    pub header: Vec<&'g Cell>,
}

impl<'g> SheetView<'g> {
    pub fn header_rows(&self) -> usize {
        self.header_rows
    }

    pub fn header_cols(&self) -> usize {
        self.header_cols
    }

    /// Labels of the row-metadata columns (first row, left block).
    pub fn row_header_labels(&self) -> &'g [Cell] {
        self.grid
            .rows
            .first()
            .map_or(&[][..], |r| &r[..self.header_cols.min(r.len())])
    }

    /// Data columns with their header cells.
    pub fn columns(&self) -> impl Iterator<Item = ColumnView<'g>> + '_ {
        let grid = self.grid;
        (self.header_cols..grid.width()).map(move |col| ColumnView {
            index: col,
            header: (0..self.header_rows).map(|row| grid.cell(row, col)).collect(),
        })
    }

    /// Data rows with their header cells.
    pub fn rows(&self) -> impl Iterator<Item = RowView<'g>> + '_ {
        let header_cols = self.header_cols;
        self.grid
            .rows
            .iter()
            .enumerate()
            .skip(self.header_rows)
            .map(move |(index, row)| {
                let split = header_cols.min(row.len());
                RowView {
                    index,
                    header: &row[..split],
                    data: &row[split..],
                }
            })
    }
}

impl<'g> RowView<'g> {
    /// Data cell for grid column `col`.
    pub fn cell_at(&self, col: usize, header_cols: usize) -> &'g Cell {
        col.checked_sub(header_cols)
            .and_then(|i| self.data.get(i))
            .unwrap_or(&EMPTY)
    }

    pub fn header_is_blank(&self) -> bool {
        self.header.iter().all(|c| c.clean_value().is_empty())
    }
}

/// Spreadsheet-style coordinate (`B3`) of a 0-based position, for messages.
pub fn coordinate(row: usize, col: usize) -> String {
    let mut letters = Vec::new();
    let mut n = col + 1;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect::<String>() + &(row + 1).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Grid {
        Grid::from_text_rows([
            vec!["CogSet", "Name", "Duala", "Ntomba"],
            vec!["c1", "one", "a", "b"],
            vec!["c2", "two", "", "d"],
        ])
    }

    #[test]
    fn views_split_header_and_data_bands() {
        let grid = sample();
        let view = grid.view(1, 2).unwrap();

        let labels: Vec<String> = view
            .row_header_labels()
            .iter()
            .map(Cell::clean_value)
            .collect();
        assert_eq!(labels, vec!["CogSet", "Name"]);

        let columns: Vec<(usize, String)> = view
            .columns()
            .map(|c| (c.index, c.header[0].clean_value()))
            .collect();
        assert_eq!(columns, vec![(2, "Duala".into()), (3, "Ntomba".into())]);

        let rows: Vec<RowView> = view.rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].index, 2);
        assert_eq!(rows[1].header[0].clean_value(), "c2");
        assert_eq!(rows[1].cell_at(3, 2).clean_value(), "d");
        assert!(rows[1].cell_at(2, 2).is_blank());
    }

    #[test]
    fn oversize_header_band_is_rejected() {
        let grid = sample();
        assert!(matches!(grid.view(5, 1), Err(GridError::Layout { .. })));
    }

    #[test]
    fn set_grows_and_pads() {
        let mut grid = Grid::new();
        grid.set(2, 3, Cell::text("x"));
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.cell(2, 3).clean_value(), "x");
        assert!(grid.cell(0, 0).is_blank());
        assert!(grid.cell(10, 10).is_blank());
    }

    #[test]
    fn coordinates_use_spreadsheet_letters() {
        assert_eq!(coordinate(0, 0), "A1");
        assert_eq!(coordinate(2, 27), "AB3");
    }

    #[test]
    fn sheet_json_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sheet.json");
        let mut grid = sample().with_title("cognates");
        grid.set(
            1,
            2,
            Cell::text("a")
                .with_link("https://example.org/lexicon/duala_one")
                .with_comment("note"),
        );
        grid.save_json(&path).unwrap();
        assert_eq!(Grid::load_json(&path).unwrap(), grid);
    }
}
