//! In-memory representation of a 2DA table

use std::fmt;

/// Cell text the engine treats as "no value"
pub const BLANK_CELL: &str = "****";

/// A single row of a 2DA table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwoDARow {
    label: String,
    cells: Vec<String>,
}

impl TwoDARow {
    /// Row label (usually the decimal row index)
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Cell values in column order
    pub fn cells(&self) -> &[String] {
        &self.cells
    }
}

/// A 2DA table: named columns, labelled rows, string cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TwoDA {
    headers: Vec<String>,
    rows: Vec<TwoDARow>,
}

impl TwoDA {
    /// Create an empty table with the given column headers
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Column headers in order
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    /// All rows in order
    pub fn rows(&self) -> &[TwoDARow] {
        &self.rows
    }

    /// Index of a column, compared case-insensitively
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(column))
    }

    /// Append a row. Missing cells are left empty, extra cells are dropped.
    ///
    /// Returns the index of the new row.
    pub fn add_row<I, S>(&mut self, label: impl Into<String>, cells: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cells: Vec<String> = cells.into_iter().map(Into::into).collect();
        cells.resize(self.headers.len(), String::new());
        self.rows.push(TwoDARow {
            label: label.into(),
            cells,
        });
        self.rows.len() - 1
    }

    /// Append a column filled with `default`
    pub fn add_column(&mut self, header: impl Into<String>, default: &str) {
        self.headers.push(header.into());
        for row in &mut self.rows {
            row.cells.push(default.to_string());
        }
    }

    /// Label of the row at `row`
    pub fn row_label(&self, row: usize) -> Option<&str> {
        self.rows.get(row).map(|r| r.label.as_str())
    }

    /// Find the first row with the given label
    pub fn find_row_by_label(&self, label: &str) -> Option<usize> {
        self.rows.iter().position(|r| r.label == label)
    }

    /// Find the first row whose `column` cell equals `value`
    pub fn find_row_where(&self, column: &str, value: &str) -> Option<usize> {
        let col = self.column_index(column)?;
        self.rows.iter().position(|r| r.cells[col] == value)
    }

    /// Read a cell by row index and column name
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.column_index(column)?;
        self.rows.get(row).map(|r| r.cells[col].as_str())
    }

    /// Read a cell by row and column index
    pub fn cell_at(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.cells.get(col))
            .map(String::as_str)
    }

    /// Overwrite a cell. Returns `false` when the row or column does not exist.
    pub fn set_cell(&mut self, row: usize, column: &str, value: impl Into<String>) -> bool {
        let Some(col) = self.column_index(column) else {
            return false;
        };
        match self.rows.get_mut(row) {
            Some(r) => {
                r.cells[col] = value.into();
                true
            }
            None => false,
        }
    }
}

impl fmt::Display for TwoDA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "2DA ({} rows, {} columns)",
            self.rows.len(),
            self.headers.len()
        )
    }
}

/// True when a cell carries no value (`""` or `****`)
pub fn is_blank(cell: &str) -> bool {
    cell.is_empty() || cell == BLANK_CELL
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> TwoDA {
        let mut table = TwoDA::new(["label", "name", "model"]);
        table.add_row("0", ["human", "135", "c_human"]);
        table.add_row("1", ["droid", "", "c_droid"]);
        table
    }

    #[test]
    fn test_cell_lookup_is_case_insensitive_on_columns() {
        let table = sample();
        assert_eq!(table.cell(0, "NAME"), Some("135"));
        assert_eq!(table.cell(1, "Model"), Some("c_droid"));
        assert_eq!(table.cell(2, "name"), None);
        assert_eq!(table.cell(0, "missing"), None);
    }

    #[test]
    fn test_add_row_pads_missing_cells() {
        let mut table = sample();
        let index = table.add_row("2", ["wookiee"]);
        assert_eq!(index, 2);
        assert_eq!(table.cell(2, "label"), Some("wookiee"));
        assert_eq!(table.cell(2, "model"), Some(""));
    }

    #[test]
    fn test_add_column_fills_default() {
        let mut table = sample();
        table.add_column("size", BLANK_CELL);
        assert_eq!(table.column_count(), 4);
        assert_eq!(table.cell(1, "size"), Some(BLANK_CELL));
    }

    #[test]
    fn test_find_rows() {
        let table = sample();
        assert_eq!(table.find_row_by_label("1"), Some(1));
        assert_eq!(table.find_row_where("label", "human"), Some(0));
        assert_eq!(table.find_row_where("label", "rancor"), None);
    }

    #[test]
    fn test_blank_cells() {
        assert!(is_blank(""));
        assert!(is_blank("****"));
        assert!(!is_blank("0"));
    }
}
