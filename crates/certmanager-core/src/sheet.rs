//! Spreadsheet mapping table.
//!
//! Loads the `.xlsx`/`.xls` file driving a conversion run, resolves the
//! `original`/`nuevo` columns (by name when both exist, positionally
//! otherwise), and persists the normalized table as a semicolon-delimited
//! CSV. Row values are kept verbatim; filename derivation trims and
//! rewrites them without touching the stored table.

use std::path::Path;

use calamine::{open_workbook_auto, Reader};
use thiserror::Error;

const ORIGINAL_COLUMN: &str = "original";
const NUEVO_COLUMN: &str = "nuevo";

/// Errors that can occur while loading or persisting the mapping table.
#[derive(Error, Debug)]
pub enum SheetError {
    /// The workbook could not be opened or parsed.
    #[error("Failed to read spreadsheet: {0}")]
    Workbook(#[from] calamine::Error),

    /// The workbook has no worksheets at all.
    #[error("The spreadsheet contains no worksheets")]
    NoWorksheets,

    /// Fewer than two columns and no named `original`/`nuevo` pair.
    #[error("The spreadsheet needs at least two columns, found {found}")]
    NotEnoughColumns { found: usize },

    /// The normalized CSV could not be written.
    #[error("Failed to write mapping CSV: {0}")]
    Csv(#[from] csv::Error),

    /// I/O failure while flushing the CSV.
    #[error("Failed to write mapping CSV: {0}")]
    Io(#[from] std::io::Error),
}

/// One spreadsheet entry viewed through the two key columns.
///
/// Field values are the raw cell strings; the derivation methods apply the
/// trimming and rewriting used to locate files on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingRow<'a> {
    /// Raw `original` cell: stem of the source image.
    pub original: &'a str,
    /// Raw `nuevo` cell: desired output name.
    pub nuevo: &'a str,
}

impl MappingRow<'_> {
    /// Whether both fields carry a value after trimming.
    pub fn is_complete(&self) -> bool {
        !self.original.trim().is_empty() && !self.nuevo.trim().is_empty()
    }

    /// Expected source image name: `trim(original) + ".png"`.
    pub fn source_file_name(&self) -> String {
        format!("{}.png", self.original.trim())
    }

    /// Output PDF name: `trim(nuevo)` with spaces as underscores + `".pdf"`.
    pub fn target_file_name(&self) -> String {
        format!("{}.pdf", self.nuevo.trim().replace(' ', "_"))
    }
}

/// The loaded spreadsheet with its key columns resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
    original_col: usize,
    nuevo_col: usize,
    renamed: bool,
}

impl MappingTable {
    /// Build a table from a header row and data rows, resolving the key
    /// columns.
    ///
    /// When both `original` and `nuevo` exist as column names (exact,
    /// case-sensitive match, any position) they are used as-is. Otherwise
    /// the first two columns take those roles and the header is rewritten;
    /// [`MappingTable::used_positional_fallback`] reports this so callers
    /// can warn. With fewer than two columns the table is structurally
    /// unusable.
    pub fn from_rows(
        mut columns: Vec<String>,
        mut rows: Vec<Vec<String>>,
    ) -> Result<Self, SheetError> {
        let original_col = columns.iter().position(|c| c == ORIGINAL_COLUMN);
        let nuevo_col = columns.iter().position(|c| c == NUEVO_COLUMN);

        let (original_col, nuevo_col, renamed) = match (original_col, nuevo_col) {
            (Some(original), Some(nuevo)) => (original, nuevo, false),
            _ if columns.len() >= 2 => {
                columns[0] = ORIGINAL_COLUMN.to_string();
                columns[1] = NUEVO_COLUMN.to_string();
                (0, 1, true)
            }
            _ => {
                return Err(SheetError::NotEnoughColumns {
                    found: columns.len(),
                })
            }
        };

        // Keep every row as wide as the header so column indexing and the
        // CSV stay rectangular.
        let width = columns.len();
        for row in &mut rows {
            row.resize(width, String::new());
        }

        Ok(Self {
            columns,
            rows,
            original_col,
            nuevo_col,
            renamed,
        })
    }

    /// True when the named columns were absent and the first two columns
    /// were renamed into the `original`/`nuevo` roles.
    pub fn used_positional_fallback(&self) -> bool {
        self.renamed
    }

    /// Header names, after any positional rename.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of data rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Iterate the rows in table order through the two key columns.
    pub fn mapping_rows(&self) -> impl Iterator<Item = MappingRow<'_>> {
        self.rows.iter().map(|row| MappingRow {
            original: row.get(self.original_col).map_or("", String::as_str),
            nuevo: row.get(self.nuevo_col).map_or("", String::as_str),
        })
    }

    /// Persist the table as a semicolon-delimited CSV: header row included,
    /// no index column, existing file overwritten.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), SheetError> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .from_path(path.as_ref())?;
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Load the mapping table from the first worksheet of a spreadsheet file.
///
/// The first row is taken as the header; every cell is stringified the way
/// it displays. Format detection follows the file extension, so both
/// `.xlsx` and legacy `.xls` work.
pub fn load_mapping(path: impl AsRef<Path>) -> Result<MappingTable, SheetError> {
    let mut workbook = open_workbook_auto(path.as_ref())?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(SheetError::NoWorksheets)?;
    let range = workbook.worksheet_range(&sheet)?;

    let mut raw_rows = range.rows();
    let columns: Vec<String> = raw_rows
        .next()
        .map(|header| header.iter().map(|cell| cell.to_string()).collect())
        .unwrap_or_default();
    let rows: Vec<Vec<String>> = raw_rows
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect();

    MappingTable::from_rows(columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_named_columns_used_verbatim() {
        let table = MappingTable::from_rows(
            owned(&["folio", "nuevo", "original"]),
            vec![owned(&["f-1", "Alice A", "cert1"])],
        )
        .unwrap();

        assert!(!table.used_positional_fallback());
        let row = table.mapping_rows().next().unwrap();
        assert_eq!(row.original, "cert1");
        assert_eq!(row.nuevo, "Alice A");
        // Header order is untouched.
        assert_eq!(table.columns(), &owned(&["folio", "nuevo", "original"]));
    }

    #[test]
    fn test_positional_fallback_renames_first_two() {
        let table = MappingTable::from_rows(
            owned(&["archivo", "destino", "extra"]),
            vec![owned(&["cert1", "Alice A", "x"])],
        )
        .unwrap();

        assert!(table.used_positional_fallback());
        assert_eq!(table.columns(), &owned(&["original", "nuevo", "extra"]));
        let row = table.mapping_rows().next().unwrap();
        assert_eq!(row.original, "cert1");
        assert_eq!(row.nuevo, "Alice A");
    }

    #[test]
    fn test_single_named_column_still_falls_back() {
        // Only one of the two names is present, so positional roles win.
        let table =
            MappingTable::from_rows(owned(&["original", "destino"]), vec![]).unwrap();
        assert!(table.used_positional_fallback());
        assert_eq!(table.columns(), &owned(&["original", "nuevo"]));
    }

    #[test]
    fn test_column_match_is_case_sensitive() {
        let table = MappingTable::from_rows(
            owned(&["Original", "Nuevo"]),
            vec![owned(&["a", "b"])],
        )
        .unwrap();
        assert!(table.used_positional_fallback());
    }

    #[test]
    fn test_not_enough_columns() {
        let err = MappingTable::from_rows(owned(&["solo"]), vec![]).unwrap_err();
        assert!(matches!(err, SheetError::NotEnoughColumns { found: 1 }));

        let err = MappingTable::from_rows(vec![], vec![]).unwrap_err();
        assert!(matches!(err, SheetError::NotEnoughColumns { found: 0 }));
    }

    #[test]
    fn test_short_rows_are_padded() {
        let table = MappingTable::from_rows(
            owned(&["original", "nuevo"]),
            vec![owned(&["cert1"])],
        )
        .unwrap();
        let row = table.mapping_rows().next().unwrap();
        assert_eq!(row.original, "cert1");
        assert_eq!(row.nuevo, "");
        assert!(!row.is_complete());
    }

    #[test]
    fn test_source_file_name_trims() {
        let row = MappingRow {
            original: " img1 ",
            nuevo: "x",
        };
        assert_eq!(row.source_file_name(), "img1.png");
    }

    #[test]
    fn test_target_file_name_replaces_spaces() {
        let row = MappingRow {
            original: "x",
            nuevo: "Jane Doe",
        };
        assert_eq!(row.target_file_name(), "Jane_Doe.pdf");

        let row = MappingRow {
            original: "x",
            nuevo: "  Ana Maria Perez  ",
        };
        assert_eq!(row.target_file_name(), "Ana_Maria_Perez.pdf");
    }

    #[test]
    fn test_is_complete_rejects_blank_fields() {
        let row = MappingRow {
            original: "   ",
            nuevo: "name",
        };
        assert!(!row.is_complete());

        let row = MappingRow {
            original: "cert1",
            nuevo: "",
        };
        assert!(!row.is_complete());

        let row = MappingRow {
            original: "cert1",
            nuevo: "name",
        };
        assert!(row.is_complete());
    }

    #[test]
    fn test_write_csv_semicolon_delimited() {
        let table = MappingTable::from_rows(
            owned(&["original", "nuevo"]),
            vec![owned(&["cert1", "Alice A"]), owned(&["cert2", "Bob B"])],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imagenes.csv");
        table.write_csv(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "original;nuevo\ncert1;Alice A\ncert2;Bob B\n");
    }

    #[test]
    fn test_write_csv_quotes_delimiter_in_values() {
        let table = MappingTable::from_rows(
            owned(&["original", "nuevo"]),
            vec![owned(&["a;b", "c"])],
        )
        .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imagenes.csv");
        table.write_csv(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "original;nuevo\n\"a;b\";c\n");
    }

    #[test]
    fn test_write_csv_overwrites_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("imagenes.csv");
        std::fs::write(&path, "stale data that is much longer than the new file")
            .unwrap();

        let table =
            MappingTable::from_rows(owned(&["original", "nuevo"]), vec![]).unwrap();
        table.write_csv(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, "original;nuevo\n");
    }
}
