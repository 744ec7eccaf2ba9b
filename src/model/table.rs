//! Table types.

use super::Document;
use serde::{Deserialize, Serialize};

/// A table structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Explicit identifier
    #[serde(default)]
    pub id: Option<String>,

    /// Table title (caption)
    #[serde(default)]
    pub title: Option<String>,

    /// Rows in the table
    pub rows: Vec<TableRow>,

    /// Number of header rows (0 = no header)
    #[serde(default)]
    pub header_rows: u8,
}

impl Table {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with header.
    pub fn with_header(header_rows: u8) -> Self {
        Self {
            header_rows,
            ..Self::new()
        }
    }

    /// Add a row to the table.
    pub fn add_row(&mut self, row: TableRow) {
        self.rows.push(row);
    }
}

/// A table row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    /// Cells in the row
    pub cells: Vec<TableCell>,
}

impl TableRow {
    /// Create a new row with cells.
    pub fn new(cells: Vec<TableCell>) -> Self {
        Self { cells }
    }
}

/// Cell style, which decides how the cell content is processed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellStyle {
    /// Normal inline content
    #[default]
    Default,
    /// Emphasized text
    Emphasis,
    /// Header-styled text
    Header,
    /// Literal text, no substitutions
    Literal,
    /// Monospaced text
    Monospace,
    /// Strong text
    Strong,
    /// Nested document
    AsciiDoc,
}

/// A table cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Cell style
    #[serde(default)]
    pub style: CellStyle,

    /// Raw cell text
    #[serde(default)]
    pub text: String,

    /// Nested document for `asciidoc`-styled cells
    #[serde(default)]
    pub inner_document: Option<Document>,

    /// Number of rows this cell spans
    #[serde(default = "one")]
    pub rowspan: u8,

    /// Number of columns this cell spans
    #[serde(default = "one")]
    pub colspan: u8,
}

fn one() -> u8 {
    1
}

impl TableCell {
    /// Create a new cell with text content.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            style: CellStyle::Default,
            text: text.into(),
            inner_document: None,
            rowspan: 1,
            colspan: 1,
        }
    }

    /// Create a literal cell.
    pub fn literal(text: impl Into<String>) -> Self {
        Self::text(text).with_style(CellStyle::Literal)
    }

    /// Create a cell holding a nested document.
    pub fn asciidoc(document: Document) -> Self {
        Self {
            inner_document: Some(document),
            ..Self::text("").with_style(CellStyle::AsciiDoc)
        }
    }

    /// Set the style and return self.
    pub fn with_style(mut self, style: CellStyle) -> Self {
        self.style = style;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Prose;

    #[test]
    fn test_table_rows() {
        let mut table = Table::with_header(1);
        table.add_row(TableRow::new(vec![TableCell::text("Symbol")]));
        table.add_row(TableRow::new(vec![TableCell::text("stem:[pi]")]));

        assert_eq!(table.header_rows, 1);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].cells[0].text, "stem:[pi]");
    }

    #[test]
    fn test_cell_styles() {
        assert_eq!(TableCell::text("a").style, CellStyle::Default);
        assert_eq!(TableCell::literal("a").style, CellStyle::Literal);

        let inner = Document::new().with_block(Prose::paragraph("nested"));
        let cell = TableCell::asciidoc(inner);
        assert_eq!(cell.style, CellStyle::AsciiDoc);
        assert!(cell.inner_document.is_some());
        assert!(cell.text.is_empty());
    }

    #[test]
    fn test_cell_spans_default_to_one() {
        let cell: TableCell = serde_json::from_str(r#"{ "text": "x" }"#).unwrap();
        assert_eq!(cell.rowspan, 1);
        assert_eq!(cell.colspan, 1);
        assert_eq!(cell.style, CellStyle::Default);
    }
}
