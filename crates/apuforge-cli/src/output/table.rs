//! Table formatting for CLI output

use comfy_table::{Cell, Color, ContentArrangement, Table as ComfyTable};

/// Table builder for CLI output
#[derive(Debug, Clone, Default)]
pub struct TableBuilder {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl TableBuilder {
    pub fn headers(mut self, headers: &[&str]) -> Self {
        self.headers = headers.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Add a row of plain cells
    pub fn row<S: ToString>(mut self, row: &[S]) -> Self {
        self.rows.push(row.iter().map(|s| Cell::new(s.to_string())).collect());
        self
    }

    /// Add a row whose first cell is coloured
    pub fn highlighted_row<S: ToString>(mut self, color: Color, row: &[S]) -> Self {
        let cells = row
            .iter()
            .enumerate()
            .map(|(i, s)| {
                let cell = Cell::new(s.to_string());
                if i == 0 { cell.fg(color) } else { cell }
            })
            .collect();
        self.rows.push(cells);
        self
    }

    #[must_use]
    pub fn build(self) -> Table {
        let mut inner = ComfyTable::new();
        inner
            .set_header(&self.headers)
            .set_content_arrangement(ContentArrangement::Dynamic);
        for row in self.rows {
            inner.add_row(row);
        }
        Table { inner }
    }
}

/// Table for CLI output
#[derive(Debug, Clone)]
pub struct Table {
    inner: ComfyTable,
}

impl Table {
    pub fn builder() -> TableBuilder {
        TableBuilder::default()
    }

    pub fn row_count(&self) -> usize {
        self.inner.row_iter().count()
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_renders_headers_and_rows() {
        let table = Table::builder()
            .headers(&["Key", "Port"])
            .row(&["chat", "8000"])
            .highlighted_row(Color::Green, &["embedding".to_string(), 8001.to_string()])
            .build();

        assert_eq!(table.row_count(), 2);
        let output = table.to_string();
        assert!(output.contains("Key"));
        assert!(output.contains("chat"));
        assert!(output.contains("8001"));
    }
}
