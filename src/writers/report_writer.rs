use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table as TextTable};

use crate::config::OutputFormat;
use crate::dashboard::{PanelContent, Response};
use crate::error::Result;
use crate::models::{ColumnData, Matrix, Table};
use crate::utils::constants::DEFAULT_PREVIEW_ROWS;

/// Renders dashboard responses for the terminal or as JSON.
pub struct ReportWriter {
    format: OutputFormat,
    max_rows: usize,
}

impl ReportWriter {
    pub fn new() -> Self {
        Self {
            format: OutputFormat::Text,
            max_rows: DEFAULT_PREVIEW_ROWS,
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Rows shown per table in text output; JSON always carries every row
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    pub fn render(&self, response: &Response) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(response)?),
            OutputFormat::Text => Ok(self.render_text(response)),
        }
    }

    fn render_text(&self, response: &Response) -> String {
        let mut out = String::new();
        for warning in &response.warnings {
            out.push_str(&format!("Warning: {}\n", warning));
        }

        for panel in &response.panels {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&panel.title);
            out.push('\n');
            match &panel.content {
                PanelContent::Table(table) => out.push_str(&self.render_table(table)),
                PanelContent::Matrix(matrix) => out.push_str(&render_matrix(matrix)),
            }
            out.push('\n');
        }
        out
    }

    pub fn render_table(&self, table: &Table) -> String {
        let mut text = TextTable::new();
        text.load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(table.column_names());

        let shown = table.row_count().min(self.max_rows);
        for row in 0..shown {
            text.add_row(table.columns().iter().map(|column| {
                let cell = Cell::new(column.data.cell_text(row));
                match column.data {
                    ColumnData::Numeric(_) => cell.set_alignment(CellAlignment::Right),
                    _ => cell,
                }
            }));
        }

        let mut out = text.to_string();
        if table.row_count() > shown {
            out.push_str(&format!("\n... {} more rows", table.row_count() - shown));
        } else if table.is_empty() {
            out.push_str("\n(no rows)");
        }
        out
    }
}

impl Default for ReportWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Matrix as a labelled grid, two decimals per coefficient
pub fn render_matrix(matrix: &Matrix) -> String {
    let mut text = TextTable::new();
    let mut header = vec![String::new()];
    header.extend(matrix.labels().iter().cloned());
    text.load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);

    for (label, row) in matrix.labels().iter().zip(matrix.rows()) {
        let mut cells = vec![Cell::new(label)];
        cells.extend(row.iter().map(|r| {
            let value = if r.is_nan() {
                "NaN".to_string()
            } else {
                format!("{:.2}", r)
            };
            Cell::new(value).set_alignment(CellAlignment::Right)
        }));
        text.add_row(cells);
    }
    text.to_string()
}
