use super::{Surface, Table, Widget};

/// Plain-text surface for the one-shot CLI run.
///
/// Charts cannot be drawn in a terminal, so they are listed by title and traces.
#[derive(Debug, Default)]
pub struct TerminalSurface {
    output: String,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    fn line(&mut self, text: &str) {
        self.output.push_str(text);
        self.output.push('\n');
    }
}

impl Surface for TerminalSurface {
    fn push(&mut self, widget: Widget) {
        match widget {
            Widget::Title(text) => {
                self.line(&text);
                self.line(&"=".repeat(text.chars().count()));
            }
            Widget::Subheader(text) => {
                self.line("");
                self.line(&text);
                self.line(&"-".repeat(text.chars().count()));
            }
            Widget::Text(text) => self.line(&text),
            Widget::Status(status) => self.line(status.text()),
            Widget::Table(table) => {
                let text = format_table(&table);
                self.output.push_str(&text);
            }
            Widget::Chart(chart) => {
                self.line(&format!("[chart] {} ({})", chart.title, chart.traces.join(", ")));
            }
            Widget::Failure { title, message } => {
                self.line(&format!("ERROR: {}: {}", title, message));
            }
        }
    }
}

/// Right-aligned columns separated by two spaces.
pub fn format_table(table: &Table) -> String {
    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(width) = widths.get_mut(i) {
                *width = (*width).max(cell.chars().count());
            }
        }
    }

    let render_row = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:>width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join("  ")
    };

    let mut text = render_row(&table.columns);
    text.push('\n');
    for row in &table.rows {
        text.push_str(&render_row(row));
        text.push('\n');
    }
    text
}
