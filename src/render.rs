//! Presentation layer: renderers push [`Widget`]s into a [`Surface`], which decides how they
//! are shown (an HTML page, a terminal, or a plain `Vec` in tests).

pub mod forecast;
pub mod page;
pub mod raw;
pub mod terminal;

use std::fmt;

pub use forecast::render_forecast;
pub use raw::render_raw;

/// Rows shown by every table widget.
pub const TABLE_ROWS: usize = 5;

/// Progress notices around data loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    LoadingStarted,
    LoadingFinished,
}

impl Status {
    pub fn text(&self) -> &'static str {
        match self {
            Status::LoadingStarted => "Loading data...",
            Status::LoadingFinished => "Loading data... done!",
        }
    }
}

/// A small text table, already formatted for display.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// A serialized plotly figure.
#[derive(Clone, PartialEq)]
pub struct Chart {
    /// DOM id of the element the chart is drawn into
    pub id: String,
    pub title: String,
    /// Trace names in drawing order
    pub traces: Vec<String>,
    /// Figure JSON with `data`, `layout` and `config`
    pub figure: String,
}

impl fmt::Debug for Chart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chart")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("traces", &self.traces)
            .field("figure_bytes", &self.figure.len())
            .finish()
    }
}

/// One display element.
#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    Title(String),
    Subheader(String),
    Text(String),
    Status(Status),
    Table(Table),
    Chart(Chart),
    /// Shown in place of a section that could not be produced
    Failure { title: String, message: String },
}

/// Sink the renderers write to.
pub trait Surface {
    fn push(&mut self, widget: Widget);
}

impl Surface for Vec<Widget> {
    fn push(&mut self, widget: Widget) {
        Vec::push(self, widget);
    }
}

/// Fixed two decimals, the way the tables show prices.
pub(crate) fn price(value: f64) -> String {
    format!("{:.2}", value)
}
