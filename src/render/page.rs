//! Server-rendered dashboard page.
//!
//! The page carries the ticker select and the months slider as a GET form that re-submits on
//! change, followed by the widgets of one run. Charts are drawn client side by plotly.js from
//! the serialized figures.

use common::{Horizon, Selection, Ticker};

use super::{Chart, Surface, Table, Widget};

const PLOTLY_JS: &str = "https://cdn.plot.ly/plotly-2.12.1.min.js";

/// Collects widgets and renders them as one HTML document.
#[derive(Debug)]
pub struct HtmlPage {
    selection: Selection,
    widgets: Vec<Widget>,
}

impl HtmlPage {
    pub fn new(selection: Selection) -> Self {
        Self {
            selection,
            widgets: Vec::new(),
        }
    }

    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    pub fn render(&self) -> String {
        let mut body = String::new();
        let mut form_written = false;

        for widget in &self.widgets {
            body.push_str(&render_widget(widget));
            // The inputs sit right under the title
            if matches!(widget, Widget::Title(_)) && !form_written {
                body.push_str(&selection_form(&self.selection));
                form_written = true;
            }
        }
        if !form_written {
            body.insert_str(0, &selection_form(&self.selection));
        }

        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Stock Forecast App</title>
<script src="{plotly}"></script>
<style>
body {{ font-family: sans-serif; max-width: 1100px; margin: 0 auto; padding: 1rem 2rem; color: #262730; }}
table {{ border-collapse: collapse; margin: 0.5rem 0 1rem; font-size: 0.9rem; }}
th, td {{ border: 1px solid #e6e9ef; padding: 0.25rem 0.6rem; text-align: right; }}
th {{ background: #f0f2f6; }}
.status {{ color: #555; font-style: italic; }}
.failure {{ background: #ffe9e9; border: 1px solid #ff4b4b; border-radius: 0.4rem; padding: 0.6rem 1rem; margin: 0.5rem 0; }}
form label {{ display: block; margin-top: 0.6rem; }}
</style>
</head>
<body>
{body}</body>
</html>
"#,
            plotly = PLOTLY_JS,
            body = body
        )
    }
}

impl Surface for HtmlPage {
    fn push(&mut self, widget: Widget) {
        self.widgets.push(widget);
    }
}

fn render_widget(widget: &Widget) -> String {
    match widget {
        Widget::Title(text) => format!("<h1>{}</h1>\n", escape(text)),
        Widget::Subheader(text) => format!("<h3>{}</h3>\n", escape(text)),
        Widget::Text(text) => format!("<p>{}</p>\n", escape(text)),
        Widget::Status(status) => format!("<p class=\"status\">{}</p>\n", escape(status.text())),
        Widget::Table(table) => render_table(table),
        Widget::Chart(chart) => render_chart(chart),
        Widget::Failure { title, message } => format!(
            "<div class=\"failure\"><strong>{}</strong><br>{}</div>\n",
            escape(title),
            escape(message)
        ),
    }
}

fn selection_form(selection: &Selection) -> String {
    let options: String = Ticker::ALL
        .iter()
        .map(|ticker| {
            let selected = if *ticker == selection.ticker { " selected" } else { "" };
            format!(
                "<option value=\"{symbol}\"{selected}>{symbol}</option>",
                symbol = escape(ticker.symbol()),
                selected = selected
            )
        })
        .collect();

    format!(
        concat!(
            "<form method=\"get\" action=\"/\">\n",
            "<label for=\"ticker\">Select dataset for prediction</label>\n",
            "<select id=\"ticker\" name=\"ticker\" onchange=\"this.form.submit()\">{options}</select>\n",
            "<label for=\"months\">Months of prediction: <output id=\"months-value\">{months}</output></label>\n",
            "<input type=\"range\" id=\"months\" name=\"months\" min=\"{min}\" max=\"{max}\" step=\"1\" value=\"{months}\" ",
            "oninput=\"document.getElementById('months-value').value = this.value\" onchange=\"this.form.submit()\">\n",
            "</form>\n"
        ),
        options = options,
        months = selection.horizon.months(),
        min = Horizon::MIN_MONTHS,
        max = Horizon::MAX_MONTHS,
    )
}

fn render_table(table: &Table) -> String {
    let mut html = String::from("<table>\n<thead><tr>");
    for column in &table.columns {
        html.push_str(&format!("<th>{}</th>", escape(column)));
    }
    html.push_str("</tr></thead>\n<tbody>\n");
    for row in &table.rows {
        html.push_str("<tr>");
        for cell in row {
            html.push_str(&format!("<td>{}</td>", escape(cell)));
        }
        html.push_str("</tr>\n");
    }
    html.push_str("</tbody>\n</table>\n");
    html
}

fn render_chart(chart: &Chart) -> String {
    // Keep the figure from closing the script element early
    let figure = chart.figure.replace("</", "<\\/");
    format!(
        concat!(
            "<div id=\"{id}\" class=\"chart\"></div>\n",
            "<script>(function() {{ var figure = {figure}; ",
            "Plotly.newPlot(\"{id}\", figure.data, figure.layout, figure.config || {{}}); }})();</script>\n"
        ),
        id = escape(&chart.id),
        figure = figure
    )
}

/// Escapes text for use in element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
