use common::HistoricalSeries;
use plotly::common::{Line, Mode, Title};
use plotly::layout::{Axis, RangeSlider};
use plotly::{Layout, Plot, Scatter};
use tracing::{debug, instrument};

use super::{Chart, Surface, TABLE_ROWS, Table, Widget, price};

pub const RAW_COLUMNS: [&str; 7] = ["Date", "Open", "High", "Low", "Close", "Adj Close", "Volume"];

/// Shows the tail of the raw series and an open/close line chart with a range slider.
#[instrument(skip_all, fields(ticker = %series.ticker, rows = series.len()))]
pub fn render_raw<S: Surface + ?Sized>(series: &HistoricalSeries, surface: &mut S) {
    surface.push(Widget::Subheader("Raw data".to_string()));
    surface.push(Widget::Table(raw_table(series)));
    surface.push(Widget::Chart(raw_chart(series)));
    debug!("Raw data rendered");
}

pub fn raw_table(series: &HistoricalSeries) -> Table {
    let rows = series
        .tail(TABLE_ROWS)
        .iter()
        .map(|r| {
            vec![
                r.date.format("%Y-%m-%d").to_string(),
                price(r.open),
                price(r.high),
                price(r.low),
                price(r.close),
                r.adj_close.map(price).unwrap_or_default(),
                r.volume.to_string(),
            ]
        })
        .collect();

    Table {
        columns: RAW_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    }
}

pub fn raw_chart(series: &HistoricalSeries) -> Chart {
    let title = "Time Series Data with Rangeslider";
    let dates: Vec<String> = series.records.iter().map(|r| r.date.to_string()).collect();
    let opens: Vec<f64> = series.records.iter().map(|r| r.open).collect();
    let closes: Vec<f64> = series.records.iter().map(|r| r.close).collect();

    let open_trace = Scatter::new(dates.clone(), opens)
        .mode(Mode::Lines)
        .name("Stock Open")
        .line(Line::new().color("rgb(59, 130, 246)").width(1.5));
    let close_trace = Scatter::new(dates, closes)
        .mode(Mode::Lines)
        .name("Stock Close")
        .line(Line::new().color("rgb(251, 146, 60)").width(1.5));

    let layout = Layout::new()
        .title(Title::with_text(title))
        .x_axis(
            Axis::new()
                .title(Title::with_text("Date"))
                .range_slider(RangeSlider::new().visible(true)),
        )
        .y_axis(Axis::new().title(Title::with_text("Price")))
        .height(500);

    let mut plot = Plot::new();
    plot.add_trace(open_trace);
    plot.add_trace(close_trace);
    plot.set_layout(layout);

    Chart {
        id: format!("raw-chart-{}", series.ticker.symbol().to_lowercase().replace('.', "-")),
        title: title.to_string(),
        traces: vec!["Stock Open".to_string(), "Stock Close".to_string()],
        figure: plot.to_json(),
    }
}
