use common::{ForecastFrame, Horizon};
use compute::FittedModel;
use plotly::common::{Fill, Line, Marker, Mode, Title};
use plotly::layout::{Axis, GridPattern, LayoutGrid, RangeSlider};
use plotly::{Layout, Plot, Scatter};
use tracing::{debug, instrument};

use super::{Chart, Surface, TABLE_ROWS, Table, Widget, price};

pub const FORECAST_COLUMNS: [&str; 10] = [
    "ds",
    "trend",
    "trend_lower",
    "trend_upper",
    "weekly",
    "yearly",
    "additive_terms",
    "yhat_lower",
    "yhat_upper",
    "yhat",
];

const BAND_COLOR: &str = "rgba(0, 114, 178, 0.2)";
const LINE_COLOR: &str = "rgb(0, 114, 178)";

/// Shows the forecast table tail, the forecast chart and the components chart.
#[instrument(skip_all, fields(rows = frame.len(), months = horizon.months()))]
pub fn render_forecast<S: Surface + ?Sized>(
    model: &FittedModel,
    frame: &ForecastFrame,
    horizon: Horizon,
    surface: &mut S,
) {
    surface.push(Widget::Subheader("Forecast data".to_string()));
    surface.push(Widget::Table(forecast_table(frame)));

    surface.push(Widget::Text(format!("Forecast plot for {} months", horizon.months())));
    surface.push(Widget::Chart(forecast_chart(model, frame)));

    surface.push(Widget::Subheader("Forecast components".to_string()));
    surface.push(Widget::Chart(components_chart(model, frame)));
    debug!("Forecast rendered");
}

pub fn forecast_table(frame: &ForecastFrame) -> Table {
    let rows = frame
        .tail(TABLE_ROWS)
        .iter()
        .map(|r| {
            vec![
                r.ds.format("%Y-%m-%d").to_string(),
                price(r.trend),
                price(r.trend_lower),
                price(r.trend_upper),
                price(r.weekly),
                price(r.yearly),
                price(r.additive_terms),
                price(r.yhat_lower),
                price(r.yhat_upper),
                price(r.yhat),
            ]
        })
        .collect();

    Table {
        columns: FORECAST_COLUMNS.iter().map(|c| c.to_string()).collect(),
        rows,
    }
}

/// Actual closes as markers, the prediction as a line and the interval as a filled band.
pub fn forecast_chart(model: &FittedModel, frame: &ForecastFrame) -> Chart {
    let dates: Vec<String> = frame.rows.iter().map(|r| r.ds.to_string()).collect();
    let history: Vec<String> = model.history_dates().iter().map(|d| d.to_string()).collect();

    let actual = Scatter::new(history, model.history_values().to_vec())
        .mode(Mode::Markers)
        .name("Actual")
        .marker(Marker::new().color("black").size(3));
    let lower = Scatter::new(dates.clone(), frame.rows.iter().map(|r| r.yhat_lower).collect())
        .mode(Mode::Lines)
        .name("Lower Bound")
        .line(Line::new().width(0.0))
        .show_legend(false);
    let predicted = Scatter::new(dates.clone(), frame.rows.iter().map(|r| r.yhat).collect())
        .mode(Mode::Lines)
        .name("Predicted")
        .line(Line::new().color(LINE_COLOR).width(2.0))
        .fill(Fill::ToNextY)
        .fill_color(BAND_COLOR);
    let upper = Scatter::new(dates, frame.rows.iter().map(|r| r.yhat_upper).collect())
        .mode(Mode::Lines)
        .name("Upper Bound")
        .line(Line::new().width(0.0))
        .fill(Fill::ToNextY)
        .fill_color(BAND_COLOR)
        .show_legend(false);

    let layout = Layout::new()
        .x_axis(
            Axis::new()
                .title(Title::with_text("ds"))
                .range_slider(RangeSlider::new().visible(true)),
        )
        .y_axis(Axis::new().title(Title::with_text("y")))
        .height(600);

    let mut plot = Plot::new();
    plot.add_trace(actual);
    plot.add_trace(lower);
    plot.add_trace(predicted);
    plot.add_trace(upper);
    plot.set_layout(layout);

    Chart {
        id: "forecast-chart".to_string(),
        title: "Forecast".to_string(),
        traces: ["Actual", "Lower Bound", "Predicted", "Upper Bound"]
            .iter()
            .map(|t| t.to_string())
            .collect(),
        figure: plot.to_json(),
    }
}

/// Trend with its interval on top, then one panel per fitted seasonality.
pub fn components_chart(model: &FittedModel, frame: &ForecastFrame) -> Chart {
    let dates: Vec<String> = frame.rows.iter().map(|r| r.ds.to_string()).collect();
    let mut traces = Vec::new();
    let mut plot = Plot::new();

    plot.add_trace(
        Scatter::new(dates.clone(), frame.rows.iter().map(|r| r.trend_lower).collect())
            .mode(Mode::Lines)
            .name("trend_lower")
            .line(Line::new().width(0.0))
            .show_legend(false),
    );
    plot.add_trace(
        Scatter::new(dates.clone(), frame.rows.iter().map(|r| r.trend).collect())
            .mode(Mode::Lines)
            .name("trend")
            .line(Line::new().color(LINE_COLOR).width(2.0))
            .fill(Fill::ToNextY)
            .fill_color(BAND_COLOR),
    );
    plot.add_trace(
        Scatter::new(dates, frame.rows.iter().map(|r| r.trend_upper).collect())
            .mode(Mode::Lines)
            .name("trend_upper")
            .line(Line::new().width(0.0))
            .fill(Fill::ToNextY)
            .fill_color(BAND_COLOR)
            .show_legend(false),
    );
    traces.extend(["trend_lower", "trend", "trend_upper"].map(String::from));

    let profiles: Vec<_> = model
        .seasonalities()
        .into_iter()
        .filter_map(|name| model.seasonal_profile(name))
        .collect();

    let mut layout = Layout::new()
        .grid(
            LayoutGrid::new()
                .rows(1 + profiles.len())
                .columns(1)
                .pattern(GridPattern::Independent),
        )
        .x_axis(Axis::new().title(Title::with_text("ds")))
        .y_axis(Axis::new().title(Title::with_text("trend")))
        .show_legend(false)
        .height(300 * (1 + profiles.len()));

    for (i, profile) in profiles.iter().enumerate() {
        let axis = i + 2;
        let labels: Vec<String> = profile.points.iter().map(|p| p.label.clone()).collect();
        let values: Vec<f64> = profile.points.iter().map(|p| p.value).collect();

        plot.add_trace(
            Scatter::new(labels, values)
                .mode(Mode::Lines)
                .name(&profile.name)
                .line(Line::new().color(LINE_COLOR).width(2.0))
                .x_axis(&format!("x{}", axis))
                .y_axis(&format!("y{}", axis)),
        );
        traces.push(profile.name.clone());

        let x_axis = Axis::new().title(Title::with_text(axis_label(&profile.name)));
        let y_axis = Axis::new().title(Title::with_text(profile.name.as_str()));
        layout = match axis {
            2 => layout.x_axis2(x_axis).y_axis2(y_axis),
            _ => layout.x_axis3(x_axis).y_axis3(y_axis),
        };
    }
    plot.set_layout(layout);

    Chart {
        id: "components-chart".to_string(),
        title: "Forecast components".to_string(),
        traces,
        figure: plot.to_json(),
    }
}

fn axis_label(component: &str) -> &'static str {
    match component {
        "weekly" => "Day of week",
        _ => "Day of year",
    }
}
