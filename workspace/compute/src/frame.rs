//! DataFrame shapes exchanged with the forecasting model.
//!
//! The raw series becomes a frame with the provider's column names, the training frame keeps
//! only `ds` (Date) and `y` (Float64), and a future frame is a single `ds` column.

use chrono::{Duration, NaiveDate};
use common::HistoricalSeries;
use polars::prelude::*;
use tracing::{debug, trace};

use crate::error::{ComputeError, Result};

pub const DS: &str = "ds";
pub const Y: &str = "y";

/// Days between 0001-01-01 (chrono's CE day 1) and the Unix epoch.
const UNIX_EPOCH_FROM_CE: i32 = 719_163;

/// Raw series as a DataFrame with columns Date, Open, High, Low, Close, Adj Close, Volume.
pub fn series_frame(series: &HistoricalSeries) -> Result<DataFrame> {
    let records = &series.records;

    let dates: Vec<NaiveDate> = records.iter().map(|r| r.date).collect();
    let opens: Vec<f64> = records.iter().map(|r| r.open).collect();
    let highs: Vec<f64> = records.iter().map(|r| r.high).collect();
    let lows: Vec<f64> = records.iter().map(|r| r.low).collect();
    let closes: Vec<f64> = records.iter().map(|r| r.close).collect();
    let adj_closes: Vec<Option<f64>> = records.iter().map(|r| r.adj_close).collect();
    let volumes: Vec<u64> = records.iter().map(|r| r.volume).collect();

    let df = DataFrame::new(vec![
        Series::new("Date".into(), dates).into(),
        Series::new("Open".into(), opens).into(),
        Series::new("High".into(), highs).into(),
        Series::new("Low".into(), lows).into(),
        Series::new("Close".into(), closes).into(),
        Series::new("Adj Close".into(), adj_closes).into(),
        Series::new("Volume".into(), volumes).into(),
    ])?;

    Ok(df)
}

/// Two-column training frame: Date renamed to `ds`, Close renamed to `y`.
pub fn training_frame(series: &HistoricalSeries) -> Result<DataFrame> {
    let mut df = series_frame(series)?.select(["Date", "Close"])?;
    df.rename("Date", DS.into())?;
    df.rename("Close", Y.into())?;

    debug!("Training frame for {} has {} rows", series.ticker, df.height());
    Ok(df)
}

/// Observations extracted from a training frame, sorted by date.
#[derive(Debug, Clone, PartialEq)]
pub struct Observations {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl Observations {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Reads `ds`/`y` from a training frame.
///
/// Rows where either column is null are dropped. A `y` column that is not numeric, or that
/// holds NaN or infinite values, is rejected.
pub fn read_training(df: &DataFrame) -> Result<Observations> {
    let dates = read_dates(df, DS)?;

    let column = df.column(Y)?;
    if !is_numeric(column.dtype()) {
        return Err(ComputeError::NonNumeric {
            column: Y.to_string(),
            detail: format!("dtype {}", column.dtype()),
        });
    }

    let values = column.as_materialized_series().cast(&DataType::Float64)?;
    let values = values.f64()?;

    let mut rows: Vec<(NaiveDate, f64)> = Vec::with_capacity(df.height());
    for (date, value) in dates.into_iter().zip(values.into_iter()) {
        let (Some(date), Some(value)) = (date, value) else {
            trace!("Dropping row with a null field");
            continue;
        };
        if !value.is_finite() {
            return Err(ComputeError::NonNumeric {
                column: Y.to_string(),
                detail: format!("{} on {}", value, date),
            });
        }
        rows.push((date, value));
    }

    rows.sort_by_key(|(date, _)| *date);
    let (dates, values) = rows.into_iter().unzip();
    Ok(Observations { dates, values })
}

/// Single `ds` column: the given history dates followed by `periods` consecutive days.
pub fn future_frame(history: &[NaiveDate], periods: usize) -> Result<DataFrame> {
    let Some(last) = history.last().copied() else {
        return Err(ComputeError::InsufficientData {
            required: 1,
            actual: 0,
        });
    };

    let mut dates = history.to_vec();
    dates.extend((1..=periods as i64).map(|offset| last + Duration::days(offset)));

    let df = DataFrame::new(vec![Series::new(DS.into(), dates).into()])?;
    Ok(df)
}

/// Reads a Date column, keeping nulls as `None`.
pub fn read_dates(df: &DataFrame, name: &str) -> Result<Vec<Option<NaiveDate>>> {
    let column = df.column(name)?;
    if column.dtype() != &DataType::Date {
        return Err(ComputeError::Date(format!(
            "column '{}' has dtype {}, expected date",
            name,
            column.dtype()
        )));
    }

    let mut dates = Vec::with_capacity(column.len());
    for i in 0..column.len() {
        let date = match column.get(i)? {
            AnyValue::Date(days) => Some(date_from_epoch_days(days)?),
            AnyValue::Null => None,
            other => {
                return Err(ComputeError::Date(format!("unexpected value {} in '{}'", other, name)));
            }
        };
        dates.push(date);
    }

    Ok(dates)
}

fn date_from_epoch_days(days: i32) -> Result<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + UNIX_EPOCH_FROM_CE)
        .ok_or_else(|| ComputeError::Date(format!("day {} out of range", days)))
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float64
            | DataType::Float32
            | DataType::Int64
            | DataType::Int32
            | DataType::Int16
            | DataType::Int8
            | DataType::UInt64
            | DataType::UInt32
            | DataType::UInt16
            | DataType::UInt8
    )
}
