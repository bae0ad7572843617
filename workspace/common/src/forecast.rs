use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One predicted day. Column names follow the usual forecasting-library convention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ForecastRow {
    pub ds: NaiveDate,
    pub trend: f64,
    pub trend_lower: f64,
    pub trend_upper: f64,
    /// Weekly seasonal term, 0 when weekly seasonality is disabled
    pub weekly: f64,
    /// Yearly seasonal term, 0 when yearly seasonality is disabled
    pub yearly: f64,
    /// Sum of all seasonal terms
    pub additive_terms: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
    pub yhat: f64,
}

/// Prediction over the training dates followed by the future horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ForecastFrame {
    pub rows: Vec<ForecastRow>,
    /// How many leading rows fall on training dates
    pub history_len: usize,
}

impl ForecastFrame {
    pub fn new(rows: Vec<ForecastRow>, history_len: usize) -> Self {
        Self { rows, history_len }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.rows.first().map(|r| r.ds)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.ds)
    }

    pub fn tail(&self, n: usize) -> &[ForecastRow] {
        let start = self.rows.len().saturating_sub(n);
        &self.rows[start..]
    }

    /// Rows past the last training date.
    pub fn future_rows(&self) -> &[ForecastRow] {
        &self.rows[self.history_len.min(self.rows.len())..]
    }

    pub fn tail_frame(&self, n: usize) -> ForecastFrame {
        let rows = self.tail(n).to_vec();
        let history_len = rows.len().saturating_sub(self.future_rows().len());
        ForecastFrame { rows, history_len }
    }
}

/// A point of a seasonal profile, labelled for display ("Monday", "March 14", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProfilePoint {
    pub label: String,
    pub value: f64,
}

/// Shape of one seasonal component over a single cycle, in price units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ComponentProfile {
    pub name: String,
    pub points: Vec<ProfilePoint>,
}
