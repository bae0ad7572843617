use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Rejected user input. The dashboard only offers valid values, so this mostly
/// shows up on hand-written API calls.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Unsupported ticker: {0}")]
    UnknownTicker(String),

    #[error("Months of prediction must be between {min} and {max}, got {got}")]
    MonthsOutOfRange { min: u32, max: u32, got: u32 },
}

/// One of the securities offered by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
pub enum Ticker {
    #[serde(rename = "GOOG")]
    Goog,
    #[serde(rename = "AAPL")]
    Aapl,
    #[serde(rename = "MSFT")]
    Msft,
    #[serde(rename = "GME")]
    Gme,
    #[serde(rename = "AKBNK.IS")]
    AkbnkIs,
}

impl Ticker {
    /// All supported tickers, in the order the select list shows them.
    pub const ALL: [Ticker; 5] = [
        Ticker::Goog,
        Ticker::Aapl,
        Ticker::Msft,
        Ticker::Gme,
        Ticker::AkbnkIs,
    ];

    /// Exchange symbol understood by the market data source.
    pub fn symbol(&self) -> &'static str {
        match self {
            Ticker::Goog => "GOOG",
            Ticker::Aapl => "AAPL",
            Ticker::Msft => "MSFT",
            Ticker::Gme => "GME",
            Ticker::AkbnkIs => "AKBNK.IS",
        }
    }

    pub fn symbols() -> Vec<&'static str> {
        Self::ALL.iter().map(Ticker::symbol).collect()
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Ticker::ALL[0]
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Ticker {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|ticker| ticker.symbol().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| SelectionError::UnknownTicker(s.to_string()))
    }
}

/// Forecast horizon expressed as a month count; a month is always 30 calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Horizon {
    months: u32,
}

impl Horizon {
    pub const MIN_MONTHS: u32 = 1;
    pub const MAX_MONTHS: u32 = 5;
    pub const DAYS_PER_MONTH: u32 = 30;

    pub fn from_months(months: u32) -> Result<Self, SelectionError> {
        if !(Self::MIN_MONTHS..=Self::MAX_MONTHS).contains(&months) {
            return Err(SelectionError::MonthsOutOfRange {
                min: Self::MIN_MONTHS,
                max: Self::MAX_MONTHS,
                got: months,
            });
        }
        Ok(Self { months })
    }

    pub fn months(&self) -> u32 {
        self.months
    }

    /// Number of calendar days the forecast extends past the last observation.
    pub fn days(&self) -> u32 {
        self.months * Self::DAYS_PER_MONTH
    }

    /// Every month count the slider allows.
    pub fn allowed_months() -> Vec<u32> {
        (Self::MIN_MONTHS..=Self::MAX_MONTHS).collect()
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Self {
            months: Self::MIN_MONTHS,
        }
    }
}

impl TryFrom<u32> for Horizon {
    type Error = SelectionError;

    fn try_from(months: u32) -> Result<Self, Self::Error> {
        Self::from_months(months)
    }
}

impl From<Horizon> for u32 {
    fn from(horizon: Horizon) -> Self {
        horizon.months
    }
}

/// The two user inputs of one dashboard run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Selection {
    pub ticker: Ticker,
    pub horizon: Horizon,
}

impl Selection {
    pub fn new(ticker: Ticker, horizon: Horizon) -> Self {
        Self { ticker, horizon }
    }

    /// Builds a selection from raw inputs, falling back to the dashboard defaults
    /// (first ticker, one month) for missing values.
    pub fn parse(ticker: Option<&str>, months: Option<u32>) -> Result<Self, SelectionError> {
        let ticker = match ticker {
            Some(symbol) => symbol.parse()?,
            None => Ticker::default(),
        };
        let horizon = match months {
            Some(months) => Horizon::from_months(months)?,
            None => Horizon::default(),
        };
        Ok(Self { ticker, horizon })
    }
}
