pub mod forecast;
pub mod serve;
pub mod tickers;

pub use forecast::forecast;
pub use serve::serve;
pub use tickers::tickers;
