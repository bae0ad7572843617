use common::{Horizon, Ticker};

pub fn tickers() {
    for ticker in Ticker::ALL {
        println!("{}", ticker.symbol());
    }
    println!(
        "months of prediction: {}..={} (default {})",
        Horizon::MIN_MONTHS,
        Horizon::MAX_MONTHS,
        Horizon::default().months()
    );
}
