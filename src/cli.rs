use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

use commands::{forecast, serve, tickers};

#[derive(Parser)]
#[command(name = "stockcast")]
#[command(about = "Stock price forecasting dashboard with CLI tools and web server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server
    Serve {
        /// Configuration file (TOML, YAML or JSON)
        ///
        /// Defaults to `stockcast.toml` in the working directory when present.
        #[arg(short, long, env = "STOCKCAST_CONFIG")]
        config: Option<PathBuf>,

        /// Bind address for the web server, overriding `server.bind_address`
        ///
        /// Format: IP:PORT (e.g., 0.0.0.0:3000, 127.0.0.1:8080)
        #[arg(short, long, env = "BIND_ADDRESS")]
        bind_address: Option<String>,
    },
    /// Run one forecast and print the tables to stdout
    ///
    /// Examples:
    ///   stockcast forecast --ticker AAPL --months 3
    ///   stockcast forecast -t AKBNK.IS
    Forecast {
        /// Ticker symbol: GOOG, AAPL, MSFT, GME or AKBNK.IS
        #[arg(short, long, default_value = "GOOG")]
        ticker: String,

        /// Months of prediction (1 to 5)
        #[arg(short, long, default_value_t = 1)]
        months: u32,

        /// Configuration file (TOML, YAML or JSON)
        #[arg(short, long, env = "STOCKCAST_CONFIG")]
        config: Option<PathBuf>,
    },
    /// List the tickers offered for prediction
    Tickers,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Serve { config, bind_address } => {
                serve(config.as_deref(), bind_address.as_deref()).await?;
            }
            Commands::Forecast { ticker, months, config } => {
                forecast(&ticker, months, config.as_deref()).await?;
            }
            Commands::Tickers => {
                tickers();
            }
        }
        Ok(())
    }
}
