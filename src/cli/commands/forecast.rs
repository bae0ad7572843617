use anyhow::{Result, bail};
use common::Selection;
use std::path::Path;
use tracing::{debug, info, trace};

use crate::config::{AppConfig, build_dashboard};
use crate::pipeline::{Dashboard, RunOutcome};
use crate::render::terminal::TerminalSurface;

/// Runs the dashboard once for `ticker` and prints every table to stdout.
pub async fn forecast(ticker: &str, months: u32, config_path: Option<&Path>) -> Result<()> {
    trace!("Entering forecast command");

    let selection = Selection::parse(Some(ticker), Some(months))?;
    let config = AppConfig::load(config_path)?;
    let dashboard = build_dashboard(&config)?;

    let output = run_once(&dashboard, selection).await?;
    print!("{}", output);
    Ok(())
}

/// Runs one selection through the dashboard and returns what the terminal surface collected.
/// A failed run is an error, after its output has been logged.
pub async fn run_once(dashboard: &Dashboard, selection: Selection) -> Result<String> {
    debug!("Running {} for {} months", selection.ticker, selection.horizon.months());
    let mut surface = TerminalSurface::new();
    let report = dashboard.run(selection, &mut surface).await;

    match report.outcome {
        RunOutcome::Rendered { forecast_rows, .. } => {
            info!("Forecast for {} finished with {} rows", selection.ticker, forecast_rows);
            Ok(surface.output().to_string())
        }
        RunOutcome::Failed(e) => {
            eprint!("{}", surface.output());
            bail!(e)
        }
    }
}
