//! `tanzu telemetry` commands.

use anyhow::{Context, Result};
use tanzu_core::{CliConfig, MetricsDb, TelemetryClient};

/// Print CEIP participation, CLI id and the number of stored metrics.
pub fn status(config: &CliConfig, metrics_db: &MetricsDb) -> Result<()> {
    let ceip = match config.ceip_opt_in {
        Some(true) => "opted in",
        Some(false) => "opted out",
        None => "not set",
    };
    let rows = metrics_db
        .get_row_count()
        .context("Failed to count stored metrics")?;

    println!("CEIP participation: {ceip}");
    println!("CLI id: {}", config.cli_id.as_deref().unwrap_or("-"));
    println!("Metrics database: {}", metrics_db.db_path().display());
    println!("Stored metrics: {rows}");
    Ok(())
}

/// Delete all stored metrics.
pub fn clear(metrics_db: &MetricsDb) -> Result<()> {
    metrics_db
        .clear_metric_data()
        .context("Failed to clear stored metrics")?;
    println!("Stored metrics cleared.");
    Ok(())
}

/// Hand stored metrics to the collector plugin now.
pub async fn send(client: &TelemetryClient) -> Result<()> {
    client
        .send_metrics()
        .await
        .context("Failed to send metrics")?;
    Ok(())
}
