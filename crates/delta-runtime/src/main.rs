//! # Delta Runtime
//!
//! Reads a subscription command from the file named by the first argument,
//! then newline-delimited deltas from stdin, and writes every delivered
//! record to stdout as a JSON line. Logs go to stderr.
//!
//! ```text
//! delta-runtime subscription.json < deltas.jsonl > records.jsonl
//! ```

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use delta_runtime::DeltaPipe;
use delta_subscriptions::EngineConfig;
use delta_telemetry::{init_logging, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(&TelemetryConfig::for_service("delta-runtime"))?;

    let path = std::env::args()
        .nth(1)
        .context("usage: delta-runtime <subscription.json>")?;
    let command = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read subscription command from {path}"))?;

    let config = EngineConfig::from_env()?;
    let linger = config.default_fixed_period;
    info!(self_context = %config.self_context, "Starting delta runtime");

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(line) = rx.recv().await {
            stdout.write_all(line.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
        stdout.flush().await
    });

    let pipe = DeltaPipe::new(config, tx)?;
    pipe.command(&command);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_no = 0u64;
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        line_no += 1;
        if let Err(e) = pipe.handle_line(&line) {
            warn!(line = line_no, error = %e, "Skipping input line");
        }
    }

    // Give open fixed windows one default period to flush.
    tokio::time::sleep(linger).await;

    let metrics = pipe.metrics();
    info!(
        lines = line_no,
        delivered = metrics.records_delivered,
        replayed = metrics.records_replayed,
        warnings = metrics.warnings_emitted,
        "Input exhausted, shutting down"
    );
    pipe.close();
    drop(pipe);

    writer.await.context("output task failed")??;
    Ok(())
}
