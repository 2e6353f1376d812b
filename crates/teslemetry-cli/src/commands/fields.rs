//! Add-field command - enable a signal on the vehicle

use anyhow::{bail, Context, Result};
use teslemetry_stream::{signals, SyncOutcome, TeslemetryStream};

use crate::output::OutputContext;

/// Enable `signal`, optionally at a fixed interval in seconds
pub async fn add_field(
    stream: &TeslemetryStream,
    signal: &str,
    interval: Option<u64>,
    ctx: &OutputContext,
) -> Result<()> {
    let vehicle = stream
        .vehicle()
        .context("A VIN is required: pass --vin or set TESLEMETRY_VIN")?;

    if signals::lookup(signal).is_none() {
        ctx.warn(&format!("{} is not a known signal", signal));
    }

    stream
        .get_config()
        .await
        .context("Failed to load vehicle configuration")?;

    let outcome = vehicle
        .add_field(signal, interval)
        .await
        .with_context(|| format!("Failed to enable {}", signal))?;

    match outcome {
        SyncOutcome::Unchanged => ctx.info(&format!("{} is already enabled", signal)),
        SyncOutcome::Flushed | SyncOutcome::Coalesced => match interval {
            Some(seconds) => ctx.success(&format!("Enabled {} every {}s", signal, seconds)),
            None => ctx.success(&format!("Enabled {}", signal)),
        },
        SyncOutcome::Unacknowledged => {
            ctx.warn(&format!("The server did not acknowledge enabling {}", signal))
        }
        SyncOutcome::Rejected(message) => bail!("Server rejected the change: {}", message),
    }

    Ok(())
}
