//! Monitor command - real-time telemetry streaming

use anyhow::{Context, Result};
use futures::future::join_all;
use futures::StreamExt;
use serde_json::json;
use teslemetry_stream::{signals, Event, SignalValue, TeslemetryStream};

use crate::output::{format_json_value, OutputContext, OutputFormat};

/// Monitor signals of the configured vehicle, or every event when no signal
/// is given
pub async fn monitor(
    stream: &TeslemetryStream,
    names: &[String],
    interval: Option<u64>,
    ctx: &OutputContext,
) -> Result<()> {
    if names.is_empty() {
        return monitor_events(stream, ctx).await;
    }

    let vehicle = stream
        .vehicle()
        .context("Monitoring signals needs a VIN: pass --vin or set TESLEMETRY_VIN")?;
    stream
        .get_config()
        .await
        .context("Failed to load vehicle configuration")?;

    for signal in names {
        if signals::lookup(signal).is_none() {
            ctx.warn(&format!("{} is not a known signal, showing raw values", signal));
        }
    }

    // One debounced write for all of them
    if let Some(seconds) = interval {
        let results = join_all(
            names
                .iter()
                .map(|signal| vehicle.add_field(signal, Some(seconds))),
        )
        .await;
        for (signal, result) in names.iter().zip(results) {
            result.with_context(|| format!("Failed to enable {}", signal))?;
        }
    }

    ctx.info(&format!("Monitoring {} signal(s) of {}...", names.len(), vehicle.vin()));
    ctx.info("Press Ctrl+C to stop");

    let format = ctx.format;
    let disposers: Vec<_> = names
        .iter()
        .map(|signal| {
            let name = signal.clone();
            vehicle.listen(signal, move |value| print_signal(&name, value.as_ref(), format))
        })
        .collect();

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    ctx.info("\nStopping stream...");
    for disposer in disposers {
        disposer.dispose();
    }
    stream.close();
    ctx.success("Stream stopped");

    Ok(())
}

/// Print every event as it arrives
async fn monitor_events(stream: &TeslemetryStream, ctx: &OutputContext) -> Result<()> {
    ctx.info("Monitoring all events...");
    ctx.info("Press Ctrl+C to stop");

    let events = stream.events().into_stream();
    tokio::pin!(events);

    loop {
        tokio::select! {
            event = events.next() => match event {
                Some(event) => print_event(&event, ctx.format),
                None => {
                    ctx.warn("Stream ended");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                ctx.info("\nStopping stream...");
                break;
            }
        }
    }

    Ok(())
}

fn print_signal(signal: &str, value: Option<&SignalValue>, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let value = value.map_or_else(|| "-".to_string(), |v| v.to_string());
            println!("{} = {}", signal, value);
        }
        OutputFormat::Json => {
            println!("{}", json!({ "signal": signal, "value": value }));
        }
    }
}

fn print_event(event: &Event, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let prefix = format!(
                "[{}] {}",
                event.created_at().unwrap_or("-"),
                event.vin().unwrap_or("-")
            );
            match (event.data(), event.kind()) {
                (Some(data), _) => {
                    for (signal, value) in data {
                        println!("{}: {} = {}", prefix, signal, format_json_value(value));
                    }
                }
                (None, Some(kind)) => {
                    let value = event.get(kind.key()).map(format_json_value).unwrap_or_default();
                    println!("{}: {} {}", prefix, kind.key(), value);
                }
                (None, None) => println!("{}: {}", prefix, event),
            }
        }
        OutputFormat::Json => println!("{}", event),
    }
}
