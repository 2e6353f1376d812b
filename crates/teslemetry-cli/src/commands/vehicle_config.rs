//! Config command - show or replace the vehicle's streaming configuration

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use teslemetry_stream::{sync, TeslemetryStream, Vehicle};

use crate::output::{FieldRow, OutputContext, OutputFormat};

fn vehicle(stream: &TeslemetryStream) -> Result<Vehicle> {
    stream
        .vehicle()
        .context("A VIN is required: pass --vin or set TESLEMETRY_VIN")
}

/// Show the enabled fields and the typed-values preference
pub async fn show_config(stream: &TeslemetryStream, ctx: &OutputContext) -> Result<()> {
    let vehicle = vehicle(stream)?;
    stream
        .get_config()
        .await
        .context("Failed to load vehicle configuration")?;

    if ctx.format == OutputFormat::Json {
        ctx.print_json(&vehicle.config().await);
        return Ok(());
    }

    let fields = vehicle.fields().await;
    let rows: Vec<FieldRow> = fields
        .keys()
        .map(|field| FieldRow {
            field: field.clone(),
            interval: sync::field_interval(&fields, field)
                .map(|seconds| seconds.to_string())
                .unwrap_or_else(|| "default".to_string()),
        })
        .collect();

    let prefer_typed = vehicle.config().await["prefer_typed"].clone();
    ctx.print_kv(&[
        ("VIN", vehicle.vin().to_string()),
        ("Server", stream.server().map(|s| s.to_string()).unwrap_or_default()),
        ("Prefer typed", prefer_typed.to_string()),
    ]);
    println!();
    ctx.print(&rows);

    Ok(())
}

/// Overwrite the configuration with a JSON document read from `path`
pub async fn replace_config(
    stream: &TeslemetryStream,
    path: &Path,
    ctx: &OutputContext,
) -> Result<()> {
    let vehicle = vehicle(stream)?;
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let document: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let response = vehicle
        .post_config(document)
        .await
        .context("Failed to replace vehicle configuration")?;

    if ctx.format == OutputFormat::Json {
        ctx.print_json(&response);
    } else {
        ctx.success(&format!("Replaced configuration of {}", vehicle.vin()));
    }
    Ok(())
}
