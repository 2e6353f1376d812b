//! Signals command - list the known telemetry signals

use teslemetry_stream::signals::{ValueKind, SIGNALS};

use crate::output::{OutputContext, SignalRow};

/// List known signals, optionally only those whose name contains `filter`
pub fn signals(filter: Option<&str>, ctx: &OutputContext) {
    let needle = filter.map(str::to_lowercase);

    let rows: Vec<SignalRow> = SIGNALS
        .iter()
        .filter(|spec| match &needle {
            Some(needle) => spec.name.to_lowercase().contains(needle),
            None => true,
        })
        .map(|spec| SignalRow {
            name: spec.name.to_string(),
            kind: spec.kind.name().to_string(),
            values: match spec.kind {
                ValueKind::Enum(table) => table.options.join(", "),
                _ => String::new(),
            },
        })
        .collect();

    ctx.print(&rows);
}
