//! CSV export for run histories and zone outage tables.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::error::Result;
use crate::sim::SimulationResult;

/// Exports the node status history to a CSV file.
///
/// One row per hour; the first column is the hour index and each following
/// column is a node id in catalog order, holding `operational` or `failed`.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn export_history_csv(result: &SimulationResult, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_history_csv(result, io::BufWriter::new(file))
}

/// Writes the node status history as CSV to any writer.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_history_csv(result: &SimulationResult, writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    let mut header = vec!["hour"];
    header.extend(result.node_status_history.keys().map(String::as_str));
    wtr.write_record(&header)?;

    let hours = result
        .node_status_history
        .values()
        .map(Vec::len)
        .max()
        .unwrap_or(0);
    for t in 0..hours {
        let mut row = vec![t.to_string()];
        row.extend(
            result
                .node_status_history
                .values()
                .map(|h| h.get(t).map_or("", |s| s.as_str()).to_string()),
        );
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports the per-zone outage table to a CSV file.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn export_outage_csv(result: &SimulationResult, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_outage_csv(result, io::BufWriter::new(file))
}

/// Writes `zone_id,outage_hours` rows in catalog order.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_outage_csv(result: &SimulationResult, writer: impl Write) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(["zone_id", "outage_hours"])?;
    for (zone, hours) in &result.outage_by_zone {
        wtr.write_record([zone.as_str(), hours.to_string().as_str()])?;
    }
    wtr.flush()?;
    Ok(())
}
