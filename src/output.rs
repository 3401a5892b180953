use std::io::Write;
use crate::analytics::aggregate::AggregateRow;
use crate::analytics::chart::ChartPayload;
use crate::error::ProgressError;

/// Aligned text table of the selected family's two panel values
pub fn write_table<W: Write>(out: &mut W, payload: &ChartPayload) -> Result<(), ProgressError> {
    let family = payload.query.metric;
    writeln!(
        out,
        "{:<16}{:<12}{:>10}{:>18}{:>14}",
        payload.x_field,
        payload.color_field,
        "Sessions",
        family.average_column(),
        family.metric_field().column_name()
    )?;
    for row in &payload.rows {
        writeln!(
            out,
            "{:<16}{:<12}{:>10}{:>18.2}{:>14.2}",
            row.period_start.format("%Y-%m-%d").to_string(),
            row.group_key,
            row.sessions,
            row.moving_average(family),
            row.raw_ratio(family)
        )?;
    }
    if payload.rows.is_empty() {
        writeln!(out, "(no sessions)")?;
    }
    Ok(())
}

/// All aggregate columns, one CSV line per row
pub fn write_csv<W: Write>(out: W, rows: &[AggregateRow]) -> Result<(), ProgressError> {
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(out: &mut W, payload: &ChartPayload) -> Result<(), ProgressError> {
    serde_json::to_writer_pretty(&mut *out, payload)?;
    writeln!(out)?;
    Ok(())
}
