use crate::domain::table::Table;
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::io::Write;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

pub fn write_table<W: Write>(table: &Table, format: OutputFormat, writer: W) -> Result<()> {
    match format {
        OutputFormat::Csv => write_csv(table, writer),
        OutputFormat::Json => write_json(table, writer),
    }
}

/// Header row from column names; masked cells are empty fields.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    if !table.columns.is_empty() {
        csv_writer.write_record(table.columns.iter().map(|c| c.name.as_str()))?;
    }
    for row in &table.rows {
        csv_writer.write_record(row.iter().map(|v| v.to_string()))?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Columns, rows and provenance, without the raw response bodies.
pub fn write_json<W: Write>(table: &Table, mut writer: W) -> Result<()> {
    let document = serde_json::json!({
        "columns": table.columns,
        "rows": table.rows,
        "meta": { "url": table.meta.url },
    });
    serde_json::to_writer_pretty(&mut writer, &document)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
