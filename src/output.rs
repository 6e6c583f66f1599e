//! Writing records as JSON or CSV.

use crate::error::{Error, Result};
use serde::Serialize;
use std::io::Write;
use std::str::FromStr;

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Pretty-printed JSON array
    #[default]
    Json,
    /// CSV with a header row
    Csv,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(Error::InvalidFormat(s.to_string())),
        }
    }
}

/// Write `records` to any destination implementing `Write`.
pub fn write_records<W, T>(writer: &mut W, records: &[T], format: OutputFormat) -> Result<()>
where
    W: Write,
    T: Serialize,
{
    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut *writer, records)?;
            writeln!(writer)?;
        }
        OutputFormat::Csv => {
            let mut csv_writer = csv::Writer::from_writer(writer);
            for record in records {
                csv_writer.serialize(record)?;
            }
            csv_writer.flush()?;
        }
    }
    Ok(())
}
