//! Brazilian locale conventions used by ANBIMA documents.
//!
//! Numbers use a comma as decimal separator (`5,25`) and dates are written
//! `dd/mm/yyyy`. File names embed dates as `ddmmyyyy`.

use crate::error::{Error, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

/// Date layout of `DT_REF` and maturity attributes.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// Date layout embedded in per-day document names.
pub const COMPACT_DATE_FORMAT: &str = "%d%m%Y";

/// Parse a comma-decimal number such as `1234,56`.
pub fn parse_decimal(raw: &str) -> Result<Decimal> {
    let cleaned = raw.trim().replace(',', ".");

    Decimal::from_str(&cleaned).map_err(|_| Error::InvalidNumber(raw.to_string()))
}

/// Parse a `dd/mm/yyyy` date.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| Error::InvalidDate(raw.to_string()))
}

/// Format a date as `ddmmyyyy`.
pub fn format_compact_date(date: &NaiveDate) -> String {
    date.format(COMPACT_DATE_FORMAT).to_string()
}

/// Turn a vertex value like `0,5` into a tenor label like `0.5Y`.
///
/// The value is kept as text, only the separator changes.
pub fn tenor_label(raw: &str) -> String {
    format!("{}Y", raw.trim().replace(',', "."))
}
