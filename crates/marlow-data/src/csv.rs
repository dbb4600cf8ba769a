//! CSV ingestion for raw retail exports.

use crate::error::Result;
use polars::prelude::*;
use std::path::Path;
use tracing::debug;

/// Read a transaction CSV export into a DataFrame.
///
/// Headers are expected to match the canonical schema
/// (`Invoice`, `StockCode`, `Description`, `Quantity`, `Price`,
/// `Customer ID`, `InvoiceDate`, `Country`). Timestamp-looking columns are
/// parsed during the read; anything the reader cannot coerce stays a string
/// column for the time-feature stage to validate strictly.
pub fn read_transactions_csv(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(1000))
        .with_parse_options(CsvParseOptions::default().with_try_parse_dates(true))
        .try_into_reader_with_file_path(Some(path.into()))?
        .finish()?;

    debug!(path = %path.display(), rows = df.height(), "read transaction csv");
    Ok(df)
}
