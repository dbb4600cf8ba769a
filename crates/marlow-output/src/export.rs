//! Export functionality for Marlow result tables.
//!
//! Writes the analytics output tables (RFM, ABC, elasticity, KPI views) to
//! CSV or JSON files, and the run summary as typed records.

use crate::summary::PipelineSummary;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error.
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// Writes result tables and summaries in a fixed format.
#[derive(Debug, Clone, Copy)]
pub struct Exporter {
    format: ExportFormat,
}

impl Exporter {
    /// Create an exporter for the given format.
    ///
    /// # Examples
    ///
    /// ```
    /// use marlow_output::{ExportFormat, Exporter};
    ///
    /// let exporter = Exporter::new(ExportFormat::Csv);
    /// assert_eq!(exporter.file_name("rfm"), "rfm.csv");
    /// ```
    pub const fn new(format: ExportFormat) -> Self {
        Self { format }
    }

    /// The configured format.
    pub const fn format(&self) -> ExportFormat {
        self.format
    }

    /// File name for a table stem under this format.
    pub fn file_name(&self, stem: &str) -> String {
        format!("{stem}.{}", self.format.extension())
    }

    /// Write a result table to `path`.
    pub fn write_frame(&self, frame: &DataFrame, path: &Path) -> Result<(), ExportError> {
        let mut frame = frame.clone();
        let mut file = File::create(path)?;

        match self.format {
            ExportFormat::Csv => {
                CsvWriter::new(&mut file)
                    .include_header(true)
                    .finish(&mut frame)?;
            }
            ExportFormat::Json => {
                JsonWriter::new(&mut file)
                    .with_json_format(JsonFormat::Json)
                    .finish(&mut frame)?;
            }
            ExportFormat::PrettyJson => {
                let mut buffer = Vec::new();
                JsonWriter::new(&mut buffer)
                    .with_json_format(JsonFormat::Json)
                    .finish(&mut frame)?;
                let value: serde_json::Value = serde_json::from_slice(&buffer)?;
                serde_json::to_writer_pretty(&mut file, &value)?;
            }
        }

        Ok(())
    }

    /// Write the run summary to `path`.
    ///
    /// CSV output is a two-column metric/value table; JSON output is the
    /// full summary object.
    pub fn write_summary(
        &self,
        summary: &PipelineSummary,
        path: &Path,
    ) -> Result<(), ExportError> {
        match self.format {
            ExportFormat::Csv => {
                let mut writer = csv::Writer::from_path(path)?;
                for record in summary.to_records() {
                    writer.serialize(record)?;
                }
                writer.flush()?;
            }
            ExportFormat::Json => {
                let file = File::create(path)?;
                serde_json::to_writer(file, summary)?;
            }
            ExportFormat::PrettyJson => {
                let file = File::create(path)?;
                serde_json::to_writer_pretty(file, summary)?;
            }
        }
        Ok(())
    }
}
