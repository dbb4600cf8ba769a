//! Report generation for Marlow analytics runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A report over one analyzed dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Dataset being analyzed.
    pub dataset: String,

    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,

    /// Number of transaction rows analyzed.
    pub rows: usize,

    /// Report contents (JSON format).
    pub contents: serde_json::Value,
}

impl Report {
    /// Create a new report.
    pub fn new(dataset: String, rows: usize, contents: serde_json::Value) -> Self {
        Self {
            dataset,
            timestamp: Utc::now(),
            rows,
            contents,
        }
    }

    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Builder for creating reports.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    dataset: Option<String>,
    rows: Option<usize>,
    contents: Option<serde_json::Value>,
}

impl ReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the dataset name.
    pub fn dataset(mut self, dataset: String) -> Self {
        self.dataset = Some(dataset);
        self
    }

    /// Set the analyzed row count.
    pub const fn rows(mut self, rows: usize) -> Self {
        self.rows = Some(rows);
        self
    }

    /// Set the report contents.
    pub fn contents(mut self, contents: serde_json::Value) -> Self {
        self.contents = Some(contents);
        self
    }

    /// Build the report.
    pub fn build(self) -> Result<Report, ReportError> {
        Ok(Report::new(
            self.dataset.unwrap_or_default(),
            self.rows.unwrap_or(0),
            self.contents.unwrap_or(serde_json::Value::Null),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_creation() {
        let report = Report::new(
            "retail_vault".to_string(),
            1000,
            serde_json::json!({"customers": 120}),
        );

        assert_eq!(report.dataset, "retail_vault");
        assert_eq!(report.rows, 1000);
    }

    #[test]
    fn test_report_builder() {
        let report = ReportBuilder::new()
            .dataset("retail_vault".to_string())
            .rows(500)
            .contents(serde_json::json!({"key": "value"}))
            .build()
            .unwrap();

        assert_eq!(report.dataset, "retail_vault");
        assert_eq!(report.rows, 500);
    }

    #[test]
    fn test_report_to_json() {
        let report = Report::new("vault".to_string(), 1, serde_json::json!({}));
        let json = report.to_json().unwrap();
        assert!(json.contains("\"dataset\""));
    }
}
