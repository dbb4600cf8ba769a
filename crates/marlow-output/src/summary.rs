//! Pipeline run summary.
//!
//! Aggregates the headline numbers of one analytics run (row counts,
//! exclusions, tier sizes) for terminal display, Markdown reports and
//! metric/value export.

use chrono::NaiveDateTime;
use marlow_core::schema::ABC_CLASS;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single metric/value row of the summary, used for CSV export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    /// Metric name.
    pub metric: String,
    /// Rendered value.
    pub value: String,
}

/// Headline numbers for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PipelineSummary {
    /// Name of the analyzed dataset.
    pub dataset: String,

    /// Sales transaction rows consumed.
    pub transactions: usize,

    /// Cancellation event rows consumed.
    pub cancellation_events: usize,

    /// Rows excluded from RFM for having a null customer id.
    pub excluded_null_customers: usize,

    /// Distinct customers scored.
    pub customers: usize,

    /// Recency anchor derived from the dataset.
    pub reference_date: Option<NaiveDateTime>,

    /// Products in revenue tier A.
    pub class_a_products: usize,

    /// Products in revenue tier B.
    pub class_b_products: usize,

    /// Products in revenue tier C.
    pub class_c_products: usize,

    /// Surviving elasticity point pairs.
    pub elasticity_pairs: usize,
}

impl PipelineSummary {
    /// Flatten into metric/value rows for CSV export.
    pub fn to_records(&self) -> Vec<SummaryRecord> {
        let mut records = vec![
            SummaryRecord {
                metric: "transactions".to_string(),
                value: self.transactions.to_string(),
            },
            SummaryRecord {
                metric: "cancellation_events".to_string(),
                value: self.cancellation_events.to_string(),
            },
            SummaryRecord {
                metric: "excluded_null_customers".to_string(),
                value: self.excluded_null_customers.to_string(),
            },
            SummaryRecord {
                metric: "customers".to_string(),
                value: self.customers.to_string(),
            },
            SummaryRecord {
                metric: "class_a_products".to_string(),
                value: self.class_a_products.to_string(),
            },
            SummaryRecord {
                metric: "class_b_products".to_string(),
                value: self.class_b_products.to_string(),
            },
            SummaryRecord {
                metric: "class_c_products".to_string(),
                value: self.class_c_products.to_string(),
            },
            SummaryRecord {
                metric: "elasticity_pairs".to_string(),
                value: self.elasticity_pairs.to_string(),
            },
        ];
        if let Some(reference_date) = self.reference_date {
            records.push(SummaryRecord {
                metric: "reference_date".to_string(),
                value: reference_date.to_string(),
            });
        }
        records
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("\nRun Summary: {}\n", self.dataset));
        output.push_str(&"=".repeat(60));
        output.push('\n');

        output.push_str("\nInput:\n");
        output.push_str(&"-".repeat(60));
        output.push('\n');
        output.push_str(&format!(
            "  Sales transactions:       {}\n",
            self.transactions
        ));
        output.push_str(&format!(
            "  Cancellation events:      {}\n",
            self.cancellation_events
        ));
        output.push_str(&format!(
            "  Rows without customer id: {}\n",
            self.excluded_null_customers
        ));

        output.push_str("\nCustomers:\n");
        output.push_str(&"-".repeat(60));
        output.push('\n');
        output.push_str(&format!("  Customers scored:         {}\n", self.customers));
        if let Some(reference_date) = self.reference_date {
            output.push_str(&format!("  Reference date:           {reference_date}\n"));
        }

        output.push_str("\nInventory:\n");
        output.push_str(&"-".repeat(60));
        output.push('\n');
        output.push_str(&format!(
            "  Tier A / B / C products:  {} / {} / {}\n",
            self.class_a_products, self.class_b_products, self.class_c_products
        ));
        output.push_str(&format!(
            "  Elasticity point pairs:   {}\n",
            self.elasticity_pairs
        ));

        output.push_str(&"=".repeat(60));
        output.push('\n');

        output
    }

    /// Format as Markdown for documentation.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("# Run Summary: {}\n\n", self.dataset));
        output.push_str("| Metric | Value |\n");
        output.push_str("|--------|-------|\n");
        for record in self.to_records() {
            output.push_str(&format!("| {} | {} |\n", record.metric, record.value));
        }

        output
    }
}

impl fmt::Display for PipelineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Run Summary: {}", self.dataset)?;
        writeln!(f, "  Transactions: {}", self.transactions)?;
        writeln!(f, "  Customers: {}", self.customers)?;
        writeln!(
            f,
            "  Tiers A/B/C: {}/{}/{}",
            self.class_a_products, self.class_b_products, self.class_c_products
        )?;
        writeln!(f, "  Elasticity pairs: {}", self.elasticity_pairs)?;
        Ok(())
    }
}

/// Count products per tier in an ABC result table.
pub fn class_counts(abc: &DataFrame) -> Result<(usize, usize, usize), PolarsError> {
    let classes = abc.column(ABC_CLASS)?.str()?;
    let mut counts = (0usize, 0usize, 0usize);
    for class in classes.into_iter().flatten() {
        match class {
            "A" => counts.0 += 1,
            "B" => counts.1 += 1,
            _ => counts.2 += 1,
        }
    }
    Ok(counts)
}
