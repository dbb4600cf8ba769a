//! Canonical transaction-table schema.
//!
//! Column names follow the upstream retail dataset and are shared by every
//! crate in the workspace so that transforms agree on their interfaces
//! without stringly-typed drift.

use crate::transform::{Result, TransformError};
use polars::prelude::*;

/// Invoice identifier column.
pub const INVOICE: &str = "Invoice";
/// Product stock code column.
pub const STOCK_CODE: &str = "StockCode";
/// Product description column.
pub const DESCRIPTION: &str = "Description";
/// Signed line quantity column (negative = return/cancellation).
pub const QUANTITY: &str = "Quantity";
/// Non-negative unit price column.
pub const PRICE: &str = "Price";
/// Nullable customer identifier column.
pub const CUSTOMER_ID: &str = "Customer ID";
/// Transaction timestamp column.
pub const INVOICE_DATE: &str = "InvoiceDate";
/// Customer country column.
pub const COUNTRY: &str = "Country";
/// Line revenue column (`Quantity * Price`), derived when absent.
pub const TOTAL_SUM: &str = "TotalSum";

/// Days since the customer's latest invoice, relative to the reference date.
pub const RECENCY: &str = "Recency";
/// Distinct invoice count per customer.
pub const FREQUENCY: &str = "Frequency";
/// Summed line revenue per customer.
pub const MONETARY: &str = "Monetary";
/// Cancellation events per customer, 0 when none.
pub const CANCELLATION_COUNT: &str = "CancellationCount";

/// Running revenue total across the descending product ranking.
pub const CUMULATIVE_REVENUE: &str = "CumulativeRevenue";
/// Cumulative revenue share in percent.
pub const REVENUE_SHARE_PCT: &str = "Revenue_Share_Pct";
/// Pareto tier label, one of `A`, `B`, `C`.
pub const ABC_CLASS: &str = "ABC_Class";

/// Calendar year derived from the timestamp.
pub const YEAR: &str = "Year";
/// Calendar month (1-12).
pub const MONTH: &str = "Month";
/// Day of month (1-31).
pub const DAY: &str = "Day";
/// Hour of day (0-23).
pub const HOUR: &str = "Hour";
/// Day-of-week index, 0=Monday through 6=Sunday.
pub const DAY_OF_WEEK: &str = "DayOfWeek";
/// English weekday name derived from [`DAY_OF_WEEK`].
pub const DAY_NAME: &str = "DayName";
/// Saturday/Sunday flag.
pub const IS_WEEKEND: &str = "IsWeekend";
/// First-day-of-month flag.
pub const IS_MONTH_START: &str = "IsMonthStart";
/// Last-day-of-month flag.
pub const IS_MONTH_END: &str = "IsMonthEnd";
/// Shift bucket derived from the hour.
pub const DAY_PART: &str = "DayPart";

/// Percent change in quantity between successive price points.
pub const PCT_CHANGE_Q: &str = "Pct_Change_Q";
/// Percent change in price between successive price points.
pub const PCT_CHANGE_P: &str = "Pct_Change_P";
/// Quantity/price percent-change ratio.
pub const ELASTICITY: &str = "Elasticity";

/// Whether the table has a column with the given name.
pub fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

/// Check that every required column is present, naming the transform in the
/// error when one is not.
pub fn ensure_columns(df: &DataFrame, required: &[&str], transform: &'static str) -> Result<()> {
    for column in required {
        if !has_column(df, column) {
            return Err(TransformError::MissingColumn {
                column: (*column).to_string(),
                transform,
            });
        }
    }
    Ok(())
}

/// Check that line revenue is present or derivable from quantity and price.
pub fn ensure_revenue(df: &DataFrame, transform: &'static str) -> Result<()> {
    if has_column(df, TOTAL_SUM) {
        return Ok(());
    }
    ensure_columns(df, &[QUANTITY, PRICE], transform)
}

/// Start a lazy plan over the table with the line-revenue column guaranteed.
///
/// Keeps an existing `TotalSum` column untouched; otherwise derives it as
/// `Quantity * Price`. Callers validate presence of the source columns via
/// [`ensure_revenue`] first.
pub fn with_line_revenue(df: &DataFrame) -> LazyFrame {
    let lf = df.clone().lazy();
    if has_column(df, TOTAL_SUM) {
        lf
    } else {
        lf.with_column(
            (col(QUANTITY).cast(DataType::Float64) * col(PRICE).cast(DataType::Float64))
                .alias(TOTAL_SUM),
        )
    }
}
