//! Sales trend KPIs: revenue aggregated by calendar period.

use marlow_core::schema::{self, INVOICE_DATE, TOTAL_SUM, YEAR};
use marlow_core::Result;
use polars::prelude::*;

const NAME: &str = "kpi_sales";

/// Total revenue per calendar month, keyed `YYYY-MM`, ascending.
pub fn monthly_revenue(transactions: &DataFrame) -> Result<DataFrame> {
    schema::ensure_columns(transactions, &[INVOICE_DATE], NAME)?;
    schema::ensure_revenue(transactions, NAME)?;

    Ok(schema::with_line_revenue(transactions)
        .with_column(col(INVOICE_DATE).dt().to_string("%Y-%m").alias("Month"))
        .group_by_stable([col("Month")])
        .agg([col(TOTAL_SUM).sum().alias("MonthlySales")])
        .sort(["Month"], SortMultipleOptions::default())
        .collect()?)
}

/// Total revenue per calendar year, ascending.
pub fn yearly_revenue(transactions: &DataFrame) -> Result<DataFrame> {
    schema::ensure_columns(transactions, &[INVOICE_DATE], NAME)?;
    schema::ensure_revenue(transactions, NAME)?;

    Ok(schema::with_line_revenue(transactions)
        .with_column(col(INVOICE_DATE).dt().year().alias(YEAR))
        .group_by_stable([col(YEAR)])
        .agg([col(TOTAL_SUM).sum().alias("TotalSales")])
        .sort([YEAR], SortMultipleOptions::default())
        .collect()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn transactions() -> DataFrame {
        let at = |y: i32, m: u32, d: u32| {
            NaiveDate::from_ymd_opt(y, m, d)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap()
        };
        df!(
            INVOICE_DATE => &[at(2010, 12, 5), at(2011, 1, 10), at(2011, 1, 25), at(2011, 2, 1)],
            "Quantity" => &[1i64, 2, 3, 4],
            "Price" => &[10.0, 10.0, 10.0, 10.0],
        )
        .unwrap()
    }

    #[test]
    fn test_monthly_revenue_groups_and_sorts() {
        let out = monthly_revenue(&transactions()).unwrap();
        assert_eq!(out.height(), 3);

        let months = out.column("Month").unwrap().str().unwrap();
        assert_eq!(months.get(0), Some("2010-12"));
        assert_eq!(months.get(1), Some("2011-01"));

        let sales = out.column("MonthlySales").unwrap().f64().unwrap();
        assert_abs_diff_eq!(sales.get(1).unwrap(), 50.0);
    }

    #[test]
    fn test_yearly_revenue_totals() {
        let out = yearly_revenue(&transactions()).unwrap();
        assert_eq!(out.height(), 2);

        let sales = out.column("TotalSales").unwrap().f64().unwrap();
        assert_abs_diff_eq!(sales.get(0).unwrap(), 10.0);
        assert_abs_diff_eq!(sales.get(1).unwrap(), 90.0);
    }
}
