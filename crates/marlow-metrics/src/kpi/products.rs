//! Product performance KPIs: revenue, volume and pricing rankings.
//!
//! All rankings group by stock code and exclude the non-product codes
//! (postage, adjustments, bank charges) configured on [`KpiConfig`].

use super::KpiConfig;
use marlow_core::schema::{self, DESCRIPTION, PRICE, QUANTITY, STOCK_CODE, TOTAL_SUM};
use marlow_core::Result;
use polars::prelude::*;

const NAME: &str = "kpi_products";

fn product_rows(config: &KpiConfig) -> Expr {
    let codes = Series::new(
        "excluded_codes".into(),
        config.excluded_stock_codes.clone(),
    );
    col(STOCK_CODE).is_in(lit(codes)).not()
}

fn ranked_products(
    transactions: &DataFrame,
    config: &KpiConfig,
    aggregates: Vec<Expr>,
    order_by: &str,
    n: usize,
) -> Result<LazyFrame> {
    schema::ensure_columns(transactions, &[STOCK_CODE, DESCRIPTION], NAME)?;
    schema::ensure_revenue(transactions, NAME)?;

    let mut exprs = vec![col(DESCRIPTION).first().alias(DESCRIPTION)];
    exprs.extend(aggregates);

    Ok(schema::with_line_revenue(transactions)
        .filter(product_rows(config))
        .group_by_stable([col(STOCK_CODE)])
        .agg(exprs)
        .sort(
            [order_by],
            SortMultipleOptions::default()
                .with_order_descending(true)
                .with_maintain_order(true),
        )
        .limit(n as IdxSize))
}

/// Top `n` products by total revenue.
pub fn top_products_by_revenue(
    transactions: &DataFrame,
    config: &KpiConfig,
    n: usize,
) -> Result<DataFrame> {
    Ok(ranked_products(
        transactions,
        config,
        vec![col(TOTAL_SUM).sum().alias("TotalRevenue")],
        "TotalRevenue",
        n,
    )?
    .select([col(DESCRIPTION), col("TotalRevenue")])
    .collect()?)
}

/// Top `n` products by shipped quantity.
pub fn top_products_by_quantity(
    transactions: &DataFrame,
    config: &KpiConfig,
    n: usize,
) -> Result<DataFrame> {
    Ok(ranked_products(
        transactions,
        config,
        vec![col(QUANTITY).sum().cast(DataType::Int64).alias("TotalQuantity")],
        "TotalQuantity",
        n,
    )?
    .select([col(DESCRIPTION), col("TotalQuantity")])
    .collect()?)
}

/// Combined revenue/quantity view for the top `n` products by revenue,
/// used for strategic positioning (high revenue vs. high volume).
pub fn product_matrix(
    transactions: &DataFrame,
    config: &KpiConfig,
    n: usize,
) -> Result<DataFrame> {
    Ok(ranked_products(
        transactions,
        config,
        vec![
            col(TOTAL_SUM).sum().alias("TotalRevenue"),
            col(QUANTITY).sum().cast(DataType::Int64).alias("TotalQuantity"),
        ],
        "TotalRevenue",
        n,
    )?
    .select([col(DESCRIPTION), col("TotalRevenue"), col("TotalQuantity")])
    .collect()?)
}

/// Average unit price alongside total revenue for the top `n` products.
pub fn pricing_analysis(
    transactions: &DataFrame,
    config: &KpiConfig,
    n: usize,
) -> Result<DataFrame> {
    Ok(ranked_products(
        transactions,
        config,
        vec![
            col(PRICE).mean().alias("UnitPrice"),
            col(TOTAL_SUM).sum().alias("TotalRevenue"),
        ],
        "TotalRevenue",
        n,
    )?
    .select([col(DESCRIPTION), col("UnitPrice"), col("TotalRevenue")])
    .collect()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn transactions() -> DataFrame {
        df!(
            STOCK_CODE => &["85123A", "85123A", "22423", "POST", "M"],
            DESCRIPTION => &["HEART HOLDER", "HEART HOLDER", "CAKESTAND", "POSTAGE", "Manual"],
            QUANTITY => &[6i64, 4, 2, 1, 1],
            PRICE => &[2.55, 2.55, 12.75, 18.0, 100.0],
        )
        .unwrap()
    }

    #[test]
    fn test_non_product_codes_are_excluded() {
        let out = top_products_by_revenue(&transactions(), &KpiConfig::default(), 10).unwrap();

        assert_eq!(out.height(), 2);
        let names = out.column(DESCRIPTION).unwrap().str().unwrap();
        // Postage and manual adjustments outearn real products here but must
        // not appear in the ranking.
        assert_eq!(names.get(0), Some("HEART HOLDER"));
        assert_eq!(names.get(1), Some("CAKESTAND"));
    }

    #[test]
    fn test_revenue_ranking_sums_lines() {
        let out = top_products_by_revenue(&transactions(), &KpiConfig::default(), 1).unwrap();

        assert_eq!(out.height(), 1);
        let revenue = out.column("TotalRevenue").unwrap().f64().unwrap();
        assert_abs_diff_eq!(revenue.get(0).unwrap(), 25.5, epsilon = 1e-9);
    }

    #[test]
    fn test_quantity_ranking() {
        let out = top_products_by_quantity(&transactions(), &KpiConfig::default(), 10).unwrap();

        let quantities = out.column("TotalQuantity").unwrap().i64().unwrap();
        assert_eq!(quantities.get(0), Some(10));
        assert_eq!(quantities.get(1), Some(2));
    }

    #[test]
    fn test_product_matrix_carries_both_measures() {
        let out = product_matrix(&transactions(), &KpiConfig::default(), 10).unwrap();

        assert!(schema::has_column(&out, "TotalRevenue"));
        assert!(schema::has_column(&out, "TotalQuantity"));
        assert_eq!(out.height(), 2);
    }

    #[test]
    fn test_pricing_analysis_averages_unit_price() {
        let out = pricing_analysis(&transactions(), &KpiConfig::default(), 10).unwrap();

        let prices = out.column("UnitPrice").unwrap().f64().unwrap();
        assert_abs_diff_eq!(prices.get(0).unwrap(), 2.55, epsilon = 1e-9);
    }
}
