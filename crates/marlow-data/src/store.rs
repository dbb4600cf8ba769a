//! SQLite-backed transaction store.
//!
//! The store location and table names arrive via [`StoreConfig`]; nothing
//! here hardcodes a path, so the same pipeline runs against production
//! vault files, fixtures or an in-memory database.

use crate::error::{DataError, Result};
use marlow_core::schema::{
    COUNTRY, CUSTOMER_ID, DESCRIPTION, INVOICE, INVOICE_DATE, PRICE, QUANTITY, STOCK_CODE,
};
use polars::prelude::*;
use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// Timestamp format used for the `InvoiceDate` column at rest.
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Configuration for opening a transaction store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub path: PathBuf,
    /// Name of the sales transactions table (default: `transactions`).
    pub transactions_table: String,
    /// Name of the cancellations table (default: `cancellations`).
    pub cancellations_table: String,
}

impl StoreConfig {
    /// Configuration pointing at the given database file with default
    /// table names.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            transactions_table: "transactions".to_string(),
            cancellations_table: "cancellations".to_string(),
        }
    }
}

/// SQLite store for retail transaction tables.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    config: StoreConfig,
}

impl SqliteStore {
    /// Open (or create) the store at the configured location.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let conn = Connection::open(&config.path)?;
        let store = Self { conn, config };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn,
            config: StoreConfig::at(":memory:"),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    /// The active configuration.
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Initialize the database schema.
    fn initialize_schema(&self) -> Result<()> {
        for table in [
            self.config.transactions_table.as_str(),
            self.config.cancellations_table.as_str(),
        ] {
            self.conn.execute(
                &format!(
                    "CREATE TABLE IF NOT EXISTS \"{table}\" (
                        \"{INVOICE}\" TEXT NOT NULL,
                        \"{STOCK_CODE}\" TEXT NOT NULL,
                        \"{DESCRIPTION}\" TEXT,
                        \"{QUANTITY}\" INTEGER NOT NULL,
                        \"{PRICE}\" REAL NOT NULL,
                        \"{CUSTOMER_ID}\" TEXT,
                        \"{INVOICE_DATE}\" TEXT NOT NULL,
                        \"{COUNTRY}\" TEXT NOT NULL
                    )"
                ),
                [],
            )?;
        }
        Ok(())
    }

    /// Number of rows in a table.
    pub fn row_count(&self, table: &str) -> Result<i64> {
        let count = self
            .conn
            .query_row(&format!("SELECT COUNT(*) FROM \"{table}\""), [], |row| {
                row.get::<_, i64>(0)
            })?;
        Ok(count)
    }

    /// Load the sales transactions table.
    pub fn load_transactions(&self) -> Result<DataFrame> {
        self.load_table(self.config.transactions_table.as_str())
    }

    /// Load the cancellations table.
    pub fn load_cancellations(&self) -> Result<DataFrame> {
        self.load_table(self.config.cancellations_table.as_str())
    }

    /// Load one transaction-shaped table into a DataFrame.
    pub fn load_table(&self, table: &str) -> Result<DataFrame> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT \"{INVOICE}\", \"{STOCK_CODE}\", \"{DESCRIPTION}\", \"{QUANTITY}\",
                    \"{PRICE}\", \"{CUSTOMER_ID}\", \"{INVOICE_DATE}\", \"{COUNTRY}\"
             FROM \"{table}\""
        ))?;

        let mut invoices = Vec::new();
        let mut stock_codes = Vec::new();
        let mut descriptions = Vec::new();
        let mut quantities = Vec::new();
        let mut prices = Vec::new();
        let mut customers = Vec::new();
        let mut dates = Vec::new();
        let mut countries = Vec::new();

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, i64>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, String>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?;

        for row in rows {
            let (invoice, stock_code, description, quantity, price, customer, date, country) =
                row?;
            invoices.push(invoice);
            stock_codes.push(stock_code);
            descriptions.push(description);
            quantities.push(quantity);
            prices.push(price);
            customers.push(customer);
            dates.push(date);
            countries.push(country);
        }

        if invoices.is_empty() {
            return Err(DataError::EmptyTable(table.to_string()));
        }

        debug!(table, rows = invoices.len(), "loaded transaction table");

        let df = DataFrame::new(vec![
            Series::new(INVOICE.into(), invoices).into(),
            Series::new(STOCK_CODE.into(), stock_codes).into(),
            Series::new(DESCRIPTION.into(), descriptions).into(),
            Series::new(QUANTITY.into(), quantities).into(),
            Series::new(PRICE.into(), prices).into(),
            Series::new(CUSTOMER_ID.into(), customers).into(),
            Series::new(INVOICE_DATE.into(), dates).into(),
            Series::new(COUNTRY.into(), countries).into(),
        ])?;

        // Convert stored date strings to a datetime column.
        let df = df
            .lazy()
            .with_column(col(INVOICE_DATE).str().to_datetime(
                Some(TimeUnit::Microseconds),
                None,
                StrptimeOptions {
                    format: Some(DATETIME_FORMAT.into()),
                    strict: false,
                    ..Default::default()
                },
                lit("raise"),
            ))
            .collect()?;

        Ok(df)
    }

    /// Store a transaction-shaped DataFrame into a table.
    pub fn put_table(&self, table: &str, df: &DataFrame) -> Result<()> {
        // Render the datetime column with the at-rest format.
        let df = df
            .clone()
            .lazy()
            .with_column(
                col(INVOICE_DATE)
                    .dt()
                    .to_string(DATETIME_FORMAT)
                    .alias(INVOICE_DATE),
            )
            .collect()?;

        let invoices = df.column(INVOICE)?.str()?;
        let stock_codes = df.column(STOCK_CODE)?.str()?;
        let descriptions = df.column(DESCRIPTION)?.str()?;
        let quantities = df.column(QUANTITY)?.i64()?;
        let prices = df.column(PRICE)?.f64()?;
        let customers = df.column(CUSTOMER_ID)?.str()?;
        let dates = df.column(INVOICE_DATE)?.str()?;
        let countries = df.column(COUNTRY)?.str()?;

        let tx = self.conn.unchecked_transaction()?;

        for i in 0..df.height() {
            let invoice = invoices
                .get(i)
                .ok_or_else(|| DataError::Parse("Missing invoice".to_string()))?;
            let stock_code = stock_codes
                .get(i)
                .ok_or_else(|| DataError::Parse("Missing stock code".to_string()))?;
            let quantity = quantities
                .get(i)
                .ok_or_else(|| DataError::Parse("Missing quantity".to_string()))?;
            let price = prices
                .get(i)
                .ok_or_else(|| DataError::Parse("Missing price".to_string()))?;
            let date = dates
                .get(i)
                .ok_or_else(|| DataError::Parse("Missing invoice date".to_string()))?;
            let country = countries
                .get(i)
                .ok_or_else(|| DataError::Parse("Missing country".to_string()))?;

            tx.execute(
                &format!(
                    "INSERT INTO \"{table}\"
                     (\"{INVOICE}\", \"{STOCK_CODE}\", \"{DESCRIPTION}\", \"{QUANTITY}\",
                      \"{PRICE}\", \"{CUSTOMER_ID}\", \"{INVOICE_DATE}\", \"{COUNTRY}\")
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
                ),
                params![
                    invoice,
                    stock_code,
                    descriptions.get(i),
                    quantity,
                    price,
                    customers.get(i),
                    date,
                    country
                ],
            )?;
        }

        tx.commit()?;
        debug!(table, rows = df.height(), "stored transaction table");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> DataFrame {
        let at = |d: u32, h: u32| {
            NaiveDate::from_ymd_opt(2011, 12, d)
                .unwrap()
                .and_hms_opt(h, 30, 0)
                .unwrap()
        };
        df!(
            INVOICE => &["536365", "C536379"],
            STOCK_CODE => &["85123A", "85123A"],
            DESCRIPTION => &[Some("WHITE HANGING HEART"), None],
            QUANTITY => &[6i64, -2],
            PRICE => &[2.55, 2.55],
            CUSTOMER_ID => &[Some("17850"), None],
            INVOICE_DATE => &[at(1, 8), at(2, 9)],
            COUNTRY => &["United Kingdom", "United Kingdom"],
        )
        .unwrap()
    }

    #[test]
    fn test_round_trip_through_in_memory_store() {
        let store = SqliteStore::in_memory().unwrap();
        store.put_table("transactions", &sample()).unwrap();

        assert_eq!(store.row_count("transactions").unwrap(), 2);

        let loaded = store.load_transactions().unwrap();
        assert_eq!(loaded.height(), 2);

        let invoices = loaded.column(INVOICE).unwrap().str().unwrap();
        assert_eq!(invoices.get(0), Some("536365"));

        // Nullable columns survive the round trip as nulls.
        assert_eq!(loaded.column(DESCRIPTION).unwrap().null_count(), 1);
        assert_eq!(loaded.column(CUSTOMER_ID).unwrap().null_count(), 1);

        // The timestamp comes back as a datetime column.
        assert!(matches!(
            loaded.column(INVOICE_DATE).unwrap().dtype(),
            DataType::Datetime(_, _)
        ));
    }

    #[test]
    fn test_empty_table_is_an_error() {
        let store = SqliteStore::in_memory().unwrap();
        let err = store.load_cancellations().unwrap_err();
        assert!(matches!(err, DataError::EmptyTable(_)));
    }

    #[test]
    fn test_custom_table_names_are_respected() {
        let mut config = StoreConfig::at(":memory:");
        config.transactions_table = "retail_sales".to_string();
        // Opening with a path of :memory: gives rusqlite an in-memory db.
        let store = SqliteStore::open(config).unwrap();

        store.put_table("retail_sales", &sample()).unwrap();
        let loaded = store.load_transactions().unwrap();
        assert_eq!(loaded.height(), 2);
    }
}
