//! Analytics pipeline for retail transaction tables.
//!
//! Loads the sales and cancellation tables, runs the metric stages in
//! dependency order and collects the results into one bundle. Stages with
//! no data dependency on each other (ABC, elasticity) still run
//! sequentially here; each is a pure transform, so nothing is shared
//! between them.

use marlow_core::schema;
use marlow_data::{DataError, SqliteStore, StoreConfig, partition_by_quantity_sign};
use marlow_metrics::{
    AbcClassifier, CancellationMerger, ClusterPrep, ElasticityEstimator, FittedScaler,
    RfmCalculator, RfmReport, TimeFeatureDeriver,
};
use marlow_output::{ExportError, Exporter, PipelineSummary, class_counts};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;

/// Error type for pipeline operations.
#[derive(Debug, thiserror::Error)]
pub(crate) enum PipelineError {
    /// Ingestion error from the data crate.
    #[error("Data error: {0}")]
    Data(#[from] DataError),
    /// Transform error from the metrics crates.
    #[error("Transform error: {0}")]
    Transform(#[from] marlow_core::TransformError),
    /// Export error.
    #[error("Export error: {0}")]
    Export(#[from] ExportError),
    /// Polars DataFrame error.
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    /// Report serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Invalid command-line input.
    #[error("Input error: {0}")]
    Input(String),
}

/// Where the transaction tables come from.
#[derive(Debug, Clone)]
pub(crate) enum TableSource {
    /// A SQLite store with separate sales and cancellation tables.
    Sqlite(StoreConfig),
    /// A raw CSV export, partitioned on quantity sign after reading.
    Csv(PathBuf),
}

impl TableSource {
    /// Resolve the source from the CLI flags.
    pub(crate) fn resolve(
        database: Option<PathBuf>,
        csv: Option<PathBuf>,
    ) -> Result<Self, PipelineError> {
        match (database, csv) {
            (Some(path), None) => Ok(Self::Sqlite(StoreConfig::at(path))),
            (None, Some(path)) => Ok(Self::Csv(path)),
            (Some(_), Some(_)) => Err(PipelineError::Input(
                "pass either --database or --csv, not both".to_string(),
            )),
            (None, None) => Err(PipelineError::Input(
                "an input is required: --database <file> or --csv <file>".to_string(),
            )),
        }
    }

    /// Short name of the dataset for summaries and reports.
    pub(crate) fn dataset_name(&self) -> String {
        let path = match self {
            Self::Sqlite(config) => config.path.as_path(),
            Self::Csv(path) => path.as_path(),
        };
        path.file_stem()
            .map_or_else(|| "dataset".to_string(), |s| s.to_string_lossy().to_string())
    }
}

/// Load sales and cancellation tables from the configured source.
pub(crate) fn load_input(source: &TableSource) -> Result<(DataFrame, DataFrame), PipelineError> {
    match source {
        TableSource::Sqlite(config) => {
            let store = SqliteStore::open(config.clone())?;
            let sales = store.load_transactions()?;
            // A store without recorded cancellations is a valid dataset.
            let cancellations = match store.load_cancellations() {
                Ok(frame) => frame,
                Err(DataError::EmptyTable(_)) => sales.clear(),
                Err(err) => return Err(err.into()),
            };
            Ok((sales, cancellations))
        }
        TableSource::Csv(path) => {
            let raw = marlow_data::csv::read_transactions_csv(path)?;
            let split = partition_by_quantity_sign(&raw)?;
            Ok((split.sales, split.cancellations))
        }
    }
}

/// Everything one full run produces.
#[derive(Debug)]
pub(crate) struct AnalyticsBundle {
    /// Sales table augmented with calendar features.
    pub augmented: DataFrame,
    /// RFM metrics plus exclusion metadata.
    pub rfm: RfmReport,
    /// Standardized RFM metrics ready for clustering.
    pub scaled: DataFrame,
    /// Fitted scale parameters, replayable on later batches.
    pub scaler: FittedScaler,
    /// RFM metrics with cancellation counts merged on.
    pub profiles: DataFrame,
    /// ABC revenue tiers per product.
    pub abc: DataFrame,
    /// Elasticity point estimates per product.
    pub elasticity: DataFrame,
    /// Headline numbers for the run.
    pub summary: PipelineSummary,
}

/// Run every stage over one dataset.
pub(crate) fn run_full(
    dataset: String,
    sales: &DataFrame,
    cancellations: &DataFrame,
) -> Result<AnalyticsBundle, PipelineError> {
    info!(dataset = %dataset, rows = sales.height(), "starting analytics run");

    // Calendar features first: this also parses string timestamps strictly,
    // so the downstream stages see a proper datetime column.
    let augmented = TimeFeatureDeriver::new().derive(sales)?;

    let rfm = RfmCalculator::new().compute(&augmented)?;
    let (scaled, scaler) = ClusterPrep::new().fit_transform(&rfm.metrics)?;
    let profiles = CancellationMerger::new().merge(&rfm.metrics, cancellations)?;

    let abc = AbcClassifier::new().classify(&augmented)?;
    let elasticity = ElasticityEstimator::new().estimate(&augmented)?;

    let (class_a, class_b, class_c) = class_counts(&abc)?;
    let summary = PipelineSummary {
        dataset,
        transactions: sales.height(),
        cancellation_events: cancellations.height(),
        excluded_null_customers: rfm.excluded_null_customers,
        customers: rfm.metrics.height(),
        reference_date: Some(rfm.reference_date),
        class_a_products: class_a,
        class_b_products: class_b,
        class_c_products: class_c,
        elasticity_pairs: elasticity.height(),
    };

    Ok(AnalyticsBundle {
        augmented,
        rfm,
        scaled,
        scaler,
        profiles,
        abc,
        elasticity,
        summary,
    })
}

/// Write every result table of a bundle into `directory`.
pub(crate) fn export_bundle(
    bundle: &AnalyticsBundle,
    exporter: &Exporter,
    directory: &Path,
) -> Result<(), PipelineError> {
    std::fs::create_dir_all(directory).map_err(ExportError::Io)?;

    let tables: [(&str, &DataFrame); 6] = [
        ("rfm", &bundle.rfm.metrics),
        ("rfm_scaled", &bundle.scaled),
        ("customer_profiles", &bundle.profiles),
        ("abc", &bundle.abc),
        ("elasticity", &bundle.elasticity),
        ("time_features", &bundle.augmented),
    ];
    for (stem, frame) in tables {
        let path = directory.join(exporter.file_name(stem));
        exporter.write_frame(frame, &path)?;
    }

    // The fitted scaler is always JSON: it is configuration, not a table.
    let scaler_path = directory.join("scaler.json");
    let scaler_file = std::fs::File::create(scaler_path).map_err(ExportError::Io)?;
    serde_json::to_writer_pretty(scaler_file, &bundle.scaler)?;

    let summary_path = directory.join(exporter.file_name("summary"));
    exporter.write_summary(&bundle.summary, &summary_path)?;

    info!(directory = %directory.display(), "exported analytics bundle");
    Ok(())
}

/// Check that the sales table carries the canonical transaction columns.
pub(crate) fn validate_input(sales: &DataFrame) -> Result<(), PipelineError> {
    schema::ensure_columns(
        sales,
        &[schema::INVOICE, schema::QUANTITY, schema::PRICE, schema::INVOICE_DATE],
        "pipeline",
    )?;
    Ok(())
}
