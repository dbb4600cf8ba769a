//! Marlow CLI binary.
//!
//! Provides the command-line interface for the Marlow retail analytics
//! pipeline.

mod integration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use integration::pipeline::{self, PipelineError, TableSource};
use marlow_metrics::kpi::{self, KpiConfig};
use marlow_metrics::{
    AbcClassifier, ClusterPrep, ElasticityEstimator, RfmCalculator, TimeFeatureDeriver, registry,
};
use marlow_output::{ExportFormat, Exporter};
use polars::prelude::*;
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "marlow")]
#[command(about = "Marlow: retail transaction analytics", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and export every result table
    Analyze {
        /// SQLite store holding transactions and cancellations tables
        #[arg(long)]
        database: Option<PathBuf>,

        /// Raw CSV export, partitioned on quantity sign after reading
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Output directory for the exported tables
        #[arg(long, default_value = "marlow-out")]
        output: PathBuf,

        /// Output format: csv, json or pretty-json
        #[arg(long, default_value = "csv")]
        format: String,
    },

    /// Compute RFM customer metrics
    Rfm {
        /// SQLite store holding transactions and cancellations tables
        #[arg(long)]
        database: Option<PathBuf>,

        /// Raw CSV export
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Also print the standardized metrics
        #[arg(long)]
        scaled: bool,
    },

    /// Rank products into ABC revenue tiers
    Abc {
        /// SQLite store holding transactions and cancellations tables
        #[arg(long)]
        database: Option<PathBuf>,

        /// Raw CSV export
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Rows to display
        #[arg(long, default_value_t = 20)]
        top: usize,
    },

    /// Estimate price elasticity per product
    Elasticity {
        /// SQLite store holding transactions and cancellations tables
        #[arg(long)]
        database: Option<PathBuf>,

        /// Raw CSV export
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Rows to display
        #[arg(long, default_value_t = 20)]
        top: usize,
    },

    /// Operational KPI views over the dataset
    Kpi {
        /// SQLite store holding transactions and cancellations tables
        #[arg(long)]
        database: Option<PathBuf>,

        /// Raw CSV export
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Products per ranking
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Exclude the domestic market from the country view
        #[arg(long)]
        international: bool,
    },

    /// List the available transforms
    Transforms,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), PipelineError> {
    match cli.command {
        Commands::Analyze {
            database,
            csv,
            output,
            format,
        } => analyze(database, csv, output, &format),
        Commands::Rfm {
            database,
            csv,
            scaled,
        } => rfm(database, csv, scaled),
        Commands::Abc { database, csv, top } => abc(database, csv, top),
        Commands::Elasticity { database, csv, top } => elasticity(database, csv, top),
        Commands::Kpi {
            database,
            csv,
            top,
            international,
        } => kpi_views(database, csv, top, international),
        Commands::Transforms => {
            list_transforms();
            Ok(())
        }
    }
}

fn parse_format(format: &str) -> Result<ExportFormat, PipelineError> {
    match format {
        "csv" => Ok(ExportFormat::Csv),
        "json" => Ok(ExportFormat::Json),
        "pretty-json" => Ok(ExportFormat::PrettyJson),
        other => Err(PipelineError::Input(format!(
            "unknown format '{other}' (expected csv, json or pretty-json)"
        ))),
    }
}

fn spinner(message: &'static str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(ProgressStyle::default_spinner());
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Load the configured source and bring the sales table to analysis shape
/// (strictly parsed timestamps plus calendar features).
fn load_prepared(
    database: Option<PathBuf>,
    csv: Option<PathBuf>,
) -> Result<(TableSource, DataFrame, DataFrame), PipelineError> {
    let source = TableSource::resolve(database, csv)?;
    let (sales, cancellations) = pipeline::load_input(&source)?;
    pipeline::validate_input(&sales)?;
    let augmented = TimeFeatureDeriver::new().derive(&sales)?;
    Ok((source, augmented, cancellations))
}

fn analyze(
    database: Option<PathBuf>,
    csv: Option<PathBuf>,
    output: PathBuf,
    format: &str,
) -> Result<(), PipelineError> {
    let source = TableSource::resolve(database, csv)?;
    let exporter = Exporter::new(parse_format(format)?);

    let bar = spinner("loading transaction tables");
    let (sales, cancellations) = pipeline::load_input(&source)?;
    pipeline::validate_input(&sales)?;
    bar.finish_with_message(format!(
        "loaded {} sales rows, {} cancellation rows",
        sales.height(),
        cancellations.height()
    ));

    let bar = spinner("running analytics stages");
    let bundle = pipeline::run_full(source.dataset_name(), &sales, &cancellations)?;
    bar.finish_with_message("analytics complete");

    pipeline::export_bundle(&bundle, &exporter, &output)?;

    println!("{}", bundle.summary.to_ascii_table());
    println!("Results written to {}", output.display());
    Ok(())
}

fn rfm(
    database: Option<PathBuf>,
    csv: Option<PathBuf>,
    scaled: bool,
) -> Result<(), PipelineError> {
    let (_, sales, _) = load_prepared(database, csv)?;

    let report = RfmCalculator::new().compute(&sales)?;
    println!("{}", report.metrics);
    println!(
        "reference date: {} | rows without customer id: {}",
        report.reference_date, report.excluded_null_customers
    );

    if scaled {
        let (frame, _) = ClusterPrep::new().fit_transform(&report.metrics)?;
        println!("\nStandardized metrics:\n{frame}");
    }
    Ok(())
}

fn abc(database: Option<PathBuf>, csv: Option<PathBuf>, top: usize) -> Result<(), PipelineError> {
    let (_, sales, _) = load_prepared(database, csv)?;
    let tiers = AbcClassifier::new().classify(&sales)?;
    println!("{}", tiers.head(Some(top)));
    Ok(())
}

fn elasticity(
    database: Option<PathBuf>,
    csv: Option<PathBuf>,
    top: usize,
) -> Result<(), PipelineError> {
    let (_, sales, _) = load_prepared(database, csv)?;
    let estimates = ElasticityEstimator::new().estimate(&sales)?;
    println!("{}", estimates.head(Some(top)));
    Ok(())
}

fn kpi_views(
    database: Option<PathBuf>,
    csv: Option<PathBuf>,
    top: usize,
    international: bool,
) -> Result<(), PipelineError> {
    let (_, sales, cancellations) = load_prepared(database, csv)?;
    let config = KpiConfig::default();

    println!("Monthly revenue:");
    println!("{}", kpi::monthly_revenue(&sales)?);

    println!("\nTop {top} products by revenue:");
    println!("{}", kpi::top_products_by_revenue(&sales, &config, top)?);

    println!("\nTop {top} products by quantity:");
    println!("{}", kpi::top_products_by_quantity(&sales, &config, top)?);

    println!("\nMarket share by country:");
    println!(
        "{}",
        kpi::market_share_by_country(&sales, &config, international)?
    );

    println!("\nCustomer behavior:");
    println!("{}", kpi::customer_behavior(&sales)?);
    println!("{}", kpi::units_per_order(&sales)?);

    if cancellations.height() > 0 {
        println!("\nCancellation impact:");
        println!("{}", kpi::cancellation_summary(&cancellations)?);
        println!("{}", kpi::top_cancelled_products(&cancellations, top)?);
    }
    Ok(())
}

fn list_transforms() {
    println!("Available transforms:\n");
    for info in registry::available_transforms() {
        println!(
            "  {:<22} [{:?}] {}",
            info.name, info.category, info.description
        );
        println!("    requires: {}", info.required_columns.join(", "));
    }
}
