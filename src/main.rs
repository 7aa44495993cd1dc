//! Binary entry point for pricing-transfer.
//!
//! This binary provides the CLI for exporting and importing pricing data.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow needless_pass_by_value for command functions
#![allow(clippy::needless_pass_by_value)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pricing_transfer::io::Format;
use pricing_transfer::observability::{self, InitOptions};
use pricing_transfer::storage::EntityStore;
use pricing_transfer::{
    CancellationToken, Catalog, DataExporter, EntityKind, ExportDataQuery, Price, Pricelist,
    PricelistAssignment, PricingConfig, PricingExportImport, PricingStores, ProgressInfo,
    SettingsManager, SqlitePricingStore,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// pricing-transfer - Streaming export and import of pricing data.
#[derive(Parser)]
#[command(name = "pricing-transfer")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Export all price lists, assignments and prices to an archive.
    Export {
        /// Output file path.
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import an archive.
    Import {
        /// Input file path.
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Export a single kind, optionally filtered.
    ExportKind {
        /// Kind to export: pricelists, assignments or prices.
        #[arg(short, long)]
        kind: String,

        /// Output file path.
        #[arg(short, long)]
        output: PathBuf,

        /// Output format: json or csv (default: from the file extension).
        #[arg(short, long)]
        format: Option<String>,

        /// Export only these ids, in this order (comma-separated).
        #[arg(long, value_delimiter = ',')]
        ids: Vec<String>,

        /// Case-insensitive keyword filter.
        #[arg(long)]
        keyword: Option<String>,

        /// Restrict to these price lists (comma-separated).
        #[arg(long, value_delimiter = ',')]
        pricelist_ids: Vec<String>,

        /// Restrict to these catalogs (comma-separated).
        #[arg(long, value_delimiter = ',')]
        catalog_ids: Vec<String>,

        /// Restrict to these products (comma-separated).
        #[arg(long, value_delimiter = ',')]
        product_ids: Vec<String>,

        /// Restrict to these currencies (comma-separated).
        #[arg(long, value_delimiter = ',')]
        currencies: Vec<String>,
    },

    /// Show record counts.
    Status,

    /// Manage catalogs used to resolve assignment names.
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

/// Catalog subcommands.
#[derive(Subcommand)]
enum CatalogAction {
    /// Register or rename a catalog.
    Add {
        /// Catalog id.
        #[arg(long)]
        id: String,

        /// Display name.
        #[arg(long)]
        name: String,
    },
}

/// Main entry point.
fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let _observability = match observability::init(
        &config.logging,
        &config.metrics,
        InitOptions {
            verbose: cli.verbose,
        },
    ) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to initialize observability: {e}");
            return ExitCode::FAILURE;
        },
    };

    match run_command(cli.command, config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
fn run_command(command: Commands, config: PricingConfig) -> CliResult {
    let store = Arc::new(SqlitePricingStore::new(&config.database_path)?);
    let stores = PricingStores::from_backend(Arc::clone(&store));

    match command {
        Commands::Export { output } => cmd_export(stores, config, &output),
        Commands::Import { input } => cmd_import(stores, config, &input),
        Commands::ExportKind {
            kind,
            output,
            format,
            ids,
            keyword,
            pricelist_ids,
            catalog_ids,
            product_ids,
            currencies,
        } => {
            let mut query = ExportDataQuery::new()
                .with_object_ids(ids)
                .with_pricelist_ids(pricelist_ids)
                .with_catalog_ids(catalog_ids)
                .with_product_ids(product_ids)
                .with_currencies(currencies);
            query.keyword = keyword;
            cmd_export_kind(stores, &config, &kind, &output, format.as_deref(), &query)
        },
        Commands::Status => cmd_status(&store, &config),
        Commands::Catalog {
            action: CatalogAction::Add { id, name },
        } => {
            store.add_catalog(&Catalog::new(id.clone(), name))?;
            println!("Catalog {id} saved");
            Ok(())
        },
    }
}

/// Loads configuration: `--config`, then `PRICING_TRANSFER_CONFIG`, then the
/// default location. Environment overrides apply last.
fn load_config(path: Option<&str>) -> Result<PricingConfig, Box<dyn std::error::Error>> {
    if let Some(config_path) = path {
        return Ok(PricingConfig::load_from_file(Path::new(config_path))?.with_env_overrides());
    }

    if let Ok(config_path) = std::env::var("PRICING_TRANSFER_CONFIG") {
        if !config_path.trim().is_empty() {
            return Ok(
                PricingConfig::load_from_file(Path::new(&config_path))?.with_env_overrides()
            );
        }
    }

    Ok(PricingConfig::load_default().with_env_overrides())
}

/// Installs a Ctrl-C handler that signals the returned token.
fn cancellation_on_interrupt() -> Result<CancellationToken, Box<dyn std::error::Error>> {
    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, stopping after the current page...");
        handler_token.cancel();
    })?;
    Ok(cancel)
}

/// Spinner showing the latest progress description.
struct TransferProgress {
    bar: ProgressBar,
}

impl TransferProgress {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        Self { bar }
    }

    fn report(&self, info: &ProgressInfo) {
        self.bar.set_message(info.description.clone());
    }

    fn finish(&self, message: String) {
        self.bar.finish_with_message(message);
    }

    fn abandon(&self) {
        self.bar.abandon();
    }
}

fn cmd_export(stores: PricingStores, config: PricingConfig, output: &Path) -> CliResult {
    let cancel = cancellation_on_interrupt()?;
    let engine = PricingExportImport::new(stores, Arc::new(config));
    let progress = TransferProgress::new();

    match engine.export_to_file(output, |info| progress.report(&info), &cancel) {
        Ok(summary) => {
            progress.finish(format!(
                "Exported {} price lists, {} assignments, {} prices to {}",
                summary.pricelists,
                summary.assignments,
                summary.prices,
                output.display()
            ));
            Ok(())
        },
        Err(e) => {
            progress.abandon();
            Err(e.into())
        },
    }
}

fn cmd_import(stores: PricingStores, config: PricingConfig, input: &Path) -> CliResult {
    let cancel = cancellation_on_interrupt()?;
    let engine = PricingExportImport::new(stores, Arc::new(config));
    let progress = TransferProgress::new();

    match engine.import_from_file(input, |info| progress.report(&info), &cancel) {
        Ok(summary) => {
            progress.finish(format!(
                "Imported {} price lists, {} assignments, {} prices",
                summary.pricelists, summary.assignments, summary.prices
            ));
            Ok(())
        },
        Err(e) => {
            progress.abandon();
            Err(e.into())
        },
    }
}

fn cmd_export_kind(
    stores: PricingStores,
    config: &dyn SettingsManager,
    kind: &str,
    output: &Path,
    format: Option<&str>,
    query: &ExportDataQuery,
) -> CliResult {
    let kind = EntityKind::parse(kind).ok_or_else(|| {
        pricing_transfer::Error::InvalidInput(format!(
            "Unknown kind: {kind} (expected pricelists, assignments or prices)"
        ))
    })?;
    let format = match format {
        Some(name) => name.parse::<Format>()?,
        None => Format::from_path(output).unwrap_or_default(),
    };

    let cancel = cancellation_on_interrupt()?;
    let exporter = DataExporter::new(stores, config);
    let file = std::fs::File::create(output).map_err(|e| {
        pricing_transfer::Error::OperationFailed {
            operation: "create_export_file".to_string(),
            cause: e.to_string(),
        }
    })?;
    let progress = TransferProgress::new();

    match exporter.export(
        kind,
        query,
        format,
        file,
        |info| progress.report(&info),
        &cancel,
    ) {
        Ok(exported) => {
            progress.finish(format!(
                "Exported {exported} {kind} as {format} to {}",
                output.display()
            ));
            Ok(())
        },
        Err(e) => {
            progress.abandon();
            Err(e.into())
        },
    }
}

fn cmd_status(store: &SqlitePricingStore, config: &PricingConfig) -> CliResult {
    println!("Database: {}", config.database_path.display());
    println!("Page size: {}", config.page_size.max(1));
    println!(
        "Price lists: {}",
        EntityStore::<Pricelist>::count(store)?
    );
    println!(
        "Assignments: {}",
        EntityStore::<PricelistAssignment>::count(store)?
    );
    println!("Prices: {}", EntityStore::<Price>::count(store)?);
    Ok(())
}
