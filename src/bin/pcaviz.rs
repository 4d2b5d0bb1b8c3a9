//! pcaviz - Expression PCA CLI
//!
//! Command-line front end for the PCA scatter pipeline: runs the same
//! computation the request boundary exposes and writes the coordinate
//! table plus an optional JSON summary.

use clap::{Parser, Subcommand};
use pcaviz::aesthetics::{ChannelRequest, ChannelRequests};
use pcaviz::assemble::export_csv;
use pcaviz::data::Table;
use pcaviz::error::Result;
use pcaviz::pipeline::{analyze, PcaRequest};
use serde_json::json;
use std::path::{Path, PathBuf};

/// Expression PCA scatter analysis
#[derive(Parser)]
#[command(name = "pcaviz")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the PCA pipeline on an expression matrix and sample metadata
    Analyze {
        /// Path to the expression matrix (CSV/TSV, rows = genes, columns = samples)
        #[arg(short = 'e', long)]
        expression: PathBuf,

        /// Path to the sample metadata (CSV/TSV, one row per sample)
        #[arg(short, long)]
        metadata: PathBuf,

        /// Metadata column for point color (default: auto-selected)
        #[arg(long)]
        color_col: Option<String>,

        /// Metadata column for point symbol (default: auto-selected)
        #[arg(long)]
        symbol_col: Option<String>,

        /// Metadata column for point size (default: auto-selected)
        #[arg(long)]
        size_col: Option<String>,

        /// Output path for the joined PC-score/metadata table (CSV)
        #[arg(short, long)]
        output: PathBuf,

        /// Optional output path for a JSON summary (mappings, variance, counts)
        #[arg(short = 's', long)]
        summary: Option<PathBuf>,
    },

    /// Report the parsed columns and their classification for a table
    Inspect {
        /// Path to a tabular file (CSV/TSV)
        #[arg(short, long)]
        table: PathBuf,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            expression,
            metadata,
            color_col,
            symbol_col,
            size_col,
            output,
            summary,
        } => cmd_analyze(
            &expression,
            &metadata,
            color_col,
            symbol_col,
            size_col,
            &output,
            summary.as_deref(),
        ),

        Commands::Inspect { table } => cmd_inspect(&table),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_analyze(
    expression_path: &Path,
    metadata_path: &Path,
    color_col: Option<String>,
    symbol_col: Option<String>,
    size_col: Option<String>,
    output_path: &Path,
    summary_path: Option<&Path>,
) -> Result<()> {
    eprintln!("Loading tables...");
    let expression = std::fs::read(expression_path)?;
    let metadata = std::fs::read(metadata_path)?;

    let request = PcaRequest {
        expression: &expression,
        metadata: &metadata,
        channels: ChannelRequests {
            color: ChannelRequest::from_option(color_col),
            symbol: ChannelRequest::from_option(symbol_col),
            size: ChannelRequest::from_option(size_col),
        },
    };

    eprintln!("Running analysis...");
    let analysis = analyze(&request)?;

    std::fs::write(output_path, export_csv(&analysis.joined)?)?;
    eprintln!(
        "Wrote {} samples x {} features to {:?}",
        analysis.n_samples, analysis.n_features, output_path
    );

    if let Some(path) = summary_path {
        let doc = json!({
            "mappings": analysis.mapping,
            "variance_explained": analysis.variance,
            "n_samples": analysis.n_samples,
            "n_features": analysis.n_features,
            "plot_spec": analysis.plot_spec,
        });
        std::fs::write(path, serde_json::to_vec_pretty(&doc)?)?;
        eprintln!("Wrote summary to {:?}", path);
    }

    eprintln!(
        "Done! PC1 {:.1}%, PC2 {:.1}%",
        analysis.variance.pc1, analysis.variance.pc2
    );
    Ok(())
}

fn cmd_inspect(path: &Path) -> Result<()> {
    let table = Table::from_path(path)?;
    println!("{} rows, {} columns", table.n_rows(), table.n_columns());
    for column in table.columns() {
        println!(
            "{}\t{:?}\tcardinality={}",
            column.name(),
            column.column_type(),
            column.cardinality()
        );
    }
    Ok(())
}
