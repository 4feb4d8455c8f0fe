//! CLI binary for xcontam - pairwise contamination analysis over a batch of sample tables

use clap::Parser;
use env_logger::Env;
use std::path::PathBuf;
use xcontam_rs::{
    analysis::{analyze_tables, validate_config},
    report::write_pair_results,
    table::read_sample_tables,
    utils::{get_num_cpus, validate_file_readable, Timer},
    AnalysisConfig, ContamError, ContamResult,
};

#[derive(Parser)]
#[command(name = "xcontam")]
#[command(about = "xcontam - Pairwise cross-sample contamination estimation from variant tables")]
#[command(long_about = "
xcontam compares every pair of per-sample variant tables (CSV with a header row)
and estimates cross-sample contamination between them.

For each unordered pair of input files:
1. Rows with an allele fraction below the threshold are discarded
2. The remaining variants are matched on (chromosome, position)
3. Shared and unique mutation counts are reported, together with a
   directional contamination percentage derived from the mean allele
   fraction of the shared variants in each file

Columns are addressed by 1-based position, not by header name. Gzip-compressed
inputs are detected automatically. Results are representative and may include
shared sequencing errors.
")]
struct Args {
    /// Input sample tables (at least two)
    #[arg(value_name = "FILE", required = true, num_args = 1..)]
    inputs: Vec<PathBuf>,

    /// Path to the output CSV file (.gz for compressed output)
    #[arg(long, short, value_name = "FILE")]
    output: PathBuf,

    /// Minimum allele fraction for a variant to be considered
    #[arg(long, default_value_t = 0.1)]
    threshold: f64,

    /// 1-based index of the chromosome column
    #[arg(long, default_value_t = 1)]
    chromosome_column: usize,

    /// 1-based index of the position column
    #[arg(long, default_value_t = 2)]
    position_column: usize,

    /// 1-based index of the allele fraction column
    #[arg(long, default_value_t = 22)]
    allele_fraction_column: usize,

    /// Number of processes to use for parallel processing
    #[arg(long, default_value_t = get_num_cpus())]
    num_processes: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Force overwrite of output file if it exists
    #[arg(short, long)]
    force: bool,
}

impl Args {
    fn analysis_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            chromosome_column: self.chromosome_column,
            position_column: self.position_column,
            allele_fraction_column: self.allele_fraction_column,
            threshold: self.threshold,
            num_threads: self.num_processes,
        }
    }
}

fn run() -> ContamResult<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level))
        .format_timestamp_secs()
        .init();

    log::info!("Starting xcontam pairwise analysis");
    log::info!("Input tables: {}", args.inputs.len());
    log::info!("Output file: {:?}", args.output);
    log::info!("Number of processes: {}", args.num_processes);

    if args.inputs.len() < 2 {
        return Err(ContamError::InsufficientInput(args.inputs.len()));
    }

    for input in &args.inputs {
        validate_file_readable(input)?;
    }

    if args.output.exists() && !args.force {
        return Err(ContamError::Io(std::io::Error::new(
            std::io::ErrorKind::AlreadyExists,
            format!("Output file {:?} already exists. Use --force to overwrite.", args.output),
        )));
    }

    let config = args.analysis_config();
    validate_config(&config)?;
    log::info!(
        "Configuration: chromosome column={}, position column={}, allele fraction column={}, threshold={}",
        config.chromosome_column,
        config.position_column,
        config.allele_fraction_column,
        config.threshold
    );

    let timer = Timer::new("Reading sample tables");
    let tables = read_sample_tables(&args.inputs)?;
    drop(timer);
    for table in &tables {
        log::info!("  {}: {} rows", table.name, table.len());
        if table.is_empty() {
            log::warn!("Table '{}' has no rows", table.name);
        }
    }

    let timer = Timer::new("Pairwise analysis");
    let results = analyze_tables(tables, &config)?;
    drop(timer);

    let with_evidence = results.iter().filter(|r| r.shared_mutations > 0).count();
    log::info!("Analysis summary:");
    log::info!("  Pairs compared: {}", results.len());
    log::info!("  Pairs with shared mutations: {}", with_evidence);

    let _timer = Timer::new("Writing results");
    write_pair_results(&results, &args.output)?;

    log::info!("Results written to: {:?}", args.output);
    log::warn!("Results are representative and may include shared sequencing errors");

    Ok(())
}

/// Handle application errors and provide user-friendly messages
fn handle_error(error: ContamError) -> ! {
    match error {
        ContamError::FileNotFound(path) => {
            eprintln!("Error: File not found: {}", path);
            eprintln!("Please check that the file exists and is readable.");
        }
        ContamError::InsufficientInput(count) => {
            eprintln!("Error: At least two sample tables are required (got {}).", count);
            eprintln!("Pass two or more CSV files to compare.");
        }
        ContamError::InvalidColumnIndex {
            ref table,
            column,
            index,
            width,
        } => {
            eprintln!(
                "Error: The {} column index {} is out of range for '{}' ({} columns).",
                column, index, table, width
            );
            eprintln!("Column indices are 1-based; check the --*-column options.");
        }
        ContamError::RaggedTable {
            ref table,
            row,
            expected,
            found,
        } => {
            eprintln!(
                "Error: Row {} of '{}' has {} columns but the header has {}.",
                row, table, found, expected
            );
            eprintln!("Please check that the file is a well-formed CSV table.");
        }
        ContamError::InvalidConfig(msg) => {
            eprintln!("Error: Invalid configuration: {}", msg);
            eprintln!("Please check the threshold, column and process options.");
        }
        ContamError::Csv(ref e) => {
            eprintln!("Error: CSV parsing error: {}", e);
            eprintln!("Please check that the input files are comma-separated with a header row.");
        }
        ContamError::Io(ref e) => {
            eprintln!("Error: I/O error: {}", e);
            eprintln!("Please check file permissions and disk space.");
        }
    }
    std::process::exit(1);
}

fn main() {
    if let Err(e) = run() {
        handle_error(e);
    }
}
