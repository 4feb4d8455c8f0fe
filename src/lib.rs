//! # xcontam - Pairwise Cross-Sample Contamination Estimator
//!
//! Compares per-sample variant-call tables two at a time, counts the
//! high-confidence mutations each pair shares, and estimates a directional
//! contamination percentage from the mean allele fraction of those shared
//! mutations.

pub mod analysis;
pub mod matcher;
pub mod normalize;
pub mod report;
pub mod score;
pub mod table;
pub mod utils;

use serde::{Deserialize, Serialize};

pub use table::{Cell, SampleTable};

/// One output record per unordered pair of sample tables.
///
/// Field order matches the persisted CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairResult {
    #[serde(rename = "Primary Source")]
    pub primary_source: String,
    #[serde(rename = "File 1")]
    pub file_1: String,
    #[serde(rename = "File 2")]
    pub file_2: String,
    #[serde(rename = "Shared Mutations")]
    pub shared_mutations: usize,
    #[serde(rename = "Unique to File 1")]
    pub unique_to_file_1: usize,
    #[serde(rename = "Unique to File 2")]
    pub unique_to_file_2: usize,
    #[serde(rename = "Contamination % (File 1 to File 2)")]
    pub contamination_pct_1_to_2: u32,
    #[serde(rename = "Contamination % (File 2 to File 1)")]
    pub contamination_pct_2_to_1: u32,
}

/// Configuration parameters for a contamination batch
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub chromosome_column: usize,      // 1-based
    pub position_column: usize,        // 1-based
    pub allele_fraction_column: usize, // 1-based
    pub threshold: f64,                // minimum allele fraction
    pub num_threads: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            chromosome_column: 1,
            position_column: 2,
            allele_fraction_column: 22,
            threshold: 0.1,
            num_threads: 1,
        }
    }
}

/// Error types for the xcontam library
#[derive(Debug, thiserror::Error)]
pub enum ContamError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Insufficient input: at least two sample tables are required, got {0}")]
    InsufficientInput(usize),

    #[error("Invalid {column} column index {index} for table '{table}' with {width} columns")]
    InvalidColumnIndex {
        table: String,
        column: &'static str,
        index: usize,
        width: usize,
    },

    #[error("Table '{table}' row {row} has {found} columns, expected {expected}")]
    RaggedTable {
        table: String,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type ContamResult<T> = Result<T, ContamError>;
