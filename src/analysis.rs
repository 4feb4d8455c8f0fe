//! Batch-level pairwise contamination analysis

use crate::{
    matcher::match_tables,
    normalize::normalize_with_config,
    score::{score, Side},
    utils::{chunk_work, log_progress},
    AnalysisConfig, ContamError, ContamResult, PairResult, SampleTable,
};
use rayon::prelude::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Validate analysis configuration parameters
pub fn validate_config(config: &AnalysisConfig) -> ContamResult<()> {
    let columns = [
        ("chromosome", config.chromosome_column),
        ("position", config.position_column),
        ("allele fraction", config.allele_fraction_column),
    ];
    for (column, index) in columns {
        if index == 0 {
            return Err(ContamError::InvalidConfig(format!(
                "{} column index is 1-based and must be at least 1",
                column
            )));
        }
    }

    if !config.threshold.is_finite() {
        return Err(ContamError::InvalidConfig(
            "threshold must be a finite number".to_string(),
        ));
    }

    if config.num_threads == 0 {
        return Err(ContamError::InvalidConfig(
            "number of threads must be at least 1".to_string(),
        ));
    }

    Ok(())
}

/// Every unordered pair `(i, j)` with `i < j`, outer index first
pub fn pair_indices(n: usize) -> Vec<(usize, usize)> {
    (0..n)
        .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
        .collect()
}

/// Compare two normalized tables and build their result record
pub fn analyze_pair(
    table_1: &SampleTable,
    table_2: &SampleTable,
    config: &AnalysisConfig,
) -> ContamResult<PairResult> {
    let outcome = match_tables(table_1, table_2, config)?;
    let contamination = score(&outcome.shared);

    if contamination.has_signal() {
        log::debug!(
            "{} vs {}: {} shared, mean AF {:.4} / {:.4}",
            table_1.name,
            table_2.name,
            outcome.shared_count(),
            contamination.mean_fraction_a,
            contamination.mean_fraction_b
        );
    } else {
        log::debug!(
            "{} vs {}: no contamination evidence ({} shared)",
            table_1.name,
            table_2.name,
            outcome.shared_count()
        );
    }

    let primary_source = match contamination.primary {
        Side::A => table_1.name.clone(),
        Side::B => table_2.name.clone(),
    };

    Ok(PairResult {
        primary_source,
        file_1: table_1.name.clone(),
        file_2: table_2.name.clone(),
        shared_mutations: outcome.shared_count(),
        unique_to_file_1: outcome.unique_a,
        unique_to_file_2: outcome.unique_b,
        contamination_pct_1_to_2: contamination.pct_a_to_b,
        contamination_pct_2_to_1: contamination.pct_b_to_a,
    })
}

/// Check the batch for structural problems before any pair is evaluated
fn validate_tables(tables: &[SampleTable], config: &AnalysisConfig) -> ContamResult<()> {
    if tables.len() < 2 {
        return Err(ContamError::InsufficientInput(tables.len()));
    }

    for table in tables {
        table.validate_shape()?;
        table.column_offset(config.chromosome_column, "chromosome")?;
        table.column_offset(config.position_column, "position")?;
        table.column_offset(config.allele_fraction_column, "allele fraction")?;
    }

    let mut seen = HashSet::new();
    for table in tables {
        if !seen.insert(table.name.as_str()) {
            log::warn!("Sample name '{}' appears more than once in the batch", table.name);
        }
    }

    Ok(())
}

/// Normalize every table and compare each unordered pair.
///
/// Results come back in visit order: outer index `i`, inner index `j > i`,
/// over the input order.
pub fn analyze_tables(
    mut tables: Vec<SampleTable>,
    config: &AnalysisConfig,
) -> ContamResult<Vec<PairResult>> {
    validate_config(config)?;
    validate_tables(&tables, config)?;

    tables
        .par_iter_mut()
        .try_for_each(|table| normalize_with_config(table, config))?;

    let pairs = pair_indices(tables.len());
    let total_pairs = pairs.len();
    log::info!("Comparing {} tables ({} pairs)", tables.len(), total_pairs);

    let num_chunks = std::cmp::min(config.num_threads, total_pairs);
    let chunks = chunk_work(pairs, num_chunks);

    let tables = &tables;
    let completed = AtomicUsize::new(0);
    let chunk_results: Result<Vec<Vec<PairResult>>, ContamError> = chunks
        .into_par_iter()
        .map(|chunk| -> ContamResult<Vec<PairResult>> {
            let results = chunk
                .iter()
                .map(|&(i, j)| analyze_pair(&tables[i], &tables[j], config))
                .collect::<ContamResult<Vec<PairResult>>>()?;
            let done = completed.fetch_add(results.len(), Ordering::Relaxed) + results.len();
            log_progress(done, total_pairs, "Pairs analyzed");
            Ok(results)
        })
        .collect();

    let results: Vec<PairResult> = chunk_results?.into_iter().flatten().collect();

    let without_evidence = results.iter().filter(|r| r.shared_mutations == 0).count();
    if without_evidence > 0 {
        log::info!("{} pairs share no high-confidence mutations", without_evidence);
    }

    Ok(results)
}
