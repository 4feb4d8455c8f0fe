//! Allele-fraction filtering and coordinate matching between two tables

use crate::{
    normalize::{chromosome_label, position_value},
    AnalysisConfig, Cell, ContamResult, SampleTable,
};
use std::collections::HashMap;

/// Join key: chromosome label plus the bit pattern of a non-NaN position
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VariantKey {
    pub chromosome: String,
    position_bits: u64,
}

impl VariantKey {
    /// Build a key; a missing position yields no key and so never matches.
    pub fn new(chromosome: String, position: Option<f64>) -> Option<Self> {
        let position = position.filter(|p| !p.is_nan())?;
        // -0.0 and 0.0 compare equal and must hash equal
        let position = if position == 0.0 { 0.0 } else { position };
        Some(Self {
            chromosome,
            position_bits: position.to_bits(),
        })
    }

    pub fn position(&self) -> f64 {
        f64::from_bits(self.position_bits)
    }
}

/// A variant present in both tables of a pair
#[derive(Debug, Clone, PartialEq)]
pub struct SharedVariant {
    pub chromosome: String,
    pub position: f64,
    pub fraction_a: f64,
    pub fraction_b: f64,
}

/// Everything the scorer and the pair record need from one match
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    pub shared: Vec<SharedVariant>,
    pub filtered_a: usize,
    pub filtered_b: usize,
    pub unique_a: usize,
    pub unique_b: usize,
    pub duplicate_keys_a: usize,
    pub duplicate_keys_b: usize,
}

impl MatchOutcome {
    pub fn shared_count(&self) -> usize {
        self.shared.len()
    }
}

/// A row that passed the allele-fraction filter
#[derive(Debug, Clone)]
struct FilteredRow {
    key: Option<VariantKey>,
    fraction: f64,
}

#[derive(Debug, Clone, Copy)]
struct ColumnOffsets {
    chromosome: usize,
    position: usize,
    fraction: usize,
}

impl ColumnOffsets {
    fn resolve(table: &SampleTable, config: &AnalysisConfig) -> ContamResult<Self> {
        Ok(Self {
            chromosome: table.column_offset(config.chromosome_column, "chromosome")?,
            position: table.column_offset(config.position_column, "position")?,
            fraction: table.column_offset(config.allele_fraction_column, "allele fraction")?,
        })
    }
}

/// Whether an allele-fraction cell passes the threshold.
///
/// Anything that is not a number fails the comparison.
pub fn passes_threshold(cell: &Cell, threshold: f64) -> bool {
    cell.as_number().map(|f| f >= threshold).unwrap_or(false)
}

fn filter_rows(table: &SampleTable, offsets: ColumnOffsets, threshold: f64) -> Vec<FilteredRow> {
    table
        .rows
        .iter()
        .filter_map(|row| {
            let cell = row.get(offsets.fraction)?;
            if !passes_threshold(cell, threshold) {
                return None;
            }
            let fraction = cell.as_number()?;
            let chromosome = row
                .get(offsets.chromosome)
                .map(chromosome_label)
                .unwrap_or_else(|| "nan".to_string());
            let position = row.get(offsets.position).and_then(position_value);
            Some(FilteredRow {
                key: VariantKey::new(chromosome, position),
                fraction,
            })
        })
        .collect()
}

/// Number of distinct keys that occur more than once
fn count_duplicate_keys(rows: &[FilteredRow]) -> usize {
    let mut counts: HashMap<&VariantKey, usize> = HashMap::new();
    for key in rows.iter().filter_map(|r| r.key.as_ref()) {
        *counts.entry(key).or_insert(0) += 1;
    }
    counts.values().filter(|&&n| n > 1).count()
}

/// Filter both tables by allele fraction and inner-join them on
/// (chromosome, position).
///
/// Repeated keys produce every combination of matches, so the shared count
/// can exceed either filtered count; unique counts are floored at zero.
pub fn match_tables(
    table_a: &SampleTable,
    table_b: &SampleTable,
    config: &AnalysisConfig,
) -> ContamResult<MatchOutcome> {
    let offsets_a = ColumnOffsets::resolve(table_a, config)?;
    let offsets_b = ColumnOffsets::resolve(table_b, config)?;

    let filtered_a = filter_rows(table_a, offsets_a, config.threshold);
    let filtered_b = filter_rows(table_b, offsets_b, config.threshold);

    let mut index_b: HashMap<&VariantKey, Vec<f64>> = HashMap::new();
    for row in &filtered_b {
        if let Some(key) = row.key.as_ref() {
            index_b.entry(key).or_default().push(row.fraction);
        }
    }

    let mut shared = Vec::new();
    for row in &filtered_a {
        let Some(key) = row.key.as_ref() else {
            continue;
        };
        if let Some(fractions_b) = index_b.get(key) {
            for &fraction_b in fractions_b {
                shared.push(SharedVariant {
                    chromosome: key.chromosome.clone(),
                    position: key.position(),
                    fraction_a: row.fraction,
                    fraction_b,
                });
            }
        }
    }

    let duplicate_keys_a = count_duplicate_keys(&filtered_a);
    let duplicate_keys_b = count_duplicate_keys(&filtered_b);
    if duplicate_keys_a > 0 || duplicate_keys_b > 0 {
        log::warn!(
            "Repeated variant keys inflate shared count for '{}' ({}) vs '{}' ({})",
            table_a.name,
            duplicate_keys_a,
            table_b.name,
            duplicate_keys_b
        );
    }

    let shared_count = shared.len();
    Ok(MatchOutcome {
        filtered_a: filtered_a.len(),
        filtered_b: filtered_b.len(),
        unique_a: filtered_a.len().saturating_sub(shared_count),
        unique_b: filtered_b.len().saturating_sub(shared_count),
        duplicate_keys_a,
        duplicate_keys_b,
        shared,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AnalysisConfig {
        AnalysisConfig {
            chromosome_column: 1,
            position_column: 2,
            allele_fraction_column: 3,
            ..AnalysisConfig::default()
        }
    }

    fn table(name: &str, rows: &[(&str, Cell, Cell)]) -> SampleTable {
        SampleTable::new(
            name,
            Vec::new(),
            rows.iter()
                .map(|(c, p, f)| vec![Cell::from(*c), p.clone(), f.clone()])
                .collect(),
        )
    }

    #[test]
    fn test_variant_key() {
        assert!(VariantKey::new("1".into(), None).is_none());
        assert!(VariantKey::new("1".into(), Some(f64::NAN)).is_none());
        assert_eq!(
            VariantKey::new("1".into(), Some(-0.0)),
            VariantKey::new("1".into(), Some(0.0))
        );
        assert_ne!(
            VariantKey::new("1".into(), Some(100.0)),
            VariantKey::new("1".into(), Some(100.000001))
        );
    }

    #[test]
    fn test_passes_threshold() {
        assert!(passes_threshold(&Cell::Number(0.1), 0.1));
        assert!(!passes_threshold(&Cell::Number(0.05), 0.1));
        assert!(!passes_threshold(&Cell::Missing, 0.1));
        assert!(!passes_threshold(&Cell::from("high"), 0.1));
    }

    #[test]
    fn test_single_shared_variant() {
        let a = table("a.csv", &[("1", Cell::Number(100.0), Cell::Number(0.5))]);
        let b = table("b.csv", &[("1", Cell::Number(100.0), Cell::Number(0.3))]);

        let outcome = match_tables(&a, &b, &config()).unwrap();
        assert_eq!(outcome.shared_count(), 1);
        assert_eq!(outcome.unique_a, 0);
        assert_eq!(outcome.unique_b, 0);
        assert_eq!(outcome.shared[0].chromosome, "1");
        assert_eq!(outcome.shared[0].position, 100.0);
        assert_eq!(outcome.shared[0].fraction_a, 0.5);
        assert_eq!(outcome.shared[0].fraction_b, 0.3);
    }

    #[test]
    fn test_disjoint_tables() {
        let a = table("a.csv", &[("1", Cell::Number(100.0), Cell::Number(0.5))]);
        let b = table("b.csv", &[("2", Cell::Number(200.0), Cell::Number(0.5))]);

        let outcome = match_tables(&a, &b, &config()).unwrap();
        assert_eq!(outcome.shared_count(), 0);
        assert_eq!(outcome.unique_a, 1);
        assert_eq!(outcome.unique_b, 1);
    }

    #[test]
    fn test_below_threshold_excluded() {
        let a = table(
            "a.csv",
            &[("1", Cell::Number(100.0), Cell::Number(0.05)), ("1", Cell::Number(300.0), Cell::Number(0.4))],
        );
        let b = table("b.csv", &[("1", Cell::Number(100.0), Cell::Number(0.5))]);

        let outcome = match_tables(&a, &b, &config()).unwrap();
        assert_eq!(outcome.filtered_a, 1);
        assert_eq!(outcome.shared_count(), 0);
        assert_eq!(outcome.unique_a, 1);
        assert_eq!(outcome.unique_b, 1);
    }

    #[test]
    fn test_unparseable_position_counts_as_unique() {
        let a = table(
            "a.csv",
            &[("1", Cell::Missing, Cell::Number(0.5)), ("1", Cell::Number(100.0), Cell::Number(0.5))],
        );
        let b = table(
            "b.csv",
            &[("1", Cell::Missing, Cell::Number(0.5)), ("1", Cell::Number(100.0), Cell::Number(0.4))],
        );

        let outcome = match_tables(&a, &b, &config()).unwrap();
        assert_eq!(outcome.shared_count(), 1);
        assert_eq!(outcome.unique_a, 1);
        assert_eq!(outcome.unique_b, 1);
    }

    #[test]
    fn test_unparseable_fraction_excluded() {
        let a = table(
            "a.csv",
            &[("1", Cell::Number(100.0), Cell::Missing), ("1", Cell::Number(200.0), "high".into())],
        );
        let b = table("b.csv", &[("1", Cell::Number(100.0), Cell::Number(0.5))]);

        let outcome = match_tables(&a, &b, &config()).unwrap();
        assert_eq!(outcome.filtered_a, 0);
        assert_eq!(outcome.shared_count(), 0);
        assert_eq!(outcome.unique_a, 0);
    }

    #[test]
    fn test_duplicate_keys_cross_product() {
        let a = table(
            "a.csv",
            &[("1", Cell::Number(100.0), Cell::Number(0.5)), ("1", Cell::Number(100.0), Cell::Number(0.6))],
        );
        let b = table(
            "b.csv",
            &[
                ("1", Cell::Number(100.0), Cell::Number(0.2)),
                ("1", Cell::Number(100.0), Cell::Number(0.3)),
                ("1", Cell::Number(100.0), Cell::Number(0.4)),
            ],
        );

        let outcome = match_tables(&a, &b, &config()).unwrap();
        assert_eq!(outcome.shared_count(), 6);
        assert_eq!(outcome.unique_a, 0);
        assert_eq!(outcome.unique_b, 0);
        assert_eq!(outcome.duplicate_keys_a, 1);
        assert_eq!(outcome.duplicate_keys_b, 1);

        // Left order first, then right order within a key
        let pairs: Vec<(f64, f64)> = outcome
            .shared
            .iter()
            .map(|s| (s.fraction_a, s.fraction_b))
            .collect();
        assert_eq!(
            pairs,
            vec![(0.5, 0.2), (0.5, 0.3), (0.5, 0.4), (0.6, 0.2), (0.6, 0.3), (0.6, 0.4)]
        );
    }

    #[test]
    fn test_symmetric_up_to_swap() {
        let a = table(
            "a.csv",
            &[
                ("1", Cell::Number(100.0), Cell::Number(0.5)),
                ("2", Cell::Number(200.0), Cell::Number(0.2)),
                ("3", Cell::Number(300.0), Cell::Number(0.9)),
            ],
        );
        let b = table(
            "b.csv",
            &[("1", Cell::Number(100.0), Cell::Number(0.3)), ("3", Cell::Number(300.0), Cell::Number(0.1))],
        );

        let ab = match_tables(&a, &b, &config()).unwrap();
        let ba = match_tables(&b, &a, &config()).unwrap();
        assert_eq!(ab.shared_count(), ba.shared_count());
        assert_eq!(ab.unique_a, ba.unique_b);
        assert_eq!(ab.unique_b, ba.unique_a);
    }

    #[test]
    fn test_threshold_monotonic() {
        let a = table(
            "a.csv",
            &[
                ("1", Cell::Number(100.0), Cell::Number(0.15)),
                ("1", Cell::Number(200.0), Cell::Number(0.35)),
                ("1", Cell::Number(300.0), Cell::Number(0.55)),
            ],
        );
        let b = table(
            "b.csv",
            &[
                ("1", Cell::Number(100.0), Cell::Number(0.45)),
                ("1", Cell::Number(200.0), Cell::Number(0.25)),
                ("1", Cell::Number(400.0), Cell::Number(0.65)),
            ],
        );

        let mut previous: Option<MatchOutcome> = None;
        for threshold in [0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7] {
            let cfg = AnalysisConfig { threshold, ..config() };
            let outcome = match_tables(&a, &b, &cfg).unwrap();
            if let Some(prev) = previous {
                assert!(outcome.shared_count() <= prev.shared_count());
                assert!(outcome.filtered_a <= prev.filtered_a);
                assert!(outcome.filtered_b <= prev.filtered_b);
            }
            previous = Some(outcome);
        }
    }

    #[test]
    fn test_raising_threshold_can_grow_unique_count() {
        let a = table("a.csv", &[("1", Cell::Number(100.0), Cell::Number(0.5))]);
        let b = table("b.csv", &[("1", Cell::Number(100.0), Cell::Number(0.15))]);

        let low = match_tables(&a, &b, &AnalysisConfig { threshold: 0.1, ..config() }).unwrap();
        assert_eq!(low.shared_count(), 1);
        assert_eq!(low.unique_a, 0);

        let high = match_tables(&a, &b, &AnalysisConfig { threshold: 0.2, ..config() }).unwrap();
        assert_eq!(high.shared_count(), 0);
        assert_eq!(high.unique_a, 1);
    }

    #[test]
    fn test_file_chromosome_text_compared_exactly() {
        let parsed = |fields: [&str; 3]| fields.iter().map(|f| Cell::parse(f)).collect::<Vec<_>>();
        let a = SampleTable::new(
            "a.csv",
            Vec::new(),
            vec![parsed(["01", "100", "0.5"]), parsed(["X", "5", "0.5"])],
        );
        let b = SampleTable::new(
            "b.csv",
            Vec::new(),
            vec![parsed(["1", "100", "0.3"]), parsed(["X", "5", "0.5"])],
        );

        let outcome = match_tables(&a, &b, &config()).unwrap();
        assert_eq!(outcome.shared_count(), 1);
        assert_eq!(outcome.shared[0].chromosome, "X");
        assert_eq!(outcome.unique_a, 1);
        assert_eq!(outcome.unique_b, 1);
    }

    #[test]
    fn test_numeric_and_text_chromosome_match() {
        let a = SampleTable::new(
            "a.csv",
            Vec::new(),
            vec![vec![Cell::Number(17.0), Cell::Number(100.0), Cell::Number(0.5)]],
        );
        let b = table("b.csv", &[("17", "100".into(), Cell::Number(0.5))]);

        let outcome = match_tables(&a, &b, &config()).unwrap();
        assert_eq!(outcome.shared_count(), 1);
    }
}
