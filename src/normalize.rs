//! Coercion of chromosome and position columns into a comparable key space

use crate::{AnalysisConfig, Cell, ContamResult, SampleTable};

/// Largest magnitude at which every integral f64 is printed exactly as an integer
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Canonical string form of a chromosome cell.
///
/// Cells read from a file keep their field text exactly, so `"01"` and `"1"`
/// stay distinct. In-memory integral numbers print without a fractional
/// part, so `17` and `"17"` produce the same label. Missing cells become
/// `"nan"`.
pub fn chromosome_label(cell: &Cell) -> String {
    match cell {
        Cell::Text(text) | Cell::Numeric { raw: text, .. } => text.clone(),
        Cell::Number(value) if value.is_nan() => "nan".to_string(),
        Cell::Number(value) if value.fract() == 0.0 && value.abs() <= MAX_EXACT_INTEGER => {
            format!("{}", *value as i64)
        }
        Cell::Number(value) => value.to_string(),
        Cell::Missing => "nan".to_string(),
    }
}

/// Numeric form of a position cell; `None` is the unparseable sentinel.
pub fn position_value(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(value) | Cell::Numeric { value, .. } if !value.is_nan() => Some(*value),
        Cell::Number(_) | Cell::Numeric { .. } | Cell::Missing => None,
        Cell::Text(text) => text.trim().parse::<f64>().ok().filter(|v| !v.is_nan()),
    }
}

/// Rewrite the chromosome column as text and the position column as numbers.
///
/// Column indices are 1-based. Unparseable positions become `Cell::Missing`;
/// no row is ever dropped and no other column is touched.
pub fn normalize(
    table: &mut SampleTable,
    chromosome_column: usize,
    position_column: usize,
) -> ContamResult<()> {
    let chrom_idx = table.column_offset(chromosome_column, "chromosome")?;
    let pos_idx = table.column_offset(position_column, "position")?;

    if table.is_empty() {
        return Ok(());
    }
    table.validate_shape()?;

    let mut unparseable = 0usize;
    for row in table.rows.iter_mut() {
        row[chrom_idx] = Cell::Text(chromosome_label(&row[chrom_idx]));
        row[pos_idx] = match position_value(&row[pos_idx]) {
            Some(position) => Cell::Number(position),
            None => {
                unparseable += 1;
                Cell::Missing
            }
        };
    }

    if unparseable > 0 {
        log::debug!(
            "Table '{}': {} of {} positions are not numeric",
            table.name,
            unparseable,
            table.len()
        );
    }

    Ok(())
}

/// Normalize using the columns named in an analysis configuration
pub fn normalize_with_config(table: &mut SampleTable, config: &AnalysisConfig) -> ContamResult<()> {
    normalize(table, config.chromosome_column, config.position_column)
}
