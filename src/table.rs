//! Sample tables and delimited-file loading

use crate::{utils::is_gzipped, ContamError, ContamResult};
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Field values read as missing rather than as text
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A typed table cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    /// A number read from a delimited field, keeping the field's text
    Numeric { value: f64, raw: String },
    Missing,
}

impl Cell {
    /// Type a raw delimited field: NA token, number, or free text.
    pub fn parse(raw: &str) -> Self {
        if NA_TOKENS.contains(&raw) {
            return Cell::Missing;
        }
        match raw.trim().parse::<f64>() {
            Ok(value) if value.is_nan() => Cell::Missing,
            Ok(value) => Cell::Numeric {
                value,
                raw: raw.to_string(),
            },
            Err(_) => Cell::Text(raw.to_string()),
        }
    }

    /// Numeric value of the cell, if it holds a non-NaN number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Number(value) | Cell::Numeric { value, .. } if !value.is_nan() => Some(*value),
            _ => None,
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Number(value)
    }
}

/// One input file's variant calls for a single sample
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl SampleTable {
    pub fn new(name: impl Into<String>, headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows,
        }
    }

    /// Number of columns: the header width, or the first row's width for
    /// tables built without a header.
    pub fn width(&self) -> usize {
        if !self.headers.is_empty() {
            self.headers.len()
        } else {
            self.rows.first().map(|row| row.len()).unwrap_or(0)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check that every row has the table's width
    pub fn validate_shape(&self) -> ContamResult<()> {
        let expected = self.width();
        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != expected {
                return Err(ContamError::RaggedTable {
                    table: self.name.clone(),
                    row: i + 1,
                    expected,
                    found: row.len(),
                });
            }
        }
        Ok(())
    }

    /// Convert a 1-based column index into a 0-based offset, checking bounds.
    ///
    /// A table with no rows and no header accepts any non-zero index.
    pub fn column_offset(&self, index: usize, column: &'static str) -> ContamResult<usize> {
        let width = self.width();
        let unbounded = width == 0 && self.rows.is_empty();
        let out_of_range = index == 0 || (!unbounded && index > width);
        if out_of_range {
            return Err(ContamError::InvalidColumnIndex {
                table: self.name.clone(),
                column,
                index,
                width,
            });
        }
        Ok(index - 1)
    }
}

/// Type one record, padding a short record with missing cells up to `width`.
///
/// Records wider than the header are rejected.
fn parse_record(
    record: &csv::StringRecord,
    width: usize,
    table: &str,
    row: usize,
) -> ContamResult<Vec<Cell>> {
    if record.len() > width {
        return Err(ContamError::RaggedTable {
            table: table.to_string(),
            row,
            expected: width,
            found: record.len(),
        });
    }
    let mut cells: Vec<Cell> = record.iter().map(Cell::parse).collect();
    cells.resize(width, Cell::Missing);
    Ok(cells)
}

/// Read a comma-separated sample table with a header row.
///
/// Gzip-compressed input is detected by magic bytes. The table is named
/// after the file's base name. Short rows are filled with missing cells.
pub fn read_sample_table<P: AsRef<Path>>(path: P) -> ContamResult<SampleTable> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|_| ContamError::FileNotFound(path.to_string_lossy().to_string()))?;

    let reader: Box<dyn Read> = if is_gzipped(path)? {
        Box::new(MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(reader));

    let headers: Vec<String> = csv_reader.headers()?.iter().map(|h| h.to_string()).collect();

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string());

    let mut rows = Vec::new();
    let mut padded = 0usize;
    for (i, result) in csv_reader.records().enumerate() {
        let record = result?;
        if record.len() < headers.len() {
            padded += 1;
        }
        rows.push(parse_record(&record, headers.len(), &name, i + 1)?);
    }

    if padded > 0 {
        log::warn!("{}: {} short rows filled with missing values", name, padded);
    }

    let table = SampleTable::new(name, headers, rows);

    log::debug!("Read {} rows from {:?}", table.len(), path);
    Ok(table)
}

/// Read every table in input order
pub fn read_sample_tables<P: AsRef<Path>>(paths: &[P]) -> ContamResult<Vec<SampleTable>> {
    paths.iter().map(read_sample_table).collect()
}
