//! Persisting pair results as a comma-separated table

use crate::{
    utils::{ensure_parent_dirs, has_extension, is_gzipped},
    ContamError, ContamResult, PairResult,
};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Column headers of the persisted result table, in order
pub const RESULT_HEADERS: [&str; 8] = [
    "Primary Source",
    "File 1",
    "File 2",
    "Shared Mutations",
    "Unique to File 1",
    "Unique to File 2",
    "Contamination % (File 1 to File 2)",
    "Contamination % (File 2 to File 1)",
];

/// Serialize pair results to any writer, header row first
pub fn write_pair_results_to<W: Write>(results: &[PairResult], writer: W) -> ContamResult<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    // Written explicitly so an empty batch still gets a header row
    csv_writer.write_record(RESULT_HEADERS)?;
    for result in results {
        csv_writer.serialize(result)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Write pair results to a CSV file; a `.gz` path is gzip-compressed
pub fn write_pair_results(results: &[PairResult], output_path: &Path) -> ContamResult<()> {
    ensure_parent_dirs(output_path)?;
    let file = File::create(output_path)?;

    if has_extension(output_path, "gz") {
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        write_pair_results_to(results, &mut encoder)?;
        encoder.finish()?.flush()?;
    } else {
        write_pair_results_to(results, BufWriter::new(file))?;
    }

    log::info!("Wrote {} pair results to {:?}", results.len(), output_path);
    Ok(())
}

/// Parse pair results previously written by [`write_pair_results`]
pub fn read_pair_results<P: AsRef<Path>>(path: P) -> ContamResult<Vec<PairResult>> {
    let path = path.as_ref();
    let file = File::open(path)
        .map_err(|_| ContamError::FileNotFound(path.to_string_lossy().to_string()))?;

    let reader: Box<dyn Read> = if is_gzipped(path)? {
        Box::new(MultiGzDecoder::new(file))
    } else {
        Box::new(file)
    };

    let mut csv_reader = csv::Reader::from_reader(BufReader::new(reader));
    let mut results = Vec::new();
    for record in csv_reader.deserialize() {
        results.push(record?);
    }
    Ok(results)
}
