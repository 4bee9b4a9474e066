use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use csv::ReaderBuilder;
use tracing::{debug, info};

use crate::store::RawRow;
use crate::DataError;

/// CSV ingestion: the header line names the fields of every row
pub struct CsvSource {
    /// Path to the CSV file
    path: PathBuf,
}

impl CsvSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every row of the file
    pub fn read_rows(&self) -> Result<Vec<RawRow>, DataError> {
        let file = File::open(&self.path)?;
        let rows = Self::rows_from_reader(BufReader::new(file))?;
        info!("Read {} rows from {}", rows.len(), self.source_name());
        Ok(rows)
    }

    /// Read rows from any CSV text source
    pub fn rows_from_reader<R: Read>(reader: R) -> Result<Vec<RawRow>, DataError> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        debug!("CSV headers: {:?}", headers);

        let mut rows = Vec::new();
        for result in csv_reader.records() {
            let record = result?;
            rows.push(headers.iter().zip(record.iter()).collect::<RawRow>());
        }
        Ok(rows)
    }

    pub fn source_name(&self) -> &str {
        self.path.file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown.csv")
    }
}
