use crate::error::{PipelineError, Result};
use crate::models::{ObservationRecord, Table};
use crate::utils::constants::{DEFAULT_BUFFER_SIZE, REQUIRED_COLUMNS};
use memmap2::Mmap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info};
use validator::Validate;

/// Reads PRSA station CSV files into observation records.
pub struct ObservationReader {
    delimiter: u8,
    use_mmap: bool,
}

impl ObservationReader {
    pub fn new() -> Self {
        Self {
            delimiter: b',',
            use_mmap: false,
        }
    }

    pub fn with_delimiter(delimiter: u8) -> Self {
        Self {
            delimiter,
            use_mmap: false,
        }
    }

    pub fn with_mmap(use_mmap: bool) -> Self {
        Self {
            delimiter: b',',
            use_mmap,
        }
    }

    /// Read a station file and derive the `datetime` column
    pub fn read_table(&self, path: &Path) -> Result<Table> {
        let records = self.read_observations(path)?;
        Table::from_observations(&records)
    }

    /// Read all observation rows from a file
    pub fn read_observations(&self, path: &Path) -> Result<Vec<ObservationRecord>> {
        info!(path = %path.display(), mmap = self.use_mmap, "reading observations");
        if self.use_mmap {
            self.read_observations_mmap(path)
        } else {
            self.read_observations_buffered(path)
        }
    }

    fn read_observations_buffered(&self, path: &Path) -> Result<Vec<ObservationRecord>> {
        let file = File::open(path)?;
        let reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file);
        self.read_from(reader)
    }

    /// Read observations using memory-mapped I/O for large files
    fn read_observations_mmap(&self, path: &Path) -> Result<Vec<ObservationRecord>> {
        let file = File::open(path)?;
        let mmap = unsafe { Mmap::map(&file)? };
        self.read_from(&mmap[..])
    }

    /// Parse observations from any CSV byte source (plain file, mmap, archive entry)
    pub fn read_from<R: Read>(&self, source: R) -> Result<Vec<ObservationRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .flexible(false)
            .from_reader(source);

        let headers = reader.headers()?.clone();
        check_required_columns(&headers)?;

        let mut records = Vec::new();
        for (index, result) in reader.deserialize::<ObservationRecord>().enumerate() {
            // header is line 1
            let line = index + 2;
            let record = result.map_err(|e| match e.kind() {
                csv::ErrorKind::Deserialize { .. } => {
                    PipelineError::InvalidFormat(format!("line {}: {}", line, e))
                }
                _ => PipelineError::Csv(e),
            })?;

            record.validate().map_err(|e| {
                PipelineError::InvalidFormat(format!("line {}: {}", line, e))
            })?;
            record.datetime().map_err(|e| {
                PipelineError::InvalidFormat(format!("line {}: {}", line, e))
            })?;

            records.push(record);
        }

        debug!(rows = records.len(), "parsed observation rows");
        Ok(records)
    }
}

impl Default for ObservationReader {
    fn default() -> Self {
        Self::new()
    }
}

fn check_required_columns(headers: &csv::StringRecord) -> Result<()> {
    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == required) {
            return Err(PipelineError::MissingColumn(required.to_string()));
        }
    }
    Ok(())
}
