use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::models::Table;
use crate::readers::{ArchiveReader, ObservationReader};

/// Where the dataset comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Csv(PathBuf),
    /// One station file inside the PRSA zip archive
    Archive { path: PathBuf, station: String },
}

impl DataSource {
    /// Pick the source kind from the file extension; a `.zip` needs a station.
    pub fn from_path(path: &Path, station: Option<&str>) -> Result<Self> {
        let is_zip = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("zip"))
            .unwrap_or(false);

        if is_zip {
            let station = station.ok_or_else(|| {
                PipelineError::InvalidCriteria(format!(
                    "A station name is required to read archive {}",
                    path.display()
                ))
            })?;
            Ok(DataSource::Archive {
                path: path.to_path_buf(),
                station: station.to_string(),
            })
        } else {
            Ok(DataSource::Csv(path.to_path_buf()))
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            DataSource::Csv(path) => path,
            DataSource::Archive { path, .. } => path,
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Csv(path) => write!(f, "{}", path.display()),
            DataSource::Archive { path, station } => {
                write!(f, "{} [{}]", path.display(), station)
            }
        }
    }
}

/// The loaded dataset, read once at start-up and shared read-only.
#[derive(Debug, Clone)]
pub struct DataStore {
    source: Option<DataSource>,
    table: Table,
}

impl DataStore {
    pub fn load(source: &DataSource, use_mmap: bool) -> Result<Self> {
        let reader = ObservationReader::with_mmap(use_mmap);
        let table = match source {
            DataSource::Csv(path) => reader.read_table(path)?,
            DataSource::Archive { path, station } => {
                ArchiveReader::with_reader(reader).read_station_table(path, station)?
            }
        };

        info!(source = %source, rows = table.row_count(), "dataset loaded");
        Ok(Self {
            source: Some(source.clone()),
            table,
        })
    }

    /// Wrap an already built table
    pub fn from_table(table: Table) -> Self {
        Self {
            source: None,
            table,
        }
    }

    pub fn source(&self) -> Option<&DataSource> {
        self.source.as_ref()
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// First and last observation time
    pub fn date_bounds(&self) -> Result<Option<(NaiveDateTime, NaiveDateTime)>> {
        self.table.datetime_bounds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_source_from_path() -> Result<()> {
        assert_eq!(
            DataSource::from_path(Path::new("data/wanliu.csv"), None)?,
            DataSource::Csv(PathBuf::from("data/wanliu.csv"))
        );
        assert_eq!(
            DataSource::from_path(Path::new("PRSA2017.ZIP"), Some("Wanliu"))?,
            DataSource::Archive {
                path: PathBuf::from("PRSA2017.ZIP"),
                station: "Wanliu".to_string()
            }
        );
        assert!(DataSource::from_path(Path::new("PRSA2017.zip"), None).is_err());
        Ok(())
    }

    #[test]
    fn test_load_csv_store() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "year,month,day,hour,PM2.5,PM10,SO2,NO2,CO,O3,TEMP,PRES,DEWP,RAIN,WSPM")?;
        writeln!(file, "2013,3,1,0,8,8,6,28,400,52,-0.7,1023,-18.8,0,4.4")?;
        writeln!(file, "2017,2,28,23,12,30,5,60,900,40,5.1,1013,-9.3,0,1.2")?;

        let store = DataStore::load(&DataSource::Csv(file.path().to_path_buf()), false)?;

        assert_eq!(store.row_count(), 2);
        let (first, last) = store.date_bounds()?.unwrap();
        assert_eq!(first.to_string(), "2013-03-01 00:00:00");
        assert_eq!(last.to_string(), "2017-02-28 23:00:00");
        assert!(store.source().is_some());
        Ok(())
    }
}
