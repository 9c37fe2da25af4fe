use crate::error::{PipelineError, Result};
use crate::models::{ObservationRecord, Table};
use crate::readers::ObservationReader;
use crate::utils::constants::ARCHIVE_MEMBER_PREFIX;
use std::fs::File;
use std::path::Path;
use tracing::info;
use zip::ZipArchive;

/// Reads station files out of the PRSA zip archive
/// (`PRSA_Data_<station>_<range>.csv`, one per station).
pub struct ArchiveReader {
    reader: ObservationReader,
}

impl ArchiveReader {
    pub fn new() -> Self {
        Self {
            reader: ObservationReader::new(),
        }
    }

    pub fn with_reader(reader: ObservationReader) -> Self {
        Self { reader }
    }

    /// Station names present in the archive, sorted
    pub fn list_stations(&self, zip_path: &Path) -> Result<Vec<String>> {
        let file = File::open(zip_path)?;
        let archive = ZipArchive::new(file)?;

        let mut stations: Vec<String> = archive
            .file_names()
            .filter_map(station_from_member)
            .map(str::to_string)
            .collect();
        stations.sort();
        stations.dedup();
        Ok(stations)
    }

    pub fn read_station(&self, zip_path: &Path, station: &str) -> Result<Vec<ObservationRecord>> {
        let file = File::open(zip_path)?;
        let mut archive = ZipArchive::new(file)?;

        let member = archive
            .file_names()
            .find(|name| {
                station_from_member(name)
                    .map(|s| s.eq_ignore_ascii_case(station))
                    .unwrap_or(false)
            })
            .map(str::to_string)
            .ok_or_else(|| {
                PipelineError::InvalidFormat(format!(
                    "No file for station '{}' in archive {}",
                    station,
                    zip_path.display()
                ))
            })?;

        info!(archive = %zip_path.display(), member = %member, "reading station from archive");
        let entry = archive.by_name(&member)?;
        self.reader.read_from(entry)
    }

    pub fn read_station_table(&self, zip_path: &Path, station: &str) -> Result<Table> {
        let records = self.read_station(zip_path, station)?;
        Table::from_observations(&records)
    }
}

impl Default for ArchiveReader {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the station name from a member path such as
/// `PRSA_Data_20130301-20170228/PRSA_Data_Wanliu_20130301-20170228.csv`
fn station_from_member(member: &str) -> Option<&str> {
    let file_name = member.rsplit('/').next()?;
    let rest = file_name
        .strip_suffix(".csv")?
        .strip_prefix(ARCHIVE_MEMBER_PREFIX)?;
    let (station, _range) = rest.split_once('_')?;
    (!station.is_empty()).then_some(station)
}
