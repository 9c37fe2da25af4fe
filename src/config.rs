use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use tracing::debug;
use validator::Validate;

use crate::error::Result;
use crate::utils::constants::{
    DEFAULT_CONFIG_FILE, DEFAULT_DATA_PATH, DEFAULT_HISTOGRAM_BINS, DEFAULT_PREVIEW_ROWS,
    ENV_PREFIX,
};

/// How command results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Settings {
    pub data_path: PathBuf,
    /// Station to read when `data_path` is a zip archive
    pub station: Option<String>,
    /// Columns used by `describe` and `correlate` when none are given
    pub columns: Vec<String>,
    #[validate(range(min = 1, max = 1000))]
    pub histogram_bins: usize,
    /// Rows printed per table in text output
    pub preview_rows: usize,
    pub format: OutputFormat,
    pub use_mmap: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            station: None,
            columns: Vec::new(),
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            format: OutputFormat::Text,
            use_mmap: false,
        }
    }
}

impl Settings {
    /// Layer `airquality.toml` (or `file`) and `AQP_*` variables over the defaults.
    ///
    /// An explicit `file` must exist; the default file is optional.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        builder = match file {
            Some(path) => builder.add_source(File::from(path)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("columns"),
            )
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        debug!(?settings, "settings loaded");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.data_path, PathBuf::from(DEFAULT_DATA_PATH));
        assert_eq!(settings.histogram_bins, DEFAULT_HISTOGRAM_BINS);
        assert_eq!(settings.format, OutputFormat::Text);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let mut file = Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "data_path = \"PRSA2017.zip\"")?;
        writeln!(file, "station = \"Wanliu\"")?;
        writeln!(file, "columns = [\"PM2.5\", \"TEMP\"]")?;
        writeln!(file, "format = \"json\"")?;
        file.flush()?;

        let settings = Settings::load(Some(file.path()))?;

        assert_eq!(settings.data_path, PathBuf::from("PRSA2017.zip"));
        assert_eq!(settings.station.as_deref(), Some("Wanliu"));
        assert_eq!(settings.columns, vec!["PM2.5", "TEMP"]);
        assert_eq!(settings.format, OutputFormat::Json);
        // untouched keys keep their defaults
        assert_eq!(settings.histogram_bins, DEFAULT_HISTOGRAM_BINS);
        Ok(())
    }

    #[test]
    fn test_zero_bins_rejected() -> Result<()> {
        let mut file = Builder::new().suffix(".toml").tempfile()?;
        writeln!(file, "histogram_bins = 0")?;
        file.flush()?;

        assert!(Settings::load(Some(file.path())).is_err());
        Ok(())
    }

    #[test]
    fn test_missing_explicit_file() {
        assert!(Settings::load(Some(Path::new("/nonexistent/airquality.toml"))).is_err());
    }
}
