use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::analyzers::AirQualityAnalyzer;
use crate::cli::args::{Cli, Commands, RangeArgs};
use crate::config::{OutputFormat, Settings};
use crate::dashboard::{Dashboard, Request, Response};
use crate::error::{PipelineError, Result};
use crate::models::{Measure, RainIntensity};
use crate::processors::{DateRange, FilterCriteria};
use crate::readers::ArchiveReader;
use crate::store::{DataSource, DataStore};
use crate::utils::progress::ProgressReporter;
use crate::writers::{ParquetWriter, ReportWriter};

pub fn run(cli: Cli) -> Result<()> {
    let settings = resolve_settings(&cli)?;

    if let Commands::Stations = cli.command {
        return list_stations(&settings);
    }

    let store = load_store(&settings)?;
    let dashboard = Dashboard::new(&store);
    let writer = ReportWriter::new()
        .with_format(settings.format)
        .with_max_rows(settings.preview_rows);

    match cli.command {
        Commands::Overview { range } => {
            let response = dashboard.handle(Request::Overview {
                range: resolve_range(&range, &store)?,
            })?;
            emit(&writer, &response)?;
        }

        Commands::Summary { range } => {
            let table = match resolve_range(&range, &store)? {
                Some(range) => FilterCriteria::new()
                    .with_date_range(range)
                    .apply(store.table())?,
                None => store.table().clone(),
            };
            if table.is_empty() {
                warn!("no observations in the selected range");
                println!("No data in the selected range");
                return Ok(());
            }

            let stats = AirQualityAnalyzer::new().analyze(&table)?;
            match settings.format {
                OutputFormat::Text => println!("{}", stats.detailed_summary()),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stats)?),
            }
        }

        Commands::Describe { range, columns } => {
            let response = dashboard.handle(Request::Describe {
                range: resolve_range(&range, &store)?,
                columns: or_default_columns(columns, &settings),
            })?;
            emit(&writer, &response)?;
        }

        Commands::Correlate { range, columns } => {
            let response = dashboard.handle(Request::Correlation {
                range: resolve_range(&range, &store)?,
                columns: or_default_columns(columns, &settings),
            })?;
            emit(&writer, &response)?;
        }

        Commands::Scatter {
            range,
            covariate,
            limit,
        } => {
            let covariate: Measure = covariate.parse()?;
            let response = dashboard.handle(Request::Scatter {
                range: resolve_range(&range, &store)?,
                covariate,
            })?;
            emit(&with_limit(writer, limit), &response)?;
        }

        Commands::Histogram {
            range,
            column,
            bins,
        } => {
            let response = dashboard.handle(Request::Histogram {
                range: resolve_range(&range, &store)?,
                column,
                bins: bins.map(usize::from).unwrap_or(settings.histogram_bins),
            })?;
            // every bin is printed
            emit(&writer.with_max_rows(usize::MAX), &response)?;
        }

        Commands::Explore {
            range,
            pm25_min,
            pm25_max,
            rain,
            columns,
            limit,
        } => {
            let mut criteria = FilterCriteria::new().with_columns(columns);
            if let Some(range) = resolve_range(&range, &store)? {
                criteria = criteria.with_date_range(range);
            }
            if pm25_min.is_some() || pm25_max.is_some() {
                criteria = criteria.with_pm25_range(
                    pm25_min.unwrap_or(0.0),
                    pm25_max.unwrap_or(f64::INFINITY),
                );
            }
            let rain = rain
                .iter()
                .map(|r| r.parse::<RainIntensity>())
                .collect::<Result<Vec<_>>>()?;
            criteria = criteria.with_rain(rain);

            let response = dashboard.handle(Request::Explore { criteria })?;
            emit(&with_limit(writer, limit), &response)?;
        }

        Commands::Categories { range } => {
            let response = dashboard.handle(Request::Categories {
                range: resolve_range(&range, &store)?,
            })?;
            emit(&writer, &response)?;
        }

        Commands::Export {
            range,
            output,
            columns,
            compression,
        } => {
            let mut criteria = FilterCriteria::new().with_columns(columns);
            if let Some(range) = resolve_range(&range, &store)? {
                criteria = criteria.with_date_range(range);
            }
            let table = criteria.apply(store.table())?;
            if table.is_empty() {
                warn!("exporting an empty selection");
            }

            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }

            if is_json(&output) {
                let mut file = BufWriter::new(File::create(&output)?);
                serde_json::to_writer_pretty(&mut file, &table)?;
                file.flush()?;
                println!(
                    "Wrote {} rows to {}",
                    table.row_count(),
                    output.display()
                );
            } else {
                let parquet = ParquetWriter::new().with_compression(&compression)?;
                parquet.write_table(&table, &output)?;
                let file_info = parquet.get_file_info(&output)?;
                println!("{}", file_info.summary());
            }
        }

        // listed before the store is loaded
        Commands::Stations => {}
    }

    Ok(())
}

/// Settings file and environment, then command-line overrides
fn resolve_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(cli.config.as_deref())?;

    if let Some(data) = &cli.data {
        settings.data_path = data.clone();
    }
    if let Some(station) = &cli.station {
        settings.station = Some(station.clone());
    }
    if let Some(format) = cli.format {
        settings.format = format;
    }
    if cli.mmap {
        settings.use_mmap = true;
    }
    Ok(settings)
}

fn load_store(settings: &Settings) -> Result<DataStore> {
    let source = DataSource::from_path(&settings.data_path, settings.station.as_deref())?;

    let progress = ProgressReporter::new_spinner(
        &format!("Loading {}...", source),
        settings.format == OutputFormat::Json,
    );
    let store = DataStore::load(&source, settings.use_mmap)?;
    progress.finish_and_clear();

    info!(rows = store.row_count(), "store ready");
    Ok(store)
}

fn list_stations(settings: &Settings) -> Result<()> {
    let stations = ArchiveReader::new().list_stations(&settings.data_path)?;
    match settings.format {
        OutputFormat::Text => {
            for station in &stations {
                println!("{}", station);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stations)?),
    }
    Ok(())
}

/// Fill missing range bounds from the dataset's first and last day.
fn resolve_range(range: &RangeArgs, store: &DataStore) -> Result<Option<DateRange>> {
    if range.from.is_none() && range.to.is_none() {
        return Ok(None);
    }

    let bounds = store.date_bounds()?;
    let start = range
        .from
        .or_else(|| bounds.map(|(first, _)| first.date()));
    let end = range.to.or_else(|| bounds.map(|(_, last)| last.date()));

    match (start, end) {
        (Some(start), Some(end)) => Ok(Some(DateRange::from_dates(start, end)?)),
        _ => Err(PipelineError::InvalidCriteria(
            "Both --from and --to are required for an empty dataset".to_string(),
        )),
    }
}

fn or_default_columns(columns: Vec<String>, settings: &Settings) -> Vec<String> {
    if columns.is_empty() {
        settings.columns.clone()
    } else {
        columns
    }
}

fn with_limit(writer: ReportWriter, limit: Option<usize>) -> ReportWriter {
    match limit {
        Some(limit) => writer.with_max_rows(limit),
        None => writer,
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

fn emit(writer: &ReportWriter, response: &Response) -> Result<()> {
    println!("{}", writer.render(response)?);
    Ok(())
}
