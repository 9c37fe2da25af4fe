use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::OutputFormat;

#[derive(Parser)]
#[command(name = "aqp")]
#[command(about = "Hourly air-quality analysis for PRSA station data")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(
        short,
        long,
        global = true,
        help = "Input CSV file or PRSA zip archive [default: from settings]"
    )]
    pub data: Option<PathBuf>,

    #[arg(long, global = true, help = "Station to read from a zip archive")]
    pub station: Option<String>,

    #[arg(short, long, global = true, help = "Settings file [default: ./airquality.toml]")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, value_enum, help = "Output format")]
    pub format: Option<OutputFormat>,

    #[arg(long, global = true, help = "Memory-map the input CSV")]
    pub mmap: bool,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,
}

/// Inclusive calendar-day range; a missing bound defaults to the dataset's.
#[derive(Args, Debug, Clone, Default)]
pub struct RangeArgs {
    #[arg(long, help = "First day (YYYY-MM-DD)")]
    pub from: Option<NaiveDate>,

    #[arg(long, help = "Last day (YYYY-MM-DD)")]
    pub to: Option<NaiveDate>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Yearly PM2.5 mean and PM2.5 category distribution
    Overview {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Dataset overview: coverage, measure extremes and completeness
    Summary {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Descriptive statistics for measure columns
    Describe {
        #[command(flatten)]
        range: RangeArgs,

        #[arg(short = 'C', long, value_delimiter = ',', help = "Columns, e.g. PM2.5,PM10")]
        columns: Vec<String>,
    },

    /// Correlation matrix between measure columns
    Correlate {
        #[command(flatten)]
        range: RangeArgs,

        #[arg(short = 'C', long, value_delimiter = ',', help = "Columns, e.g. PM2.5,TEMP")]
        columns: Vec<String>,
    },

    /// PM2.5 against one covariate
    Scatter {
        #[command(flatten)]
        range: RangeArgs,

        #[arg(help = "Covariate: PM10, SO2, NO2, CO, O3, TEMP, PRES, DEWP, RAIN or WSPM")]
        covariate: String,

        #[arg(long, help = "Number of points to print [default: from settings]")]
        limit: Option<usize>,
    },

    /// Equal-width histogram of one column
    Histogram {
        #[command(flatten)]
        range: RangeArgs,

        #[arg(default_value = "PM2.5")]
        column: String,

        #[arg(
            short,
            long,
            value_parser = clap::value_parser!(u16).range(1..=1000),
            help = "Number of bins, 1 to 1000 [default: from settings]"
        )]
        bins: Option<u16>,
    },

    /// Filter observations by date, PM2.5 level and rain intensity
    Explore {
        #[command(flatten)]
        range: RangeArgs,

        #[arg(long)]
        pm25_min: Option<f64>,

        #[arg(long)]
        pm25_max: Option<f64>,

        #[arg(
            long,
            value_delimiter = ',',
            help = "Rain intensities: no-rain, light, moderate, heavy"
        )]
        rain: Vec<String>,

        #[arg(short = 'C', long, value_delimiter = ',')]
        columns: Vec<String>,

        #[arg(long, help = "Number of rows to print [default: from settings]")]
        limit: Option<usize>,
    },

    /// Row counts per PM2.5 category and rain intensity
    Categories {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Write the filtered observations to Parquet or JSON
    Export {
        #[command(flatten)]
        range: RangeArgs,

        #[arg(short, long, help = "Output file; a .json extension writes JSON")]
        output: PathBuf,

        #[arg(short = 'C', long, value_delimiter = ',')]
        columns: Vec<String>,

        #[arg(long, default_value = "snappy")]
        compression: String,
    },

    /// List the stations contained in a PRSA zip archive
    Stations,
}
