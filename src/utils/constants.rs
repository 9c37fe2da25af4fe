/// Columns every station file must carry
pub const REQUIRED_COLUMNS: [&str; 15] = [
    "year", "month", "day", "hour", "PM2.5", "PM10", "SO2", "NO2", "CO", "O3", "TEMP", "PRES",
    "DEWP", "RAIN", "WSPM",
];

/// Calendar columns carried alongside any column selection
pub const CALENDAR_COLUMNS: [&str; 4] = ["year", "month", "day", "hour"];

/// Derived and optional column names
pub const DATETIME_COLUMN: &str = "datetime";
pub const ROW_NUMBER_COLUMN: &str = "No";
pub const WIND_DIRECTION_COLUMN: &str = "wd";
pub const STATION_COLUMN: &str = "station";
pub const PM25_COLUMN: &str = "PM2.5";
pub const YEAR_COLUMN: &str = "year";

/// PM2.5 severity breakpoints (ug/m3)
pub const PM25_BREAKPOINTS: [f64; 7] = [0.0, 35.0, 75.0, 115.0, 150.0, 250.0, 500.0];
pub const PM25_CATEGORY_COLUMN: &str = "PM2.5_Category";

/// Rain intensity breakpoints (mm per hour)
pub const RAIN_BREAKPOINTS: [f64; 5] = [0.0, 1.0, 4.0, 8.0, 10.0];
pub const RAIN_INTENSITY_COLUMN: &str = "RAIN_Intensity";

/// Source file naming inside the PRSA archive: PRSA_Data_<station>_<range>.csv
pub const ARCHIVE_MEMBER_PREFIX: &str = "PRSA_Data_";
pub const DEFAULT_DATA_PATH: &str = "data/PRSA_Data_Wanliu_20130301-20170228.csv";
pub const DEFAULT_CONFIG_FILE: &str = "airquality";
pub const ENV_PREFIX: &str = "AQP";

/// Processing defaults
pub const DEFAULT_HISTOGRAM_BINS: usize = 30;
pub const MAX_HISTOGRAM_BINS: usize = 1000;
pub const DEFAULT_PREVIEW_ROWS: usize = 20;
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_BUFFER_SIZE: usize = 8192 * 16; // 128KB

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
