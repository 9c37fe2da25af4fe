use crate::error::{PipelineError, Result};
use crate::models::{Column, ColumnData, Table};
use crate::utils::constants::{
    COMPRESSION_GZIP, COMPRESSION_LZ4, COMPRESSION_NONE, COMPRESSION_SNAPPY, COMPRESSION_ZSTD,
    DEFAULT_ROW_GROUP_SIZE,
};
use arrow::array::*;
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, NaiveDateTime};
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, GzipLevel};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub struct ParquetWriter {
    compression: Compression,
    row_group_size: usize,
}

impl ParquetWriter {
    pub fn new() -> Self {
        Self {
            compression: Compression::SNAPPY,
            row_group_size: DEFAULT_ROW_GROUP_SIZE,
        }
    }

    pub fn with_compression(mut self, compression: &str) -> Result<Self> {
        self.compression = match compression.to_lowercase().as_str() {
            COMPRESSION_SNAPPY => Compression::SNAPPY,
            COMPRESSION_GZIP => Compression::GZIP(GzipLevel::default()),
            COMPRESSION_LZ4 => Compression::LZ4,
            COMPRESSION_ZSTD => Compression::ZSTD(parquet::basic::ZstdLevel::default()),
            COMPRESSION_NONE => Compression::UNCOMPRESSED,
            _ => {
                return Err(PipelineError::Export(format!(
                    "Unsupported compression: {}",
                    compression
                )))
            }
        };
        Ok(self)
    }

    pub fn with_row_group_size(mut self, size: usize) -> Self {
        self.row_group_size = size.max(1);
        self
    }

    /// Write a result table, one record batch per row group
    pub fn write_table(&self, table: &Table, path: &Path) -> Result<()> {
        let schema = self.create_schema(table);
        let file = File::create(path)?;
        let props = WriterProperties::builder()
            .set_compression(self.compression)
            .set_max_row_group_size(self.row_group_size)
            .build();

        let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;

        let mut start = 0;
        while start < table.row_count() {
            let end = (start + self.row_group_size).min(table.row_count());
            let rows: Vec<usize> = (start..end).collect();
            let batch = self.table_to_batch(&table.take_rows(&rows), schema.clone())?;
            writer.write(&batch)?;
            start = end;
        }

        writer.close()?;
        info!(
            path = %path.display(),
            rows = table.row_count(),
            columns = table.columns().len(),
            "wrote parquet file"
        );
        Ok(())
    }

    /// Arrow schema derived from the column kinds; every column is nullable
    /// except the timestamp.
    fn create_schema(&self, table: &Table) -> Arc<Schema> {
        let fields: Vec<Field> = table
            .columns()
            .iter()
            .map(|column| match &column.data {
                ColumnData::DateTime(_) => Field::new(
                    column.name.as_str(),
                    DataType::Timestamp(TimeUnit::Second, None),
                    false,
                ),
                ColumnData::Numeric(_) => Field::new(column.name.as_str(), DataType::Float64, true),
                ColumnData::Categorical(_) => {
                    Field::new(column.name.as_str(), DataType::Utf8, true)
                }
            })
            .collect();

        Arc::new(Schema::new(fields))
    }

    fn table_to_batch(&self, table: &Table, schema: Arc<Schema>) -> Result<RecordBatch> {
        let arrays: Vec<ArrayRef> = table
            .columns()
            .iter()
            .map(|column| -> ArrayRef {
                match &column.data {
                    ColumnData::DateTime(values) => Arc::new(TimestampSecondArray::from(
                        values
                            .iter()
                            .map(|dt| dt.and_utc().timestamp())
                            .collect::<Vec<i64>>(),
                    )),
                    ColumnData::Numeric(values) => Arc::new(Float64Array::from(values.clone())),
                    ColumnData::Categorical(values) => Arc::new(StringArray::from(
                        values.iter().map(|v| v.as_deref()).collect::<Vec<_>>(),
                    )),
                }
            })
            .collect();

        Ok(RecordBatch::try_new(schema, arrays)?)
    }

    /// Read an exported file back into a table
    pub fn read_table(&self, path: &Path) -> Result<Table> {
        use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

        let file = File::open(path)?;
        let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
        let schema = builder.schema().clone();
        let parquet_reader = builder.build()?;

        let mut data: Vec<ColumnData> = schema
            .fields()
            .iter()
            .map(|field| match field.data_type() {
                DataType::Timestamp(_, _) => Ok(ColumnData::DateTime(Vec::new())),
                DataType::Float64 => Ok(ColumnData::Numeric(Vec::new())),
                DataType::Utf8 => Ok(ColumnData::Categorical(Vec::new())),
                other => Err(PipelineError::Export(format!(
                    "Unsupported column type {} for '{}'",
                    other,
                    field.name()
                ))),
            })
            .collect::<Result<_>>()?;

        for batch_result in parquet_reader {
            let batch = batch_result?;
            for (index, target) in data.iter_mut().enumerate() {
                let array = batch.column(index);
                let name = schema.field(index).name();
                match target {
                    ColumnData::DateTime(values) => {
                        let seconds = array
                            .as_any()
                            .downcast_ref::<TimestampSecondArray>()
                            .ok_or_else(|| invalid_column(name))?;
                        for i in 0..seconds.len() {
                            values.push(to_datetime(seconds.value(i))?);
                        }
                    }
                    ColumnData::Numeric(values) => {
                        let numbers = array
                            .as_any()
                            .downcast_ref::<Float64Array>()
                            .ok_or_else(|| invalid_column(name))?;
                        values.extend(numbers.iter());
                    }
                    ColumnData::Categorical(values) => {
                        let labels = array
                            .as_any()
                            .downcast_ref::<StringArray>()
                            .ok_or_else(|| invalid_column(name))?;
                        values.extend(labels.iter().map(|l| l.map(str::to_string)));
                    }
                }
            }
        }

        Table::from_columns(
            schema
                .fields()
                .iter()
                .zip(data)
                .map(|(field, data)| Column::new(field.name().as_str(), data))
                .collect(),
        )
    }

    /// Get file statistics
    pub fn get_file_info(&self, path: &Path) -> Result<ParquetFileInfo> {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file)?;
        let metadata = reader.metadata();

        let file_metadata = metadata.file_metadata();
        let row_groups = metadata.num_row_groups();
        let total_rows = file_metadata.num_rows();
        let file_size = std::fs::metadata(path)?.len();

        let mut row_group_sizes = Vec::new();
        for i in 0..row_groups {
            let rg_metadata = metadata.row_group(i);
            row_group_sizes.push(rg_metadata.num_rows());
        }

        Ok(ParquetFileInfo {
            total_rows,
            row_groups: row_groups as i32,
            row_group_sizes,
            file_size,
            compression: self.compression,
        })
    }
}

fn invalid_column(name: &str) -> PipelineError {
    PipelineError::Export(format!("Invalid {} column type", name))
}

fn to_datetime(seconds: i64) -> Result<NaiveDateTime> {
    DateTime::from_timestamp(seconds, 0)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| PipelineError::Export(format!("Invalid timestamp {}", seconds)))
}

impl Default for ParquetWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct ParquetFileInfo {
    pub total_rows: i64,
    pub row_groups: i32,
    pub row_group_sizes: Vec<i64>,
    pub file_size: u64,
    pub compression: Compression,
}

impl ParquetFileInfo {
    pub fn summary(&self) -> String {
        let avg_rows = if self.row_groups > 0 {
            self.total_rows as f64 / self.row_groups as f64
        } else {
            0.0
        };
        format!(
            "Parquet File Summary:\n\
            - Total rows: {}\n\
            - Row groups: {}\n\
            - File size: {:.2} MB\n\
            - Compression: {:?}\n\
            - Avg rows per group: {:.0}",
            self.total_rows,
            self.row_groups,
            self.file_size as f64 / 1_048_576.0,
            self.compression,
            avg_rows
        )
    }
}
