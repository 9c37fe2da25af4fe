pub mod aggregate;
pub mod air_quality_analyzer;
pub mod correlation;
pub mod distribution;
pub mod statistics;

pub use aggregate::aggregate_mean;
pub use air_quality_analyzer::{AirQualityAnalyzer, AirQualityStatistics};
pub use correlation::{correlation_matrix, pearson};
pub use distribution::{histogram, scatter, value_counts};
pub use statistics::{describe, Statistic, Summary};
