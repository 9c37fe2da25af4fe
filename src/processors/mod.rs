pub mod bucketize;
pub mod criteria;
pub mod filter;

pub use bucketize::bucketize;
pub use criteria::FilterCriteria;
pub use filter::{filter_by_category, filter_by_date, filter_by_range, select_columns, DateRange};
