pub mod category;
pub mod measure;
pub mod observation;
pub mod table;

pub use category::{BucketScheme, Closed, Pm25Category, RainIntensity};
pub use measure::Measure;
pub use observation::ObservationRecord;
pub use table::{Column, ColumnData, Matrix, Table};
