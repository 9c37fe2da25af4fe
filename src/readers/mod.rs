pub mod archive_reader;
pub mod observation_reader;

pub use archive_reader::ArchiveReader;
pub use observation_reader::ObservationReader;
