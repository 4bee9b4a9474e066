pub mod arrow_source;
pub mod csv_source;

pub use arrow_source::rows_from_batch;
pub use csv_source::CsvSource;
