//! Persistence layer: durable tabular storage for completed intakes.

pub mod csv_backend;
pub mod record;
pub mod table;
pub mod traits;

pub use csv_backend::CsvResponseStore;
pub use record::ResponseRecord;
pub use table::Table;
pub use traits::ResponseStore;
