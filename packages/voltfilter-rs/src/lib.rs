pub mod error;
pub mod input;
pub mod signal_processing;
pub mod types;

pub use error::{ErrorKind, InputError, PipelineError, Result};
pub use input::{read_voltage_column, VOLTAGE_COLUMN};
pub use signal_processing::{process_csv, FilterPipeline, FilterReport, PipelineConfig};
pub use types::FilteredSignal;
