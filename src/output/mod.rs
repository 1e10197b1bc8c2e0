//! Spike table sinks: CSV and JSON formatters behind a common trait.

mod csv;
mod json;
mod wav;

pub use csv::CsvSpikeWriter;
pub use json::JsonSpikeWriter;
pub use wav::ProcessedSignalWriter;

use crate::classify::Spike;
use crate::error::{PeelerError, Result};

/// Appends spike batches to an output stream, in whatever wire format the
/// implementation chooses.
pub trait SpikeSink {
    fn write_batch(&mut self, spikes: &[Spike]) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
}

/// Builds a sink from an engine name (`"csv"` or `"json"`), mirroring the
/// teacher's `create_formatter` factory.
pub fn create_sink(format: &str, path: &std::path::Path) -> Result<Box<dyn SpikeSink>> {
    match format {
        "csv" => Ok(Box::new(CsvSpikeWriter::create(path)?)),
        "json" => Ok(Box::new(JsonSpikeWriter::create(path)?)),
        other => Err(PeelerError::Config(format!(
            "unknown output format: {other}"
        ))),
    }
}

pub(crate) fn iso8601_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
