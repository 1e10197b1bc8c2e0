use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::SpikeSink;
use crate::classify::Spike;
use crate::error::Result;

/// Writes the spike table as `index,label,jitter` rows, one header line
/// stamped with a generation timestamp.
pub struct CsvSpikeWriter {
    writer: BufWriter<File>,
}

impl CsvSpikeWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "# generated {}", super::iso8601_timestamp())?;
        writeln!(writer, "index,label,jitter")?;
        Ok(Self { writer })
    }
}

impl SpikeSink for CsvSpikeWriter {
    fn write_batch(&mut self, spikes: &[Spike]) -> Result<()> {
        for spike in spikes {
            writeln!(self.writer, "{},{},{}", spike.index, spike.label, spike.jitter)?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
