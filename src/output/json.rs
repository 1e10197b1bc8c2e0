use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use super::SpikeSink;
use crate::classify::Spike;
use crate::error::Result;

#[derive(Serialize)]
struct SpikeRecord {
    index: i64,
    label: i64,
    jitter: f64,
}

impl From<&Spike> for SpikeRecord {
    fn from(s: &Spike) -> Self {
        SpikeRecord {
            index: s.index,
            label: s.label,
            jitter: s.jitter,
        }
    }
}

/// Writes the spike table as newline-delimited JSON records (one spike per
/// line), so a consumer can stream it without buffering the whole segment.
pub struct JsonSpikeWriter {
    writer: BufWriter<File>,
}

impl JsonSpikeWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl SpikeSink for JsonSpikeWriter {
    fn write_batch(&mut self, spikes: &[Spike]) -> Result<()> {
        for spike in spikes {
            let record = SpikeRecord::from(spike);
            let line = serde_json::to_string(&record)?;
            writeln!(self.writer, "{line}")?;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
