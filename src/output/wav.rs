use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use ndarray::ArrayView2;

use crate::error::Result;

/// Appends the peeled residual signal to a multi-channel WAV file, one
/// chunk at a time, alongside the spike table the driver also emits.
pub struct ProcessedSignalWriter {
    writer: hound::WavWriter<BufWriter<File>>,
}

impl ProcessedSignalWriter {
    pub fn create(path: &Path, sample_rate: u32, n_channels: usize) -> Result<Self> {
        let spec = hound::WavSpec {
            channels: n_channels as u16,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let writer = hound::WavWriter::create(path, spec)?;
        Ok(Self { writer })
    }

    pub fn write_chunk(&mut self, chunk: ArrayView2<f32>) -> Result<()> {
        for row in chunk.rows() {
            for &v in row.iter() {
                self.writer.write_sample(v)?;
            }
        }
        Ok(())
    }

    pub fn finalize(self) -> Result<()> {
        self.writer.finalize()?;
        Ok(())
    }
}
