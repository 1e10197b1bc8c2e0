use ndarray::Array2;

use super::ChunkSource;
use crate::error::Result;

/// Reads a multi-channel WAV file chunk by chunk, generalized from the
/// teacher's stereo-only `WavFileSource` to an arbitrary channel count.
pub struct WavChunkSource {
    reader: hound::WavReader<std::io::BufReader<std::fs::File>>,
    sample_rate: u32,
    n_channels: usize,
}

impl WavChunkSource {
    pub fn open(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        Ok(Self {
            sample_rate: spec.sample_rate,
            n_channels: spec.channels as usize,
            reader,
        })
    }
}

impl ChunkSource for WavChunkSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn n_channels(&self) -> usize {
        self.n_channels
    }

    fn next_chunk(&mut self, chunksize: usize) -> Result<Option<Array2<f32>>> {
        let spec = self.reader.spec();
        let mut frames: Vec<f32> = Vec::with_capacity(chunksize * self.n_channels);

        let samples_wanted = chunksize * self.n_channels;
        let mut read = 0usize;

        match spec.sample_format {
            hound::SampleFormat::Float => {
                for sample in self.reader.samples::<f32>().take(samples_wanted) {
                    frames.push(sample?);
                    read += 1;
                }
            }
            hound::SampleFormat::Int => {
                let max_amplitude = (1i64 << (spec.bits_per_sample - 1)) as f32;
                for sample in self.reader.samples::<i32>().take(samples_wanted) {
                    frames.push(sample? as f32 / max_amplitude);
                    read += 1;
                }
            }
        }

        if read == 0 {
            return Ok(None);
        }

        let n_frames = read / self.n_channels;
        frames.truncate(n_frames * self.n_channels);
        let chunk = Array2::from_shape_vec((n_frames, self.n_channels), frames)
            .expect("frame count divides evenly by channel count");
        Ok(Some(chunk))
    }
}
