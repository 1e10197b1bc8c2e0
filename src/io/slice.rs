use ndarray::Array2;

use super::ChunkSource;
use crate::error::Result;

/// An in-memory chunk source, mainly useful for tests and for the round-trip
/// synthetic signals built by the simulation module.
pub struct SliceChunkSource {
    data: Array2<f32>,
    sample_rate: u32,
    cursor: usize,
}

impl SliceChunkSource {
    pub fn new(data: Array2<f32>, sample_rate: u32) -> Self {
        Self {
            data,
            sample_rate,
            cursor: 0,
        }
    }
}

impl ChunkSource for SliceChunkSource {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn n_channels(&self) -> usize {
        self.data.shape()[1]
    }

    fn next_chunk(&mut self, chunksize: usize) -> Result<Option<Array2<f32>>> {
        let total = self.data.shape()[0];
        if self.cursor >= total {
            return Ok(None);
        }
        let end = (self.cursor + chunksize).min(total);
        let chunk = self.data.slice(ndarray::s![self.cursor..end, ..]).to_owned();
        self.cursor = end;
        Ok(Some(chunk))
    }
}
