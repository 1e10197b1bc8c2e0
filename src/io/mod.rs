//! Chunk sources: iterate a multi-channel recording chunk by chunk.

mod slice;
mod wav;

pub use slice::SliceChunkSource;
pub use wav::WavChunkSource;

use ndarray::Array2;

use crate::error::Result;

/// A source of raw (not yet preprocessed) multi-channel chunks: a
/// pull-based iterator over fixed-size chunks, reporting sample rate and
/// channel count up front.
pub trait ChunkSource {
    fn sample_rate(&self) -> u32;
    fn n_channels(&self) -> usize;

    /// Returns the next chunk of up to `chunksize` samples, or `None` at
    /// end of stream. The returned array has shape `(m, n_channels)` with
    /// `m <= chunksize`; `m < chunksize` only on the final chunk.
    fn next_chunk(&mut self, chunksize: usize) -> Result<Option<Array2<f32>>>;
}
