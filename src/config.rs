//! Configuration for the peeler pipeline.
//!
//! ## Tuning
//!
//! The defaults mirror the reference implementation's defaults. The knob
//! most worth tuning per-recording is `peel.n_peel_level`: higher values
//! recover more overlapping spikes at the cost of more passes per chunk.

/// Top-level configuration for a `Peeler` run.
#[derive(Debug, Clone, Default)]
pub struct PeelerConfig {
    pub chunking: ChunkingConfig,
    pub peel: PeelConfig,
    pub preprocess: PreprocessConfig,
}

/// Chunk size and FIFO sizing.
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Samples per chunk handed to `Peeler::process_chunk`.
    pub chunksize: usize,
}

/// Parameters governing the iterative peel loop. Peak detector parameters
/// (threshold, sign, span) travel with the catalogue since they are tied to
/// template geometry, not per-run tuning.
#[derive(Debug, Clone)]
pub struct PeelConfig {
    /// Number of peel passes per chunk.
    pub n_peel_level: usize,
}

/// Engine selection and parameters for the reference preprocessor adapter.
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Name of the preprocessing engine. Only `"normalize"` is built in;
    /// unknown names produce `PeelerError::UnknownPreprocessorEngine`.
    pub engine: String,
    /// Causal highpass cutoff, Hz: removes slow drift before amplitude
    /// normalization.
    pub highpass_cutoff_hz: f32,
    pub filter_order: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { chunksize: 1024 }
    }
}

impl Default for PeelConfig {
    fn default() -> Self {
        Self { n_peel_level: 2 }
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            engine: "normalize".to_string(),
            highpass_cutoff_hz: 300.0,
            filter_order: 2,
        }
    }
}

impl PeelerConfig {
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.chunking.chunksize == 0 {
            return Err(crate::error::PeelerError::InvalidChunksize(
                self.chunking.chunksize,
            ));
        }
        if self.preprocess.engine != "normalize" {
            return Err(crate::error::PeelerError::UnknownPreprocessorEngine(
                self.preprocess.engine.clone(),
            ));
        }
        Ok(())
    }
}
