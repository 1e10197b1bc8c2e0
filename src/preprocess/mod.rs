//! Reference signal preprocessor: causal highpass filtering plus rolling
//! median/MAD normalization, with causal-delay reporting.
//!
//! Preprocessing is an external collaborator selected by engine name;
//! `normalize` is the only built-in engine.

mod normalize;

pub use normalize::NormalizingPreprocessor;

use ndarray::Array2;

use crate::error::Result;

/// Transforms a raw chunk into a preprocessed one, reporting the absolute
/// sample position its output corresponds to (which lags `pos` by the
/// filter's causal delay during warm-up).
pub trait SignalPreprocessor {
    /// `pos` is the absolute index of `raw[0]`. Returns `None` during
    /// warm-up (not enough history yet to produce causally-filtered
    /// output), otherwise `(abs_head, preprocessed_chunk)`.
    fn process(&mut self, pos: u64, raw: &Array2<f32>) -> Result<Option<(u64, Array2<f32>)>>;
}

/// Builds the named preprocessor engine. `PeelerError::UnknownPreprocessorEngine`
/// is raised by `PeelerConfig::validate`, not here, since engine selection is
/// a configuration-time decision.
pub fn build_preprocessor(
    config: &crate::config::PreprocessConfig,
    sample_rate: u32,
    n_channels: usize,
    signals_medians: ndarray::Array1<f32>,
    signals_mads: ndarray::Array1<f32>,
) -> Result<NormalizingPreprocessor> {
    NormalizingPreprocessor::new(config, sample_rate, n_channels, signals_medians, signals_mads)
}
