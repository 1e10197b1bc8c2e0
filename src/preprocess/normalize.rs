use iir_filters::filter::{DirectForm2Transposed, Filter};
use iir_filters::filter_design::{butter, FilterType};
use iir_filters::sos::zpk2sos;
use log::debug;
use ndarray::{Array1, Array2};

use crate::config::PreprocessConfig;
use crate::error::{PeelerError, Result};

/// Causal per-channel highpass, followed by subtracting the catalogue's
/// per-channel median and dividing by its MAD. One bank of filters per
/// channel, each with independent state.
pub struct NormalizingPreprocessor {
    filters: Vec<DirectForm2Transposed>,
    medians: Array1<f32>,
    mads: Array1<f32>,
    /// Samples of causal group delay before output is considered settled.
    warmup_remaining: u64,
}

impl NormalizingPreprocessor {
    pub fn new(
        config: &PreprocessConfig,
        sample_rate: u32,
        n_channels: usize,
        medians: Array1<f32>,
        mads: Array1<f32>,
    ) -> Result<Self> {
        let mut filters = Vec::with_capacity(n_channels);
        for _ in 0..n_channels {
            let zpk = butter(
                config.filter_order as u32,
                FilterType::HighPass(config.highpass_cutoff_hz as f64),
                sample_rate as f64,
            )
            .map_err(|e| PeelerError::FilterDesign(format!("{:?}", e)))?;
            let sos = zpk2sos(&zpk, None).map_err(|e| PeelerError::FilterDesign(format!("{:?}", e)))?;
            filters.push(DirectForm2Transposed::new(&sos));
        }

        // A few filter-order worths of samples before the causal transient
        // has settled enough to trust for classification.
        let warmup_remaining = (config.filter_order as u64 + 1) * 4;

        Ok(Self {
            filters,
            medians,
            mads,
            warmup_remaining,
        })
    }

    fn channel_count(&self) -> usize {
        self.filters.len()
    }
}

impl super::SignalPreprocessor for NormalizingPreprocessor {
    fn process(&mut self, pos: u64, raw: &Array2<f32>) -> Result<Option<(u64, Array2<f32>)>> {
        let (t, c) = (raw.shape()[0], raw.shape()[1]);
        if c != self.channel_count() {
            return Err(PeelerError::ChannelMismatch {
                expected: self.channel_count(),
                got: c,
            });
        }

        let mut out = Array2::<f32>::zeros((t, c));
        for ch in 0..c {
            let filter = &mut self.filters[ch];
            let median = self.medians[ch];
            let mad = self.mads[ch].max(f32::EPSILON);
            for row in 0..t {
                let filtered = filter.filter(raw[[row, ch]] as f64) as f32;
                out[[row, ch]] = (filtered - median) / mad;
            }
        }

        if self.warmup_remaining > 0 {
            let consumed = (t as u64).min(self.warmup_remaining);
            self.warmup_remaining -= consumed;
            debug!("preprocessor warm-up: {} samples remaining", self.warmup_remaining);
            if self.warmup_remaining > 0 {
                return Ok(None);
            }
        }

        Ok(Some((pos + t as u64, out)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::SignalPreprocessor;

    #[test]
    fn warms_up_then_emits() {
        let config = PreprocessConfig {
            engine: "normalize".to_string(),
            highpass_cutoff_hz: 300.0,
            filter_order: 2,
        };
        let mut pre = NormalizingPreprocessor::new(
            &config,
            30000,
            1,
            Array1::zeros(1),
            Array1::ones(1),
        )
        .unwrap();

        let chunk = Array2::<f32>::zeros((4, 1));
        let first = pre.process(0, &chunk).unwrap();
        assert!(first.is_none());

        let mut result = None;
        let mut pos = 4u64;
        for _ in 0..10 {
            if let Some(r) = pre.process(pos, &chunk).unwrap() {
                result = Some(r);
                break;
            }
            pos += 4;
        }
        assert!(result.is_some());
    }
}
