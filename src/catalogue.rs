//! Template catalogue: the immutable bundle of per-cluster waveforms and
//! precomputed geometry consumed by the jitter estimator and predictor.
//!
//! Construction is the one place templates are validated; a catalogue that
//! fails to construct can never reach the peel loop with a degenerate
//! template that would divide by zero during jitter estimation.

use ndarray::{Array1, Array3, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{PeelerError, Result};

/// Sign convention used by the peak detector's rectification step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeakSign {
    Positive,
    Negative,
}

impl PeakSign {
    #[inline]
    pub fn factor(self) -> f32 {
        match self {
            PeakSign::Positive => 1.0,
            PeakSign::Negative => -1.0,
        }
    }
}

/// Parameters of the peak detector that travel with the catalogue, since
/// they are tied to the templates' geometry (window width, channel count).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeakDetectorParams {
    pub sign: PeakSign,
    pub relative_threshold: f32,
    pub n_span: usize,
}

/// Immutable template bundle. Indexed internally by cluster-index `i`;
/// `cluster_labels[i]` is the externally visible label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Catalogue {
    pub cluster_labels: Vec<i64>,

    /// Mean waveform templates, shape (K, W, C).
    pub centers0: Array3<f32>,
    /// First time derivative, shape (K, W, C).
    pub centers1: Array3<f32>,
    /// Second time derivative, shape (K, W, C).
    pub centers2: Array3<f32>,
    /// Oversampled template bank, shape (K, W*R, C). Taking every R-th
    /// sample starting at offset `j` yields the waveform for jitter
    /// fraction `j/R - 1/2`.
    pub interp_centers0: Array3<f32>,

    /// Channel on which each template has peak amplitude; the 1-D channel
    /// used for jitter math.
    pub max_on_channel: Vec<usize>,

    /// Signed offset from peak sample to window start (typically negative).
    pub n_left: i64,
    pub peak_width: usize,
    pub subsample_ratio: usize,

    pub peak_detector: PeakDetectorParams,

    /// Per-channel medians/MADs used by the reference preprocessor's
    /// normalization step; populated by the catalogue builder.
    pub signals_medians: Array1<f32>,
    pub signals_mads: Array1<f32>,
}

/// Precomputed per-cluster inner products used by the jitter estimator.
/// Kept separate from `Catalogue` (rather than injected into it lazily) so
/// the catalogue stays a plain, shareable, read-only value object.
#[derive(Debug, Clone)]
pub struct CatalogueDerived {
    pub wf1_norm2: Vec<f32>,
    pub wf2_norm2: Vec<f32>,
    pub wf1_dot_wf2: Vec<f32>,
}

impl Catalogue {
    pub fn n_clusters(&self) -> usize {
        self.cluster_labels.len()
    }

    pub fn n_channels(&self) -> usize {
        self.centers0.shape()[2]
    }

    pub fn label_to_index(&self, label: i64) -> Option<usize> {
        self.cluster_labels.iter().position(|&l| l == label)
    }

    /// Validates shapes and rejects degenerate templates so downstream
    /// jitter estimation never divides by zero.
    pub fn validate(&self) -> Result<()> {
        if self.n_clusters() == 0 {
            return Err(PeelerError::EmptyCatalogue);
        }
        for i in 0..self.n_clusters() {
            let chan = self.max_on_channel[i];
            let wf1 = self.centers1.index_axis(Axis(0), i);
            let norm2: f32 = wf1.column(chan).iter().map(|v| v * v).sum();
            if norm2 <= f32::EPSILON {
                return Err(PeelerError::DegenerateTemplate { cluster_index: i });
            }
        }
        Ok(())
    }

    /// Computes the per-cluster inner products the jitter estimator needs.
    /// Called once, at `Peeler::new`.
    pub fn derive(&self) -> CatalogueDerived {
        let k = self.n_clusters();
        let mut wf1_norm2 = Vec::with_capacity(k);
        let mut wf2_norm2 = Vec::with_capacity(k);
        let mut wf1_dot_wf2 = Vec::with_capacity(k);

        for i in 0..k {
            let chan = self.max_on_channel[i];
            let wf1 = self.centers1.index_axis(Axis(0), i).column(chan).to_owned();
            let wf2 = self.centers2.index_axis(Axis(0), i).column(chan).to_owned();

            let n1: f32 = wf1.iter().map(|v| v * v).sum();
            let n2: f32 = wf2.iter().map(|v| v * v).sum();
            let dot: f32 = wf1.iter().zip(wf2.iter()).map(|(a, b)| a * b).sum();

            wf1_norm2.push(n1);
            wf2_norm2.push(n2);
            wf1_dot_wf2.push(dot);
        }

        CatalogueDerived {
            wf1_norm2,
            wf2_norm2,
            wf1_dot_wf2,
        }
    }
}
