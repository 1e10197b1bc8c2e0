//! Classify-and-align: per-candidate bounds check, jitter estimation, and
//! the one-sample shift retry.

use ndarray::ArrayView2;

use crate::catalogue::{Catalogue, CatalogueDerived};
use crate::constants::{LEFT_LIMIT, MAXIMUM_JITTER_SHIFT, MAXIMUM_SHIFT, RIGHT_LIMIT};
use crate::jitter::estimate_one_jitter;

/// A classified candidate: `index` is still relative to the residual buffer
/// passed in (the driver adds `shift_abs` afterward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spike {
    pub index: i64,
    pub label: i64,
    pub jitter: f64,
}

/// Runs classify-and-align on every candidate peak index.
pub fn classify_and_align(
    residual: ArrayView2<f32>,
    peak_indices: &[usize],
    catalogue: &Catalogue,
    derived: &CatalogueDerived,
) -> Vec<Spike> {
    let w = catalogue.peak_width as i64;
    let len = residual.shape()[0] as i64;

    peak_indices
        .iter()
        .map(|&p| classify_one(p as i64, residual, w, len, catalogue, derived))
        .collect()
}

fn classify_one(
    p: i64,
    residual: ArrayView2<f32>,
    w: i64,
    len: i64,
    catalogue: &Catalogue,
    derived: &CatalogueDerived,
) -> Spike {
    let ind = p + catalogue.n_left;

    if let Some(boundary) = bounds_violation(ind, w, len) {
        return Spike {
            index: p,
            label: boundary,
            jitter: 0.0,
        };
    }

    let waveform = residual.slice(ndarray::s![ind as usize..(ind + w) as usize, ..]);
    let est = estimate_one_jitter(waveform, catalogue, derived);

    if est.label < 0 || est.jitter.abs() <= 0.5 {
        return Spike {
            index: p,
            label: est.label,
            jitter: est.jitter,
        };
    }

    // Shift retry: a refined jitter outside (-0.5, 0.5] means the peak
    // localization was one sample off the template's true maximum.
    let shift = -est.jitter.round() as i64;
    if shift.abs() > MAXIMUM_JITTER_SHIFT {
        return Spike {
            index: p,
            label: MAXIMUM_SHIFT,
            jitter: 0.0,
        };
    }

    let ind_shifted = ind + shift;
    if let Some(boundary) = bounds_violation(ind_shifted, w, len) {
        return Spike {
            index: p,
            label: boundary,
            jitter: 0.0,
        };
    }

    let waveform_shifted =
        residual.slice(ndarray::s![ind_shifted as usize..(ind_shifted + w) as usize, ..]);
    let est_shifted = estimate_one_jitter(waveform_shifted, catalogue, derived);

    if est_shifted.jitter.abs() < est.jitter.abs() {
        Spike {
            index: p + shift,
            label: est_shifted.label,
            jitter: est_shifted.jitter,
        }
    } else {
        Spike {
            index: p,
            label: est.label,
            jitter: est.jitter,
        }
    }
}

fn bounds_violation(ind: i64, w: i64, len: i64) -> Option<i64> {
    if ind < 0 {
        Some(LEFT_LIMIT)
    } else if ind + w >= len {
        Some(RIGHT_LIMIT)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::{PeakDetectorParams, PeakSign};
    use ndarray::{Array1, Array2, Array3};

    fn single_cluster_catalogue() -> Catalogue {
        let w = 8usize;
        let c = 1usize;
        let mut centers0 = Array3::<f32>::zeros((1, w, c));
        let mut centers1 = Array3::<f32>::zeros((1, w, c));
        for t in 0..w {
            let v = ((t as f32) - 4.0).abs();
            centers0[[0, t, 0]] = 5.0 - v;
            centers1[[0, t, 0]] = if t < 4 { 1.0 } else { -1.0 };
        }

        Catalogue {
            cluster_labels: vec![0],
            centers0,
            centers1,
            centers2: Array3::zeros((1, w, c)),
            interp_centers0: Array3::zeros((1, w * 4, c)),
            max_on_channel: vec![0],
            n_left: -4,
            peak_width: w,
            subsample_ratio: 4,
            peak_detector: PeakDetectorParams {
                sign: PeakSign::Positive,
                relative_threshold: 1.0,
                n_span: 2,
            },
            signals_medians: Array1::zeros(c),
            signals_mads: Array1::ones(c),
        }
    }

    #[test]
    fn left_limit_emitted_near_start_of_buffer() {
        let cat = single_cluster_catalogue();
        let derived = cat.derive();
        let residual = Array2::<f32>::zeros((20, 1));
        let spikes = classify_and_align(residual.view(), &[2], &cat, &derived);
        assert_eq!(spikes[0].label, LEFT_LIMIT);
    }

    #[test]
    fn right_limit_emitted_near_end_of_buffer() {
        let cat = single_cluster_catalogue();
        let derived = cat.derive();
        let residual = Array2::<f32>::zeros((20, 1));
        let spikes = classify_and_align(residual.view(), &[18], &cat, &derived);
        assert_eq!(spikes[0].label, RIGHT_LIMIT);
    }
}
