use ndarray::{Array1, Array3};

use crate::catalogue::{Catalogue, PeakDetectorParams, PeakSign};

/// Builds a single-cluster, single-channel catalogue from a Gaussian bump,
/// with a finite-difference derivative pair and an oversampled bank built
/// by literal re-evaluation of the Gaussian at fractional offsets. Good
/// enough to exercise the peel loop and jitter estimator with a known
/// ground truth, not meant to resemble a real spike waveform.
pub fn build_gaussian_catalogue(
    peak_width: usize,
    subsample_ratio: usize,
    n_channels: usize,
    amplitude: f32,
    sigma: f64,
) -> Catalogue {
    let center = (peak_width / 2) as f64;
    let gauss = |t: f64| amplitude as f64 * (-((t - center).powi(2)) / (2.0 * sigma * sigma)).exp();

    let mut centers0 = Array3::<f32>::zeros((1, peak_width, n_channels));
    let mut centers1 = Array3::<f32>::zeros((1, peak_width, n_channels));
    let mut centers2 = Array3::<f32>::zeros((1, peak_width, n_channels));
    let h = 1e-3;

    for t in 0..peak_width {
        let tf = t as f64;
        let v0 = gauss(tf);
        let v1 = (gauss(tf + h) - gauss(tf - h)) / (2.0 * h);
        let v2 = (gauss(tf + h) - 2.0 * v0 + gauss(tf - h)) / (h * h);
        for ch in 0..n_channels {
            centers0[[0, t, ch]] = v0 as f32;
            centers1[[0, t, ch]] = v1 as f32;
            centers2[[0, t, ch]] = v2 as f32;
        }
    }

    let mut interp_centers0 = Array3::<f32>::zeros((1, peak_width * subsample_ratio, n_channels));
    for bucket in 0..subsample_ratio {
        // Bucket corresponds to jitter fraction bucket/R - 1/2; a waveform
        // sampled at integer offsets but shifted by that fraction is
        // gauss(t - frac) evaluated at each integer t. Flattened so that
        // `bucket + t * R` lands the bucket's value for offset t, matching
        // `place_template`/`subtract_predictions`'s row lookup.
        let frac = bucket as f64 / subsample_ratio as f64 - 0.5;
        for t in 0..peak_width {
            let v = gauss(t as f64 - frac);
            let flat = bucket + t * subsample_ratio;
            for ch in 0..n_channels {
                interp_centers0[[0, flat, ch]] = v as f32;
            }
        }
    }

    Catalogue {
        cluster_labels: vec![0],
        centers0,
        centers1,
        centers2,
        interp_centers0,
        max_on_channel: vec![0],
        n_left: -((peak_width / 2) as i64),
        peak_width,
        subsample_ratio,
        peak_detector: PeakDetectorParams {
            sign: PeakSign::Positive,
            relative_threshold: amplitude * 0.3,
            n_span: (peak_width / 3).max(1),
        },
        signals_medians: Array1::zeros(n_channels),
        signals_mads: Array1::ones(n_channels),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_catalogue_with_expected_shapes() {
        let cat = build_gaussian_catalogue(12, 4, 2, 10.0, 2.0);
        assert_eq!(cat.centers0.shape(), &[1, 12, 2]);
        assert_eq!(cat.interp_centers0.shape(), &[1, 48, 2]);
        assert!(cat.validate().is_ok());
    }
}
