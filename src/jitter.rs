//! Pouzat two-stage jitter estimator.
//!
//! Fits a candidate waveform to the best-matching template plus its
//! first/second time derivative (a local Taylor expansion), refining the
//! order-0 least-squares jitter with one Newton step on the cubic residual
//! sum of squares.

use ndarray::ArrayView2;

use crate::catalogue::{Catalogue, CatalogueDerived};
use crate::constants::UNCLASSIFIED;

/// Outcome of fitting one candidate waveform against the catalogue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JitterEstimate {
    pub label: i64,
    pub jitter: f64,
}

/// Runs template selection, order-0/order-1 jitter refinement, and the
/// acceptance guard on a single *W×C* waveform.
///
/// `waveform` must have the catalogue's `(peak_width, n_channels)` shape.
pub fn estimate_one_jitter(
    waveform: ArrayView2<f32>,
    catalogue: &Catalogue,
    derived: &CatalogueDerived,
) -> JitterEstimate {
    // Template selection: argmin squared Frobenius distance over all K.
    let mut best_i = 0usize;
    let mut best_dist = f64::INFINITY;
    for i in 0..catalogue.n_clusters() {
        let template = catalogue.centers0.index_axis(ndarray::Axis(0), i);
        let dist: f64 = template
            .iter()
            .zip(waveform.iter())
            .map(|(&t, &w)| {
                let d = (t - w) as f64;
                d * d
            })
            .sum();
        if dist < best_dist {
            best_dist = dist;
            best_i = i;
        }
    }

    let i = best_i;
    let k = catalogue.cluster_labels[i];
    let chan = catalogue.max_on_channel[i];

    let wf: Vec<f64> = waveform.column(chan).iter().map(|&v| v as f64).collect();
    let wf0: Vec<f64> = catalogue
        .centers0
        .index_axis(ndarray::Axis(0), i)
        .column(chan)
        .iter()
        .map(|&v| v as f64)
        .collect();
    let wf1: Vec<f64> = catalogue
        .centers1
        .index_axis(ndarray::Axis(0), i)
        .column(chan)
        .iter()
        .map(|&v| v as f64)
        .collect();
    let wf2: Vec<f64> = catalogue
        .centers2
        .index_axis(ndarray::Axis(0), i)
        .column(chan)
        .iter()
        .map(|&v| v as f64)
        .collect();

    let h: Vec<f64> = wf.iter().zip(wf0.iter()).map(|(a, b)| a - b).collect();
    let h0n: f64 = h.iter().map(|v| v * v).sum();
    let h_dot_wf1: f64 = h.iter().zip(wf1.iter()).map(|(a, b)| a * b).sum();
    let h_dot_wf2: f64 = h.iter().zip(wf2.iter()).map(|(a, b)| a * b).sum();

    let wf1_norm2 = derived.wf1_norm2[i] as f64;
    let wf2_norm2 = derived.wf2_norm2[i] as f64;
    let wf1_dot_wf2 = derived.wf1_dot_wf2[i] as f64;

    let jitter0 = h_dot_wf1 / wf1_norm2;

    let h1: Vec<f64> = h
        .iter()
        .zip(wf1.iter())
        .map(|(hv, w1v)| hv - jitter0 * w1v)
        .collect();
    let h1n: f64 = h1.iter().map(|v| v * v).sum();

    let jitter1 = if h0n > h1n {
        let fp = -2.0 * h_dot_wf1
            + 2.0 * jitter0 * (wf1_norm2 - h_dot_wf2)
            + 3.0 * jitter0 * jitter0 * wf1_dot_wf2
            + jitter0 * jitter0 * jitter0 * wf2_norm2;
        let fpp = 2.0 * (wf1_norm2 - h_dot_wf2)
            + 6.0 * jitter0 * wf1_dot_wf2
            + 3.0 * jitter0 * jitter0 * wf2_norm2;
        jitter0 - fp / fpp
    } else {
        0.0
    };

    // Acceptance guard: the reconstruction must land strictly closer to
    // zero than the raw waveform, or the candidate is unclassified.
    let pred: Vec<f64> = wf0
        .iter()
        .zip(wf1.iter())
        .zip(wf2.iter())
        .map(|((w0, w1), w2)| w0 + jitter1 * w1 + (jitter1 * jitter1 / 2.0) * w2)
        .collect();
    let wf_norm2: f64 = wf.iter().map(|v| v * v).sum();
    let resid_norm2: f64 = wf
        .iter()
        .zip(pred.iter())
        .map(|(w, p)| (w - p) * (w - p))
        .sum();

    if wf_norm2 > resid_norm2 {
        JitterEstimate {
            label: k,
            jitter: jitter1,
        }
    } else {
        JitterEstimate {
            label: UNCLASSIFIED,
            jitter: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::{PeakDetectorParams, PeakSign};
    use ndarray::{Array1, Array3};

    fn gaussian_derivative_catalogue() -> Catalogue {
        let w = 9usize;
        let c = 1usize;
        let center = (w / 2) as f64;
        let sigma = 1.5f64;

        let gauss = |t: f64| (-((t - center).powi(2)) / (2.0 * sigma * sigma)).exp();
        let mut centers0 = Array3::<f32>::zeros((1, w, c));
        let mut centers1 = Array3::<f32>::zeros((1, w, c));
        let mut centers2 = Array3::<f32>::zeros((1, w, c));

        let h = 1e-3;
        for t in 0..w {
            let tf = t as f64;
            centers0[[0, t, 0]] = gauss(tf) as f32;
            let d1 = (gauss(tf + h) - gauss(tf - h)) / (2.0 * h);
            centers1[[0, t, 0]] = d1 as f32;
            let d2 = (gauss(tf + h) - 2.0 * gauss(tf) + gauss(tf - h)) / (h * h);
            centers2[[0, t, 0]] = d2 as f32;
        }

        Catalogue {
            cluster_labels: vec![0],
            centers0,
            centers1,
            centers2,
            interp_centers0: Array3::zeros((1, w * 4, c)),
            max_on_channel: vec![0],
            n_left: -((w / 2) as i64),
            peak_width: w,
            subsample_ratio: 4,
            peak_detector: PeakDetectorParams {
                sign: PeakSign::Positive,
                relative_threshold: 0.1,
                n_span: 2,
            },
            signals_medians: Array1::zeros(c),
            signals_mads: Array1::ones(c),
        }
    }

    #[test]
    fn zero_jitter_template_is_classified_with_near_zero_jitter() {
        let cat = gaussian_derivative_catalogue();
        let derived = cat.derive();
        let waveform = cat.centers0.index_axis(ndarray::Axis(0), 0).to_owned();

        let est = estimate_one_jitter(waveform.view(), &cat, &derived);
        assert_eq!(est.label, 0);
        assert!(est.jitter.abs() < 1e-2, "jitter = {}", est.jitter);
    }

    #[test]
    fn flat_noise_is_unclassified() {
        let cat = gaussian_derivative_catalogue();
        let derived = cat.derive();
        let waveform = Array3::<f32>::zeros((1, cat.peak_width, 1));
        let waveform = waveform.index_axis(ndarray::Axis(0), 0).to_owned();

        let est = estimate_one_jitter(waveform.view(), &cat, &derived);
        assert_eq!(est.label, UNCLASSIFIED);
    }
}
