//! Pure peak detection over a multi-channel residual window.
//!
//! A sliding-window local-maximum scan over a channel-summed rectified
//! stream.

use ndarray::ArrayView2;

use crate::catalogue::PeakSign;

/// Detects local maxima of the channel-summed, sign-rectified residual.
///
/// `residual` has shape (T, C). Returns ascending indices into `residual`'s
/// first axis, each at least `n_span` away from either edge.
pub fn detect_peaks(
    residual: ArrayView2<f32>,
    n_span: usize,
    threshold: f32,
    sign: PeakSign,
) -> Vec<usize> {
    let len = residual.shape()[0];
    let factor = sign.factor();

    // Rectify by sign and sum across channels.
    let u: Vec<f32> = (0..len)
        .map(|t| {
            residual
                .row(t)
                .iter()
                .map(|&v| {
                    let signed = factor * v;
                    if signed < threshold { 0.0 } else { signed }
                })
                .sum()
        })
        .collect();

    if len < 2 * n_span + 1 {
        return Vec::new();
    }

    let mut peaks = Vec::new();
    for p in n_span..len - n_span {
        let mut is_peak = true;
        for k in 1..=n_span {
            // Strict on the left, non-strict on the right: fixes the
            // tie-break policy for duplicate plateaus.
            if !(u[p] > u[p - k]) || !(u[p] >= u[p + k]) {
                is_peak = false;
                break;
            }
        }
        if is_peak {
            peaks.push(p);
        }
    }
    peaks
}
