//! Prediction synthesis: reconstructs good spikes from the catalogue's
//! oversampled template bank and subtracts them from the residual in place.

use ndarray::ArrayViewMut2;

use crate::catalogue::Catalogue;
use crate::classify::Spike;

/// Subtracts the reconstruction of every good spike (`label >= 0`) from
/// `residual`, in place. Spikes whose window falls outside the buffer are
/// skipped; they will be complete once the next chunk's carry arrives.
pub fn subtract_predictions(
    residual: &mut ArrayViewMut2<f32>,
    spikes: &[Spike],
    catalogue: &Catalogue,
) {
    let h = residual.shape()[0] as i64;
    let w = catalogue.peak_width as i64;
    let r = catalogue.subsample_ratio as i64;

    for spike in spikes {
        if spike.label < 0 {
            continue;
        }
        let Some(i) = catalogue.label_to_index(spike.label) else {
            continue;
        };

        let shift = -spike.jitter.round() as i64;
        let pos = spike.index + catalogue.n_left + shift;

        if !(pos > 0 && pos + w < h) {
            continue;
        }

        let frac = spike.jitter + shift as f64;
        let j = (frac * r as f64).floor() as i64 + r / 2;
        debug_assert!(
            (0..r).contains(&j),
            "int_jitter {} out of range [0, {}) for jitter {} shift {}",
            j,
            r,
            spike.jitter,
            shift
        );
        let j = j.clamp(0, r - 1) as usize;

        let template = catalogue.interp_centers0.index_axis(ndarray::Axis(0), i);
        for t in 0..w as usize {
            let src_row = template.row(j + t * catalogue.subsample_ratio);
            let mut dst_row = residual.row_mut(pos as usize + t);
            for (d, s) in dst_row.iter_mut().zip(src_row.iter()) {
                *d -= *s;
            }
        }
    }
}
