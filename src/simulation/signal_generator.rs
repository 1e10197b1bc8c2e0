use ndarray::{Array2, ArrayViewMut2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

use crate::catalogue::Catalogue;

/// Adds cluster `i`'s template to `buffer` with its peak at sample
/// `pos + jitter`, using the catalogue's oversampled bank. `jitter` outside
/// `[-0.5, 0.5)` is folded into an integer shift of the placement position
/// plus a remainder in the bank's representable range, the same convention
/// `subtract_predictions` uses to reconstruct a spike from `(index, jitter)`.
/// Used to build signals with a known ground truth for the round-trip-law
/// tests.
pub fn place_template(
    buffer: &mut ArrayViewMut2<f32>,
    catalogue: &Catalogue,
    cluster_index: usize,
    pos: usize,
    jitter: f64,
) {
    let r = catalogue.subsample_ratio as i64;
    let w = catalogue.peak_width;

    let shift = -jitter.round() as i64;
    let frac = jitter + shift as f64;
    let placed_pos = (pos as i64 + shift) as usize;
    let j = ((frac * r as f64).floor() as i64 + r / 2).clamp(0, r - 1) as usize;

    let template = catalogue
        .interp_centers0
        .index_axis(ndarray::Axis(0), cluster_index);

    for t in 0..w {
        let src_row = template.row(j + t * catalogue.subsample_ratio);
        let mut dst_row = buffer.row_mut(placed_pos + t);
        for (d, s) in dst_row.iter_mut().zip(src_row.iter()) {
            *d += *s;
        }
    }
}

/// Generates a zero-mean Gaussian noise floor over a fresh buffer, seeded
/// deterministically so tests are reproducible.
pub fn noise_floor(n_samples: usize, n_channels: usize, stddev: f32, seed: u64) -> Array2<f32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let normal = Normal::new(0.0_f32, stddev).expect("finite stddev");
    Array2::from_shape_fn((n_samples, n_channels), |_| normal.sample(&mut rng))
}
