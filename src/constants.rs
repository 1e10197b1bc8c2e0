//! Process-wide constants for the peeler core.
//!
//! Reserved spike labels and the shift-retry ceiling are fixed values the
//! whole pipeline agrees on, not configuration. Mirrors the reference
//! tridesclous implementation's `LABEL_*` / `maximum_jitter_shift` module
//! constants.

/// Maximum allowed `|shift|` during classify-and-align's one-sample retry.
/// A refined jitter that would require a larger shift is rejected outright.
pub const MAXIMUM_JITTER_SHIFT: i64 = 4;

/// The waveform matched a template but the acceptance guard rejected it.
pub const TRASH: i64 = -1;

/// No acceptable template match (reconstruction not closer to zero than raw).
pub const UNCLASSIFIED: i64 = -10;

/// Candidate window would start before the FIFO.
pub const LEFT_LIMIT: i64 = -11;

/// Candidate window would run past the FIFO.
pub const RIGHT_LIMIT: i64 = -12;

/// Shift retry required `|shift| > MAXIMUM_JITTER_SHIFT`.
pub const MAXIMUM_SHIFT: i64 = -13;

/// `true` for any label considered a good, emittable spike (cluster labels
/// are themselves non-negative; there is no separate "good" sentinel).
pub fn is_good(label: i64) -> bool {
    label >= 0
}
