//! Synthetic catalogues and signals for exercising the peel loop without a
//! real catalogue-builder. Feature-gated since it's test-only scaffolding.

mod catalogue_builder;
mod signal_generator;

pub use catalogue_builder::build_gaussian_catalogue;
pub use signal_generator::{noise_floor, place_template};
