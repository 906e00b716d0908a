//! Data sources for treasury yield series.

pub mod fred;

pub use fred::*;
