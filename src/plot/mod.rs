//! Non-interactive chart rendering.

pub mod ascii;

pub use ascii::*;
