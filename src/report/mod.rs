//! Reporting utilities: plain-text tables and labels for terminal output.

pub mod format;

pub use format::*;
