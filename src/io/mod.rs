//! Input/output helpers.
//!
//! - wide-table CSV ingest (`ingest`)
//! - long-table and month-end CSV exports (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
