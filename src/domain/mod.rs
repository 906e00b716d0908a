//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the treasury series catalog (`SeriesName`) and chart selection (`Selection`)
//! - the wide input table (`WideSeriesTable`) and long observations (`LongObservation`)
//! - reshaping outputs (`AxisRange`, `MonthEndSummary`)

pub mod types;

pub use types::*;
