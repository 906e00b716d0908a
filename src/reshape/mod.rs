//! Yield series reshaping for charting.
//!
//! Responsibilities:
//!
//! - wide -> long transform with an optional date floor (`to_long`)
//! - half-unit quantized value-axis range (`compute_axis_range`)
//! - month-end summary table (`month_end_summary`)
//! - chart interaction helpers: selection filter, crosshair lookup, quarter rules
//!
//! Every function is pure: it recomputes from its inputs and fails atomically.

pub mod axis;
pub mod interaction;
pub mod long;
pub mod month_end;

pub use axis::*;
pub use interaction::*;
pub use long::*;
pub use month_end::*;
