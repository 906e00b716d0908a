//! Value-axis range derivation.

use crate::domain::{AxisRange, LongObservation};
use crate::error::ReshapeError;

/// Quantization step for axis bounds.
const AXIS_STEP: f64 = 0.5;

/// Derive a half-unit quantized axis range over every observation.
///
/// `low` is rounded down and `high` rounded up, so the range always contains
/// the data. Callers pass the unfiltered set so the scale does not change
/// when the series selection does.
pub fn compute_axis_range(observations: &[LongObservation]) -> Result<AxisRange, ReshapeError> {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for o in observations {
        min = min.min(o.value);
        max = max.max(o.value);
    }

    if !(min.is_finite() && max.is_finite()) {
        return Err(ReshapeError::InsufficientData);
    }

    Ok(AxisRange {
        low: (min / AXIS_STEP).floor() * AXIS_STEP,
        high: (max / AXIS_STEP).ceil() * AXIS_STEP,
    })
}
