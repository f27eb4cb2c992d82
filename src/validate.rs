//! Input validation helpers.
//!
//! Rejects NaN, +Inf and -Inf uniformly via `!is_finite()`.

use crate::error::CalibrationError;

/// Validate that a value is strictly positive and finite.
pub(crate) fn validate_positive(value: f64, name: &str) -> crate::error::Result<f64> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CalibrationError::InvalidInput {
            message: format!("{name} must be positive and finite, got {value}"),
        });
    }
    Ok(value)
}

/// Validate that a value is finite (zero and negatives allowed).
pub(crate) fn validate_finite(value: f64, name: &str) -> crate::error::Result<f64> {
    if !value.is_finite() {
        return Err(CalibrationError::InvalidInput {
            message: format!("{name} must be finite, got {value}"),
        });
    }
    Ok(value)
}

/// Validate an iteration cap or lattice depth.
pub(crate) fn validate_count(value: usize, name: &str) -> crate::error::Result<usize> {
    if value == 0 {
        return Err(CalibrationError::InvalidInput {
            message: format!("{name} must be at least 1"),
        });
    }
    Ok(value)
}
