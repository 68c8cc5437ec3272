//! Small validation helpers for caller-supplied parameters.
//!
//! Every helper returns `Err(&'static str)` with a human-readable reason. Callers attach the
//! parameter name through [`check`], which turns the reason into an
//! [`AdvError::InvalidParameter`].

use crate::error::{AdvError, AppResult};
use std::ops::RangeInclusive;

/// Validates if a given value is a finite number (not NaN or infinite).
///
/// # Arguments
///
/// * `value` - The value to validate.
///
/// # Returns
///
/// * `Ok(())` if the value is finite.
/// * `Err(&'static str)` otherwise.
pub fn is_finite(value: f64) -> Result<(), &'static str> {
    if value.is_finite() {
        Ok(())
    } else {
        Err("Value must be a finite number")
    }
}

/// Validates if a given value is finite and strictly greater than zero.
///
/// # Arguments
///
/// * `value` - The value to validate.
///
/// # Returns
///
/// * `Ok(())` if the value is positive.
/// * `Err(&'static str)` if the value is zero, negative or not finite.
pub fn is_positive(value: f64) -> Result<(), &'static str> {
    is_finite(value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err("Value must be greater than zero")
    }
}

/// Validates if a given value is finite and not negative.
pub fn is_non_negative(value: f64) -> Result<(), &'static str> {
    is_finite(value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err("Value must not be negative")
    }
}

/// Validates if a given value is within a specified numeric range.
///
/// # Arguments
///
/// * `value` - The value to validate.
/// * `range` - The inclusive range to validate against.
///
/// # Returns
///
/// * `Ok(())` if the value is within the range.
/// * `Err(&'static str)` if the value is outside the range.
pub fn is_in_range<T: PartialOrd>(value: T, range: RangeInclusive<T>) -> Result<(), &'static str> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err("Value is outside the specified range")
    }
}

/// Validates if a given string is not empty.
pub fn is_not_empty(value: &str) -> Result<(), &'static str> {
    if !value.is_empty() {
        Ok(())
    } else {
        Err("Value cannot be empty")
    }
}

/// Runs a validation result against a named parameter.
///
/// ```
/// use adv_turbulence::validation::{check, is_positive};
///
/// assert!(check("depth", is_positive(0.15)).is_ok());
/// assert!(check("depth", is_positive(0.0)).is_err());
/// ```
pub fn check(name: &str, result: Result<(), &'static str>) -> AppResult<()> {
    result.map_err(|reason| AdvError::invalid(name, reason))
}
