// Validation utilities
// Author: Gabriel Demetrios Lafis

/// Validate that a fraction lies in `(0, 1]`, or `[0, 1]` when `allow_zero` is set
pub fn validate_fraction(value: f64, name: &str, allow_zero: bool) -> Result<(), String> {
    let lower_ok = if allow_zero { value >= 0.0 } else { value > 0.0 };

    if value.is_finite() && lower_ok && value <= 1.0 {
        Ok(())
    } else if allow_zero {
        Err(format!("'{}' must be between 0 and 1, got {}", name, value))
    } else {
        Err(format!("'{}' must be greater than 0 and at most 1, got {}", name, value))
    }
}

/// Validate that a name is not blank
pub fn validate_not_empty(value: &str, name: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("'{}' cannot be empty", name))
    } else {
        Ok(())
    }
}
