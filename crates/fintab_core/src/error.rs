use thiserror::Error;

/// Errors raised when geometric inputs violate their invariants.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("{field} must be finite, got {value}")]
    NonFinite { field: &'static str, value: f64 },

    #[error("{field} must be non-negative, got {value}")]
    Negative { field: &'static str, value: f64 },

    #[error("dimensionality must be positive, got {0}")]
    InvalidDimension(usize),
}

pub(crate) fn ensure_finite(field: &'static str, value: f64) -> Result<(), GeometryError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(GeometryError::NonFinite { field, value })
    }
}

pub(crate) fn ensure_non_negative(field: &'static str, value: f64) -> Result<(), GeometryError> {
    ensure_finite(field, value)?;
    if value < 0.0 {
        return Err(GeometryError::Negative { field, value });
    }
    Ok(())
}
