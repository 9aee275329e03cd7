//! City model error types.
//!
//! These errors cover malformed graph text and out-of-range builder
//! parameters. They are always surfaced to the caller and never retried.

/// Errors from building or parsing a city graph or demand matrix.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CityError {
    /// Graph text is malformed (bad header, wrong line count, unparseable field)
    #[error("format error: {0}")]
    Format(String),

    /// A builder parameter or matrix is out of range
    #[error("validation error: {0}")]
    Validation(String),
}

/// Parse a named numeric builder parameter from text.
///
/// Used when parameters arrive as loosely-typed form fields.
pub(crate) fn parse_float(field: &str, text: &str) -> Result<f64, CityError> {
    let value: f64 = text
        .trim()
        .parse()
        .map_err(|_| CityError::Validation(format!("{field} must be a number")))?;

    if !value.is_finite() {
        return Err(CityError::Validation(format!("{field} must be finite")));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = CityError::Format("missing header".into());
        assert_eq!(err.to_string(), "format error: missing header");

        let err = CityError::Validation("y must be positive".into());
        assert_eq!(err.to_string(), "validation error: y must be positive");
    }

    #[test]
    fn parse_float_accepts_numbers() {
        assert_eq!(parse_float("l", "1.5").unwrap(), 1.5);
        assert_eq!(parse_float("l", " 2 ").unwrap(), 2.0);
        assert_eq!(parse_float("l", "-3").unwrap(), -3.0);
    }

    #[test]
    fn parse_float_rejects_garbage() {
        let err = parse_float("alpha", "abc").unwrap_err();
        assert_eq!(
            err,
            CityError::Validation("alpha must be a number".to_string())
        );
        assert!(parse_float("g", "").is_err());
        assert!(parse_float("g", "inf").is_err());
        assert!(parse_float("g", "NaN").is_err());
    }
}
