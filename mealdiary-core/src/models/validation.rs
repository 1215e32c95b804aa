use crate::error::ValidationError;

pub(crate) fn check_range(
    field: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), ValidationError> {
    if value.is_nan() || value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field,
            value,
            min,
            max,
        });
    }
    Ok(())
}

/// Length is checked in characters, not bytes.
pub(crate) fn check_len(
    field: &'static str,
    value: &str,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(ValidationError::Length {
            field,
            len,
            min,
            max,
        });
    }
    Ok(())
}

pub(crate) fn check_count(
    field: &'static str,
    count: usize,
    min: usize,
    max: usize,
) -> Result<(), ValidationError> {
    if count < min || count > max {
        return Err(ValidationError::Count {
            field,
            count,
            min,
            max,
        });
    }
    Ok(())
}
