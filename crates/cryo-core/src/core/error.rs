use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Parameter '{parameter}' must be strictly positive and finite, got {value}")]
    NonPositive { parameter: &'static str, value: f64 },

    #[error("Parameter '{parameter}' must be finite, got {value}")]
    NonFinite { parameter: &'static str, value: f64 },

    #[error("Parameter '{parameter}' = {value} lies outside the allowed range [{min}, {max}]")]
    OutOfRange {
        parameter: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("Parameter '{parameter}' has invalid shape {shape:?}: {reason}")]
    InvalidShape {
        parameter: &'static str,
        shape: Vec<usize>,
        reason: &'static str,
    },

    #[error("Parameter '{parameter}' is invalid: {reason}")]
    Invalid {
        parameter: &'static str,
        reason: String,
    },
}

pub(crate) fn require_positive(parameter: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NonPositive { parameter, value })
    }
}

pub(crate) fn require_finite(parameter: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite { parameter, value })
    }
}

pub(crate) fn require_in_range(
    parameter: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<f64, ConfigError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange {
            parameter,
            value,
            min,
            max,
        })
    }
}

pub(crate) fn require_nonempty_shape(
    parameter: &'static str,
    shape: (usize, usize),
) -> Result<(usize, usize), ConfigError> {
    if shape.0 == 0 || shape.1 == 0 {
        Err(ConfigError::InvalidShape {
            parameter,
            shape: vec![shape.0, shape.1],
            reason: "every dimension must be at least one pixel",
        })
    } else {
        Ok(shape)
    }
}
