use thiserror::Error;

use super::integrators::ProjectionError;
use crate::core::error::ConfigError;
use crate::core::fourier::FourierError;
use crate::core::image::ImageError;
use crate::core::potential::PotentialError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Potential error: {source}")]
    Potential {
        #[from]
        source: PotentialError,
    },

    #[error("Projection failed: {source}")]
    Projection {
        #[from]
        source: ProjectionError,
    },

    #[error("Fourier transform failed: {source}")]
    Fourier {
        #[from]
        source: FourierError,
    },

    #[error("Cannot normalize image: variance {variance:e} is below the floor {floor:e}")]
    DegenerateNormalization { variance: f64, floor: f64 },

    #[error("Shape mismatch in {context}: expected {expected:?}, found {actual:?}")]
    ShapeMismatch {
        context: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },
}

impl From<ImageError> for EngineError {
    fn from(error: ImageError) -> Self {
        match error {
            ImageError::DegenerateVariance { variance, floor } => {
                EngineError::DegenerateNormalization { variance, floor }
            }
            ImageError::ShapeMismatch { expected, actual } => EngineError::ShapeMismatch {
                context: "image operation",
                expected,
                actual,
            },
            ImageError::CropLarger { actual, requested } => EngineError::ShapeMismatch {
                context: "crop",
                expected: requested,
                actual,
            },
            ImageError::PadSmaller { actual, requested } => EngineError::ShapeMismatch {
                context: "pad",
                expected: requested,
                actual,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_variance_maps_to_normalization_error() {
        let error = EngineError::from(ImageError::DegenerateVariance {
            variance: 0.0,
            floor: 1e-12,
        });
        assert!(matches!(
            error,
            EngineError::DegenerateNormalization { floor, .. } if floor == 1e-12
        ));
    }

    #[test]
    fn config_errors_convert_with_context() {
        let error: EngineError = ConfigError::MissingParameter("pixel_size").into();
        assert_eq!(
            error.to_string(),
            "Invalid configuration: Missing required parameter: pixel_size"
        );
    }
}
