use crate::core::error::{ConfigError, require_nonempty_shape, require_positive};
use crate::core::fourier::grid::{CoordinateGrid, FrequencyGrid};
use crate::core::image::ImageError;
use crate::core::image::edges::{crop_to_shape, pad_to_shape};
use crate::core::optics::wavelength_in_angstroms;
use ndarray::Array2;

pub const DEFAULT_VOLTAGE_IN_KILOVOLTS: f64 = 300.0;

/// Detector geometry and beam energy shared by every stage of image formation.
///
/// Projections are computed on `padded_shape` and cropped back to `shape` in real space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstrumentConfig {
    shape: (usize, usize),
    padded_shape: (usize, usize),
    pixel_size: f64,
    voltage_in_kilovolts: f64,
}

impl InstrumentConfig {
    pub fn new(
        shape: (usize, usize),
        pixel_size: f64,
        voltage_in_kilovolts: f64,
    ) -> Result<Self, ConfigError> {
        InstrumentConfigBuilder::new()
            .shape(shape)
            .pixel_size(pixel_size)
            .voltage_in_kilovolts(voltage_in_kilovolts)
            .build()
    }

    pub fn builder() -> InstrumentConfigBuilder {
        InstrumentConfigBuilder::new()
    }

    pub fn shape(&self) -> (usize, usize) {
        self.shape
    }

    pub fn padded_shape(&self) -> (usize, usize) {
        self.padded_shape
    }

    pub fn is_padded(&self) -> bool {
        self.shape != self.padded_shape
    }

    /// Pixel size in Ångströms.
    pub fn pixel_size(&self) -> f64 {
        self.pixel_size
    }

    pub fn voltage_in_kilovolts(&self) -> f64 {
        self.voltage_in_kilovolts
    }

    pub fn wavelength_in_angstroms(&self) -> f64 {
        wavelength_in_angstroms(self.voltage_in_kilovolts)
    }

    pub fn frequency_grid(&self) -> FrequencyGrid {
        FrequencyGrid::new(self.shape, self.pixel_size)
    }

    pub fn padded_frequency_grid(&self) -> FrequencyGrid {
        FrequencyGrid::new(self.padded_shape, self.pixel_size)
    }

    pub fn coordinate_grid(&self) -> CoordinateGrid {
        CoordinateGrid::new(self.shape, self.pixel_size)
    }

    pub fn padded_coordinate_grid(&self) -> CoordinateGrid {
        CoordinateGrid::new(self.padded_shape, self.pixel_size)
    }

    /// Crops a padded real-space image back to the output shape.
    pub fn crop_to_shape(&self, image: &Array2<f64>) -> Result<Array2<f64>, ImageError> {
        if image.dim() != self.padded_shape {
            return Err(ImageError::ShapeMismatch {
                expected: vec![self.padded_shape.0, self.padded_shape.1],
                actual: image.shape().to_vec(),
            });
        }
        crop_to_shape(image, self.shape)
    }

    /// Zero-pads an output-shaped real-space image to the padded shape.
    pub fn pad_to_shape(&self, image: &Array2<f64>) -> Result<Array2<f64>, ImageError> {
        if image.dim() != self.shape {
            return Err(ImageError::ShapeMismatch {
                expected: vec![self.shape.0, self.shape.1],
                actual: image.shape().to_vec(),
            });
        }
        pad_to_shape(image, self.padded_shape)
    }
}

#[derive(Default)]
pub struct InstrumentConfigBuilder {
    shape: Option<(usize, usize)>,
    padded_shape: Option<(usize, usize)>,
    pad_scale: Option<f64>,
    pixel_size: Option<f64>,
    voltage_in_kilovolts: Option<f64>,
}

impl InstrumentConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shape(mut self, shape: (usize, usize)) -> Self {
        self.shape = Some(shape);
        self
    }
    pub fn padded_shape(mut self, shape: (usize, usize)) -> Self {
        self.padded_shape = Some(shape);
        self
    }
    /// Pads each dimension by `factor`, rounding up. Ignored when `padded_shape` is set.
    pub fn pad_scale(mut self, factor: f64) -> Self {
        self.pad_scale = Some(factor);
        self
    }
    pub fn pixel_size(mut self, pixel_size: f64) -> Self {
        self.pixel_size = Some(pixel_size);
        self
    }
    pub fn voltage_in_kilovolts(mut self, voltage: f64) -> Self {
        self.voltage_in_kilovolts = Some(voltage);
        self
    }

    pub fn build(self) -> Result<InstrumentConfig, ConfigError> {
        let shape = self.shape.ok_or(ConfigError::MissingParameter("shape"))?;
        let shape = require_nonempty_shape("shape", shape)?;
        let padded_shape = match (self.padded_shape, self.pad_scale) {
            (Some(padded_shape), _) => padded_shape,
            (None, Some(factor)) => {
                let factor = require_positive("pad_scale", factor)?;
                let scale = |n: usize| (n as f64 * factor).ceil() as usize;
                (scale(shape.0), scale(shape.1))
            }
            (None, None) => shape,
        };
        if padded_shape.0 < shape.0 || padded_shape.1 < shape.1 {
            return Err(ConfigError::InvalidShape {
                parameter: "padded_shape",
                shape: vec![padded_shape.0, padded_shape.1],
                reason: "padded shape must be at least as large as the output shape",
            });
        }
        let pixel_size = self
            .pixel_size
            .ok_or(ConfigError::MissingParameter("pixel_size"))?;

        Ok(InstrumentConfig {
            shape,
            padded_shape,
            pixel_size: require_positive("pixel_size", pixel_size)?,
            voltage_in_kilovolts: require_positive(
                "voltage_in_kilovolts",
                self.voltage_in_kilovolts
                    .unwrap_or(DEFAULT_VOLTAGE_IN_KILOVOLTS),
            )?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_applies_defaults() {
        let config = InstrumentConfig::builder()
            .shape((8, 10))
            .pixel_size(1.2)
            .build()
            .unwrap();
        assert_eq!(config.padded_shape(), (8, 10));
        assert!(!config.is_padded());
        assert_eq!(config.voltage_in_kilovolts(), DEFAULT_VOLTAGE_IN_KILOVOLTS);
        assert_eq!(config.frequency_grid().shape(), (8, 6));
    }

    #[test]
    fn non_positive_pixel_size_fails_at_build_time() {
        for pixel_size in [0.0, -1.0, f64::NAN] {
            let result = InstrumentConfig::new((8, 8), pixel_size, 300.0);
            assert!(matches!(
                result,
                Err(ConfigError::NonPositive {
                    parameter: "pixel_size",
                    ..
                })
            ));
        }
    }

    #[test]
    fn missing_shape_is_reported() {
        let result = InstrumentConfig::builder().pixel_size(1.0).build();
        assert_eq!(result, Err(ConfigError::MissingParameter("shape")));
    }

    #[test]
    fn empty_or_undersized_padding_is_rejected() {
        assert!(InstrumentConfig::new((0, 8), 1.0, 300.0).is_err());
        let result = InstrumentConfig::builder()
            .shape((8, 8))
            .padded_shape((6, 12))
            .pixel_size(1.0)
            .build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidShape {
                parameter: "padded_shape",
                ..
            })
        ));
    }

    #[test]
    fn pad_scale_rounds_up_and_crop_restores_shape() {
        let config = InstrumentConfig::builder()
            .shape((5, 6))
            .pad_scale(1.5)
            .pixel_size(1.0)
            .build()
            .unwrap();
        assert_eq!(config.padded_shape(), (8, 9));
        assert!(config.is_padded());
        assert_eq!(config.padded_coordinate_grid().shape(), (8, 9));
        assert_eq!(config.coordinate_grid().shape(), (5, 6));
        let padded = Array2::from_elem((8, 9), 1.0);
        assert_eq!(config.crop_to_shape(&padded).unwrap().dim(), (5, 6));
        assert!(config.crop_to_shape(&Array2::zeros((5, 6))).is_err());

        let image = Array2::from_shape_fn((5, 6), |(y, x)| (y * 6 + x) as f64);
        let round_trip = config.crop_to_shape(&config.pad_to_shape(&image).unwrap());
        assert_eq!(round_trip.unwrap(), image);
    }
}
