use super::ImageError;
use crate::core::error::{ConfigError, require_finite, require_positive};
use crate::core::fourier::grid::CoordinateGrid;
use ndarray::{Array2, Zip};
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaskKind {
    Custom,
    CircularCosine { radius: f64, rolloff_width: f64 },
    SquareCosine { side_length: f64, rolloff_width: f64 },
}

/// A real-space multiplicative mask applied to rendered images.
#[derive(Debug, Clone, PartialEq)]
pub struct Mask {
    kind: MaskKind,
    buffer: Array2<f64>,
}

// Raised-cosine falloff from 1 at `distance = 0` to 0 at `distance = width`.
fn cosine_edge(distance: f64, width: f64) -> f64 {
    if distance <= 0.0 {
        1.0
    } else if distance >= width {
        0.0
    } else {
        0.5 * (1.0 + (PI * distance / width).cos())
    }
}

impl Mask {
    pub fn custom(buffer: Array2<f64>) -> Result<Self, ConfigError> {
        if let Some(&value) = buffer.iter().find(|v| !v.is_finite()) {
            return Err(ConfigError::NonFinite {
                parameter: "mask",
                value,
            });
        }
        Ok(Self {
            kind: MaskKind::Custom,
            buffer,
        })
    }

    /// Unity inside `radius` (Ångströms), rolling off to zero over `rolloff_width`.
    pub fn circular_cosine(
        grid: &CoordinateGrid,
        radius: f64,
        rolloff_width: f64,
    ) -> Result<Self, ConfigError> {
        require_positive("radius", radius)?;
        require_non_negative("rolloff_width", rolloff_width)?;
        let buffer = grid.map(|r| cosine_edge(r.norm() - radius, rolloff_width));
        Ok(Self {
            kind: MaskKind::CircularCosine {
                radius,
                rolloff_width,
            },
            buffer,
        })
    }

    /// Unity inside a centered square of `side_length`, with a separable cosine rolloff.
    pub fn square_cosine(
        grid: &CoordinateGrid,
        side_length: f64,
        rolloff_width: f64,
    ) -> Result<Self, ConfigError> {
        require_positive("side_length", side_length)?;
        require_non_negative("rolloff_width", rolloff_width)?;
        let half_side = 0.5 * side_length;
        let buffer = grid.map(|r| {
            cosine_edge(r.x.abs() - half_side, rolloff_width)
                * cosine_edge(r.y.abs() - half_side, rolloff_width)
        });
        Ok(Self {
            kind: MaskKind::SquareCosine {
                side_length,
                rolloff_width,
            },
            buffer,
        })
    }

    pub fn kind(&self) -> MaskKind {
        self.kind
    }

    pub fn buffer(&self) -> &Array2<f64> {
        &self.buffer
    }

    pub fn shape(&self) -> (usize, usize) {
        self.buffer.dim()
    }

    pub fn apply(&self, image: &Array2<f64>) -> Result<Array2<f64>, ImageError> {
        if image.dim() != self.buffer.dim() {
            return Err(ImageError::ShapeMismatch {
                expected: self.buffer.shape().to_vec(),
                actual: image.shape().to_vec(),
            });
        }
        let mut masked = image.clone();
        Zip::from(&mut masked)
            .and(&self.buffer)
            .for_each(|value, &weight| *value *= weight);
        Ok(masked)
    }
}

fn require_non_negative(parameter: &'static str, value: f64) -> Result<f64, ConfigError> {
    require_finite(parameter, value)?;
    if value < 0.0 {
        return Err(ConfigError::OutOfRange {
            parameter,
            value,
            min: 0.0,
            max: f64::INFINITY,
        });
    }
    Ok(value)
}
