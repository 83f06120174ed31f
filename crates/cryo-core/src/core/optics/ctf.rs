//! The weak-phase contrast transfer function.
//!
//! Conventions follow CTFFIND: defocus is positive for underfocus, the astigmatism angle is
//! measured from the `x` axis to the `defocus_u` direction, and the amplitude contrast ratio
//! enters as the phase `atan2(w, sqrt(1 - w^2))`.

use super::wavelength_in_angstroms;
use crate::core::error::{ConfigError, require_finite, require_in_range, require_positive};
use crate::core::fourier::grid::FrequencyGrid;
use nalgebra::Vector2;
use ndarray::Array2;
use std::f64::consts::{FRAC_PI_2, PI};

const MILLIMETERS_TO_ANGSTROMS: f64 = 1.0e7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContrastTransferFunction {
    defocus_u_in_angstroms: f64,
    defocus_v_in_angstroms: f64,
    astigmatism_angle_in_degrees: f64,
    spherical_aberration_in_mm: f64,
    amplitude_contrast_ratio: f64,
    phase_shift_in_degrees: f64,
}

impl ContrastTransferFunction {
    pub fn builder() -> ContrastTransferFunctionBuilder {
        ContrastTransferFunctionBuilder::new()
    }

    pub fn defocus_u_in_angstroms(&self) -> f64 {
        self.defocus_u_in_angstroms
    }

    pub fn defocus_v_in_angstroms(&self) -> f64 {
        self.defocus_v_in_angstroms
    }

    pub fn astigmatism_angle_in_degrees(&self) -> f64 {
        self.astigmatism_angle_in_degrees
    }

    pub fn spherical_aberration_in_mm(&self) -> f64 {
        self.spherical_aberration_in_mm
    }

    pub fn amplitude_contrast_ratio(&self) -> f64 {
        self.amplitude_contrast_ratio
    }

    pub fn phase_shift_in_degrees(&self) -> f64 {
        self.phase_shift_in_degrees
    }

    /// Defocus seen along the azimuth of `frequency`.
    pub fn defocus_at(&self, frequency: &Vector2<f64>) -> f64 {
        let azimuth = frequency.y.atan2(frequency.x);
        let mean = 0.5 * (self.defocus_u_in_angstroms + self.defocus_v_in_angstroms);
        let half_difference = 0.5 * (self.defocus_u_in_angstroms - self.defocus_v_in_angstroms);
        let angle = azimuth - self.astigmatism_angle_in_degrees.to_radians();
        mean + half_difference * (2.0 * angle).cos()
    }

    /// Aberration phase `chi(q)`, including the additional phase shift.
    pub fn phase(&self, frequency: &Vector2<f64>, wavelength: f64) -> f64 {
        let k2 = frequency.norm_squared();
        let cs = self.spherical_aberration_in_mm * MILLIMETERS_TO_ANGSTROMS;
        PI * wavelength * self.defocus_at(frequency) * k2
            - FRAC_PI_2 * cs * wavelength.powi(3) * k2 * k2
            + self.phase_shift_in_degrees.to_radians()
    }

    pub fn evaluate(&self, frequency: &Vector2<f64>, wavelength: f64) -> f64 {
        let w = self.amplitude_contrast_ratio;
        let amplitude_phase = w.atan2((1.0 - w * w).sqrt());
        -(self.phase(frequency, wavelength) + amplitude_phase).sin()
    }

    pub fn on_grid(&self, grid: &FrequencyGrid, voltage_in_kilovolts: f64) -> Array2<f64> {
        let wavelength = wavelength_in_angstroms(voltage_in_kilovolts);
        grid.map(|q| self.evaluate(&q, wavelength))
    }
}

#[derive(Default)]
pub struct ContrastTransferFunctionBuilder {
    defocus_u_in_angstroms: Option<f64>,
    defocus_v_in_angstroms: Option<f64>,
    astigmatism_angle_in_degrees: Option<f64>,
    spherical_aberration_in_mm: Option<f64>,
    amplitude_contrast_ratio: Option<f64>,
    phase_shift_in_degrees: Option<f64>,
}

impl ContrastTransferFunctionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defocus_u_in_angstroms(mut self, defocus: f64) -> Self {
        self.defocus_u_in_angstroms = Some(defocus);
        self
    }
    pub fn defocus_v_in_angstroms(mut self, defocus: f64) -> Self {
        self.defocus_v_in_angstroms = Some(defocus);
        self
    }
    /// Sets both defocus values, giving an astigmatism-free CTF.
    pub fn defocus_in_angstroms(self, defocus: f64) -> Self {
        self.defocus_u_in_angstroms(defocus)
            .defocus_v_in_angstroms(defocus)
    }
    pub fn astigmatism_angle_in_degrees(mut self, angle: f64) -> Self {
        self.astigmatism_angle_in_degrees = Some(angle);
        self
    }
    pub fn spherical_aberration_in_mm(mut self, cs: f64) -> Self {
        self.spherical_aberration_in_mm = Some(cs);
        self
    }
    pub fn amplitude_contrast_ratio(mut self, ratio: f64) -> Self {
        self.amplitude_contrast_ratio = Some(ratio);
        self
    }
    pub fn phase_shift_in_degrees(mut self, shift: f64) -> Self {
        self.phase_shift_in_degrees = Some(shift);
        self
    }

    /// `defocus_u` is required; `defocus_v` defaults to it. Spherical aberration defaults
    /// to zero, amplitude contrast to 0.1, the remaining angles to zero.
    pub fn build(self) -> Result<ContrastTransferFunction, ConfigError> {
        let defocus_u = self
            .defocus_u_in_angstroms
            .ok_or(ConfigError::MissingParameter("defocus_u_in_angstroms"))?;
        let defocus_u = require_positive("defocus_u_in_angstroms", defocus_u)?;
        let defocus_v = require_positive(
            "defocus_v_in_angstroms",
            self.defocus_v_in_angstroms.unwrap_or(defocus_u),
        )?;
        let spherical_aberration = self.spherical_aberration_in_mm.unwrap_or(0.0);
        let spherical_aberration =
            require_in_range("spherical_aberration_in_mm", spherical_aberration, 0.0, f64::MAX)?;

        Ok(ContrastTransferFunction {
            defocus_u_in_angstroms: defocus_u,
            defocus_v_in_angstroms: defocus_v,
            astigmatism_angle_in_degrees: require_finite(
                "astigmatism_angle_in_degrees",
                self.astigmatism_angle_in_degrees.unwrap_or(0.0),
            )?,
            spherical_aberration_in_mm: spherical_aberration,
            amplitude_contrast_ratio: require_in_range(
                "amplitude_contrast_ratio",
                self.amplitude_contrast_ratio.unwrap_or(0.1),
                0.0,
                1.0,
            )?,
            phase_shift_in_degrees: require_finite(
                "phase_shift_in_degrees",
                self.phase_shift_in_degrees.unwrap_or(0.0),
            )?,
        })
    }
}
