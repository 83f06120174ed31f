pub use crate::core::error::ConfigError;
pub use crate::core::models::instrument::{InstrumentConfig, InstrumentConfigBuilder};
pub use crate::core::optics::ctf::{ContrastTransferFunction, ContrastTransferFunctionBuilder};

use super::integrators::{FourierSliceExtraction, NonUniformProjection, ProjectionMethod};
use super::pipeline::ImagingPipeline;
use super::scattering::LinearScatteringTheory;
use super::transfer::ContrastTransferTheory;
use crate::core::models::ensemble::StructuralEnsemble;
use crate::core::models::pose::{AxisAnglePose, EulerAnglePose, Pose, QuaternionPose};
use crate::core::potential::voxel::VoxelGridPotential;
use nalgebra::Vector3;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// The pipeline assembled from an [`ImagingSettings`] document.
pub type VoxelImagingPipeline = ImagingPipeline<
    LinearScatteringTheory<VoxelGridPotential, ProjectionMethod, ContrastTransferTheory>,
>;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid settings: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InstrumentSettings {
    pub shape: [usize; 2],
    #[serde(rename = "pixel-size")]
    pub pixel_size: f64,
    #[serde(rename = "voltage-in-kilovolts")]
    pub voltage_in_kilovolts: Option<f64>,
    #[serde(rename = "padded-shape")]
    pub padded_shape: Option<[usize; 2]>,
    #[serde(rename = "pad-scale")]
    pub pad_scale: Option<f64>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case", tag = "type", deny_unknown_fields)]
pub enum PoseSettings {
    Euler {
        #[serde(default, rename = "offset-x")]
        offset_x: f64,
        #[serde(default, rename = "offset-y")]
        offset_y: f64,
        #[serde(default)]
        phi: f64,
        #[serde(default)]
        theta: f64,
        #[serde(default)]
        psi: f64,
    },
    Quaternion {
        #[serde(default, rename = "offset-x")]
        offset_x: f64,
        #[serde(default, rename = "offset-y")]
        offset_y: f64,
        wxyz: [f64; 4],
    },
    AxisAngle {
        #[serde(default, rename = "offset-x")]
        offset_x: f64,
        #[serde(default, rename = "offset-y")]
        offset_y: f64,
        axis: [f64; 3],
        angle: f64,
    },
}

impl Default for PoseSettings {
    fn default() -> Self {
        PoseSettings::Euler {
            offset_x: 0.0,
            offset_y: 0.0,
            phi: 0.0,
            theta: 0.0,
            psi: 0.0,
        }
    }
}

impl PoseSettings {
    pub fn to_pose(&self) -> Result<Pose, ConfigError> {
        Ok(match *self {
            PoseSettings::Euler {
                offset_x,
                offset_y,
                phi,
                theta,
                psi,
            } => EulerAnglePose::new(offset_x, offset_y, phi, theta, psi)?.into(),
            PoseSettings::Quaternion {
                offset_x,
                offset_y,
                wxyz,
            } => QuaternionPose::new(offset_x, offset_y, wxyz)?.into(),
            PoseSettings::AxisAngle {
                offset_x,
                offset_y,
                axis,
                angle,
            } => AxisAnglePose::new(offset_x, offset_y, Vector3::from(axis), angle)?.into(),
        })
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TransferSettings {
    #[serde(rename = "defocus-u")]
    pub defocus_u: f64,
    #[serde(rename = "defocus-v")]
    pub defocus_v: Option<f64>,
    #[serde(rename = "astigmatism-angle")]
    pub astigmatism_angle: Option<f64>,
    #[serde(rename = "spherical-aberration-in-mm")]
    pub spherical_aberration_in_mm: Option<f64>,
    #[serde(rename = "amplitude-contrast-ratio")]
    pub amplitude_contrast_ratio: Option<f64>,
    #[serde(rename = "phase-shift")]
    pub phase_shift: Option<f64>,
    #[serde(rename = "b-factor")]
    pub b_factor: Option<f64>,
}

impl TransferSettings {
    pub fn to_transfer_theory(&self) -> Result<ContrastTransferTheory, ConfigError> {
        let mut builder =
            ContrastTransferFunction::builder().defocus_u_in_angstroms(self.defocus_u);
        if let Some(defocus_v) = self.defocus_v {
            builder = builder.defocus_v_in_angstroms(defocus_v);
        }
        if let Some(angle) = self.astigmatism_angle {
            builder = builder.astigmatism_angle_in_degrees(angle);
        }
        if let Some(cs) = self.spherical_aberration_in_mm {
            builder = builder.spherical_aberration_in_mm(cs);
        }
        if let Some(ratio) = self.amplitude_contrast_ratio {
            builder = builder.amplitude_contrast_ratio(ratio);
        }
        if let Some(shift) = self.phase_shift {
            builder = builder.phase_shift_in_degrees(shift);
        }
        let theory = ContrastTransferTheory::new(builder.build()?);
        match self.b_factor {
            Some(b_factor) => theory.with_b_factor(b_factor),
            None => Ok(theory),
        }
    }
}

fn default_interpolation_order() -> u32 {
    1
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", tag = "type", deny_unknown_fields)]
pub enum IntegratorSettings {
    FourierSlice {
        #[serde(
            default = "default_interpolation_order",
            rename = "interpolation-order"
        )]
        interpolation_order: u32,
    },
    NonUniform,
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        IntegratorSettings::FourierSlice {
            interpolation_order: default_interpolation_order(),
        }
    }
}

impl IntegratorSettings {
    pub fn to_projection_method(&self) -> Result<ProjectionMethod, ConfigError> {
        Ok(match *self {
            IntegratorSettings::FourierSlice {
                interpolation_order,
            } => ProjectionMethod::FourierSlice(FourierSliceExtraction::with_order(
                interpolation_order,
            )?),
            IntegratorSettings::NonUniform => ProjectionMethod::NonUniform(NonUniformProjection),
        })
    }
}

/// A complete imaging setup as written in a TOML file.
///
/// ```toml
/// [instrument]
/// shape = [128, 128]
/// pixel-size = 1.1
///
/// [pose]
/// type = "euler"
/// theta = 35.0
///
/// [transfer]
/// defocus-u = 12000.0
/// b-factor = 80.0
///
/// [integrator]
/// type = "fourier-slice"
/// interpolation-order = 1
/// ```
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ImagingSettings {
    pub instrument: InstrumentSettings,
    #[serde(default)]
    pub pose: PoseSettings,
    pub transfer: TransferSettings,
    #[serde(default)]
    pub integrator: IntegratorSettings,
}

impl ImagingSettings {
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        toml::from_str(content).map_err(|e| SettingsError::Toml {
            path: "<string>".to_string(),
            source: e,
        })
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        debug!("Loading imaging settings from file: {:?}", path);
        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| SettingsError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })
    }

    /// Validates every section and builds the runtime components.
    pub fn into_components(self) -> Result<ImagingComponents, SettingsError> {
        let mut builder = InstrumentConfig::builder()
            .shape((self.instrument.shape[0], self.instrument.shape[1]))
            .pixel_size(self.instrument.pixel_size);
        if let Some(voltage) = self.instrument.voltage_in_kilovolts {
            builder = builder.voltage_in_kilovolts(voltage);
        }
        if let Some([ny, nx]) = self.instrument.padded_shape {
            builder = builder.padded_shape((ny, nx));
        }
        if let Some(factor) = self.instrument.pad_scale {
            builder = builder.pad_scale(factor);
        }

        Ok(ImagingComponents {
            instrument: builder.build()?,
            pose: self.pose.to_pose()?,
            transfer_theory: self.transfer.to_transfer_theory()?,
            projection_method: self.integrator.to_projection_method()?,
        })
    }
}

/// Validated runtime objects built from [`ImagingSettings`].
#[derive(Debug, Clone)]
pub struct ImagingComponents {
    pub instrument: InstrumentConfig,
    pub pose: Pose,
    pub transfer_theory: ContrastTransferTheory,
    pub projection_method: ProjectionMethod,
}

impl ImagingComponents {
    pub fn into_pipeline(self, potential: VoxelGridPotential) -> VoxelImagingPipeline {
        let scattering_theory = LinearScatteringTheory::new(
            StructuralEnsemble::single(potential, self.pose),
            self.projection_method,
            self.transfer_theory,
        );
        ImagingPipeline::new(self.instrument, scattering_theory)
    }
}
