//! Scattering-potential representations.
//!
//! A potential is a real density on a centered cubic grid (or its centered Fourier
//! transform) together with the physical voxel size. The Fourier volume needed by slice
//! extraction is derived lazily, once, and shared between clones.

pub mod atoms;
pub mod scattering_factors;
pub mod voxel;

use crate::core::error::ConfigError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PotentialError {
    #[error("Voxel grid must be a non-empty cube, got shape {shape:?}")]
    NotCubic { shape: Vec<usize> },

    #[error("Unknown element '{0}' has no scattering factors")]
    UnknownElement(String),

    #[error("Got {positions} atom positions but {elements} element labels")]
    AtomCountMismatch { positions: usize, elements: usize },

    #[error("Voxel cloud has {weights} weights but {coordinates} coordinates")]
    CloudLengthMismatch { weights: usize, coordinates: usize },

    #[error("Operation requires a real-space grid, but the potential is stored in Fourier space")]
    RealSpaceRequired,

    #[error("Invalid potential configuration: {0}")]
    Config(#[from] ConfigError),
}
