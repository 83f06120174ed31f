use super::PotentialError;
use crate::core::error::{ConfigError, require_finite, require_positive};
use crate::core::fourier::fft::centered_fftn3;
use crate::core::fourier::grid::centered_coordinates;
use nalgebra::Vector3;
use ndarray::Array3;
use rustfft::num_complex::Complex64;
use std::sync::{Arc, OnceLock};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoxelDomain {
    Real,
    Fourier,
}

#[derive(Debug, Clone)]
enum VoxelData {
    Real {
        grid: Arc<Array3<f64>>,
        fourier: OnceLock<Arc<Array3<Complex64>>>,
    },
    Fourier {
        grid: Arc<Array3<Complex64>>,
    },
}

/// A potential sampled on a centered cubic grid with isotropic voxel size (Ångströms).
#[derive(Debug, Clone)]
pub struct VoxelGridPotential {
    data: VoxelData,
    side_length: usize,
    voxel_size: f64,
}

fn require_cube(shape: (usize, usize, usize)) -> Result<usize, PotentialError> {
    let (nz, ny, nx) = shape;
    if nz == 0 || nz != ny || ny != nx {
        return Err(PotentialError::NotCubic {
            shape: vec![nz, ny, nx],
        });
    }
    Ok(nx)
}

impl VoxelGridPotential {
    pub fn from_real_grid(grid: Array3<f64>, voxel_size: f64) -> Result<Self, PotentialError> {
        let side_length = require_cube(grid.dim())?;
        let voxel_size = require_positive("voxel_size", voxel_size)?;
        if let Some(&value) = grid.iter().find(|v| !v.is_finite()) {
            return Err(ConfigError::NonFinite {
                parameter: "real_voxel_grid",
                value,
            }
            .into());
        }
        Ok(Self {
            data: VoxelData::Real {
                grid: Arc::new(grid),
                fourier: OnceLock::new(),
            },
            side_length,
            voxel_size,
        })
    }

    /// Wraps a centered Fourier volume, i.e. `fftshift(fftn(ifftshift(real_grid)))`.
    pub fn from_fourier_grid(
        grid: Array3<Complex64>,
        voxel_size: f64,
    ) -> Result<Self, PotentialError> {
        let side_length = require_cube(grid.dim())?;
        let voxel_size = require_positive("voxel_size", voxel_size)?;
        if let Some(value) = grid.iter().find(|v| !v.re.is_finite() || !v.im.is_finite()) {
            return Err(ConfigError::NonFinite {
                parameter: "fourier_voxel_grid",
                value: value.norm(),
            }
            .into());
        }
        Ok(Self {
            data: VoxelData::Fourier {
                grid: Arc::new(grid),
            },
            side_length,
            voxel_size,
        })
    }

    pub fn domain(&self) -> VoxelDomain {
        match self.data {
            VoxelData::Real { .. } => VoxelDomain::Real,
            VoxelData::Fourier { .. } => VoxelDomain::Fourier,
        }
    }

    pub fn side_length(&self) -> usize {
        self.side_length
    }

    pub fn voxel_size(&self) -> f64 {
        self.voxel_size
    }

    pub fn real_grid(&self) -> Option<&Array3<f64>> {
        match &self.data {
            VoxelData::Real { grid, .. } => Some(grid.as_ref()),
            VoxelData::Fourier { .. } => None,
        }
    }

    fn fourier_arc(&self) -> &Arc<Array3<Complex64>> {
        match &self.data {
            VoxelData::Real { grid, fourier } => fourier.get_or_init(|| {
                debug!(
                    side_length = self.side_length,
                    "Computing Fourier volume of voxel grid"
                );
                Arc::new(centered_fftn3(grid))
            }),
            VoxelData::Fourier { grid } => grid,
        }
    }

    /// The centered Fourier volume, computed on first use and shared by every clone made
    /// afterwards.
    pub fn fourier_grid(&self) -> &Array3<Complex64> {
        self.fourier_arc().as_ref()
    }

    pub fn shared_fourier_grid(&self) -> Arc<Array3<Complex64>> {
        Arc::clone(self.fourier_arc())
    }

    /// Voxels whose absolute value exceeds `threshold`, as a point cloud.
    pub fn to_cloud(&self, threshold: f64) -> Result<VoxelCloudPotential, PotentialError> {
        let grid = self.real_grid().ok_or(PotentialError::RealSpaceRequired)?;
        let threshold = require_finite("threshold", threshold)?;
        let axis = centered_coordinates(self.side_length, self.voxel_size);
        let (weights, coordinates): (Vec<f64>, Vec<Vector3<f64>>) = grid
            .indexed_iter()
            .filter(|(_, value)| value.abs() > threshold)
            .map(|((iz, iy, ix), &value)| (value, Vector3::new(axis[ix], axis[iy], axis[iz])))
            .unzip();
        VoxelCloudPotential::new(weights, coordinates, self.voxel_size)
    }
}

/// A sparse set of weighted voxels at physical `(x, y, z)` coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelCloudPotential {
    weights: Vec<f64>,
    coordinates: Vec<Vector3<f64>>,
    voxel_size: f64,
}

impl VoxelCloudPotential {
    pub fn new(
        weights: Vec<f64>,
        coordinates: Vec<Vector3<f64>>,
        voxel_size: f64,
    ) -> Result<Self, PotentialError> {
        if weights.len() != coordinates.len() {
            return Err(PotentialError::CloudLengthMismatch {
                weights: weights.len(),
                coordinates: coordinates.len(),
            });
        }
        Ok(Self {
            weights,
            coordinates,
            voxel_size: require_positive("voxel_size", voxel_size)?,
        })
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn coordinates(&self) -> &[Vector3<f64>] {
        &self.coordinates
    }

    pub fn voxel_size(&self) -> f64 {
        self.voxel_size
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}
