//! Projection integrators: potential + pose → half-plane Fourier projection.
//!
//! Every integrator returns the projection on the instrument's *padded* frequency grid,
//! scaled so that it equals the 2-D DFT of the projected potential sampled on the pixel grid,
//! with even-size Nyquist modes zeroed and the pose translation already applied.

pub mod fourier_slice;
pub mod nufft;

pub use fourier_slice::{FourierSliceExtraction, InterpolationOrder};
pub use nufft::NonUniformProjection;

use crate::core::fourier::grid::FrequencyGrid;
use crate::core::models::instrument::InstrumentConfig;
use crate::core::models::pose::PoseModel;
use crate::core::potential::voxel::{VoxelDomain, VoxelGridPotential};
use ndarray::{Array2, Zip};
use rustfft::num_complex::Complex64;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("Projection method '{method}' cannot integrate a potential stored in {domain:?} space")]
    UnsupportedPotential {
        method: &'static str,
        domain: VoxelDomain,
    },
}

pub trait PotentialIntegrator<P>: Send + Sync {
    fn integrate(
        &self,
        potential: &P,
        pose: &dyn PoseModel,
        instrument: &InstrumentConfig,
    ) -> Result<Array2<Complex64>, ProjectionError>;
}

/// Ratio converting volume DFT samples into image DFT samples.
pub(crate) fn projection_scale(voxel_size: f64, pixel_size: f64) -> f64 {
    voxel_size.powi(3) / (pixel_size * pixel_size)
}

/// Zeroes the even-size Nyquist modes and applies the pose translation.
pub(crate) fn finalize_projection(
    projection: &mut Array2<Complex64>,
    grid: &FrequencyGrid,
    pose: &dyn PoseModel,
) {
    let (ny, nx) = grid.full_shape();
    let zero = Complex64::new(0.0, 0.0);
    if ny % 2 == 0 && ny > 0 {
        projection.row_mut(ny / 2).fill(zero);
    }
    if nx % 2 == 0 && nx > 0 {
        projection.column_mut(nx / 2).fill(zero);
    }
    if pose.offset() != nalgebra::Vector2::zeros() {
        let shifts = pose.phase_shifts(grid);
        Zip::from(projection)
            .and(&shifts)
            .for_each(|value, &shift| *value *= shift);
    }
}

/// Runtime choice between the available integrators for voxel grids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectionMethod {
    FourierSlice(FourierSliceExtraction),
    NonUniform(NonUniformProjection),
}

impl Default for ProjectionMethod {
    fn default() -> Self {
        ProjectionMethod::FourierSlice(FourierSliceExtraction::default())
    }
}

impl PotentialIntegrator<VoxelGridPotential> for ProjectionMethod {
    fn integrate(
        &self,
        potential: &VoxelGridPotential,
        pose: &dyn PoseModel,
        instrument: &InstrumentConfig,
    ) -> Result<Array2<Complex64>, ProjectionError> {
        match self {
            ProjectionMethod::FourierSlice(method) => method.integrate(potential, pose, instrument),
            ProjectionMethod::NonUniform(method) => method.integrate(potential, pose, instrument),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::pose::EulerAnglePose;

    #[test]
    fn finalize_zeroes_nyquist_modes_of_even_grids_only() {
        let pose = EulerAnglePose::identity();
        let even = FrequencyGrid::new((4, 6), 1.0);
        let mut projection = Array2::from_elem(even.shape(), Complex64::new(1.0, 0.0));
        finalize_projection(&mut projection, &even, &pose);
        assert_eq!(projection[[2, 1]], Complex64::new(0.0, 0.0));
        assert_eq!(projection[[1, 3]], Complex64::new(0.0, 0.0));
        assert_eq!(projection[[1, 1]], Complex64::new(1.0, 0.0));

        let odd = FrequencyGrid::new((5, 5), 1.0);
        let mut projection = Array2::from_elem(odd.shape(), Complex64::new(1.0, 0.0));
        finalize_projection(&mut projection, &odd, &pose);
        assert!(projection.iter().all(|&v| v == Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn projection_scale_is_unity_for_matching_unit_sizes() {
        assert_eq!(projection_scale(1.0, 1.0), 1.0);
        assert_eq!(projection_scale(2.0, 1.0), 8.0);
    }
}
