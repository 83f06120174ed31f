use super::{PotentialIntegrator, ProjectionError, finalize_projection, projection_scale};
use crate::core::fourier::grid::{FrequencyGrid, voxel_coordinates};
use crate::core::models::instrument::InstrumentConfig;
use crate::core::models::pose::PoseModel;
use crate::core::potential::voxel::{VoxelCloudPotential, VoxelGridPotential};
use nalgebra::{Vector2, Vector3};
use ndarray::Array2;
use rustfft::num_complex::Complex64;
use std::f64::consts::PI;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Exact projection by a direct non-uniform DFT of the rotated voxel positions.
///
/// Slower than slice extraction but free of interpolation error; it agrees with the slice
/// exactly whenever the slice samples fall on grid points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NonUniformProjection;

impl NonUniformProjection {
    pub fn new() -> Self {
        Self
    }
}

fn evaluate_modes(
    points: &[(f64, Vector2<f64>)],
    grid: &FrequencyGrid,
    scale: f64,
) -> Array2<Complex64> {
    let (ny, nxh) = grid.shape();
    let mode = |iy: usize, ix: usize| -> Complex64 {
        let q = grid.frequency(iy, ix);
        let sum: Complex64 = points
            .iter()
            .map(|(weight, r)| Complex64::from_polar(*weight, -2.0 * PI * q.dot(r)))
            .sum();
        sum * scale
    };
    let row = |iy: usize| -> Vec<Complex64> { (0..nxh).map(|ix| mode(iy, ix)).collect() };

    #[cfg(not(feature = "parallel"))]
    let rows: Vec<Vec<Complex64>> = (0..ny).map(row).collect();

    #[cfg(feature = "parallel")]
    let rows: Vec<Vec<Complex64>> = (0..ny).into_par_iter().map(row).collect();

    Array2::from_shape_fn((ny, nxh), |(iy, ix)| rows[iy][ix])
}

fn project_points<'a>(
    points: impl Iterator<Item = (f64, &'a Vector3<f64>)>,
    voxel_size: f64,
    pose: &dyn PoseModel,
    instrument: &InstrumentConfig,
) -> Array2<Complex64> {
    let rotation = pose.rotation();
    let rotated: Vec<(f64, Vector2<f64>)> = points
        .filter(|(weight, _)| *weight != 0.0)
        .map(|(weight, r)| {
            let r = rotation * r;
            (weight, Vector2::new(r.x, r.y))
        })
        .collect();
    debug!(points = rotated.len(), "Evaluating non-uniform DFT");

    let grid = instrument.padded_frequency_grid();
    let scale = projection_scale(voxel_size, instrument.pixel_size());
    let mut projection = evaluate_modes(&rotated, &grid, scale);
    finalize_projection(&mut projection, &grid, pose);
    projection
}

impl PotentialIntegrator<VoxelGridPotential> for NonUniformProjection {
    #[instrument(skip_all, name = "non_uniform_projection")]
    fn integrate(
        &self,
        potential: &VoxelGridPotential,
        pose: &dyn PoseModel,
        instrument: &InstrumentConfig,
    ) -> Result<Array2<Complex64>, ProjectionError> {
        let real_grid = potential
            .real_grid()
            .ok_or(ProjectionError::UnsupportedPotential {
                method: "non-uniform",
                domain: potential.domain(),
            })?;
        let coordinates = voxel_coordinates(potential.side_length(), potential.voxel_size());
        let points = real_grid.iter().copied().zip(coordinates.iter());
        Ok(project_points(points, potential.voxel_size(), pose, instrument))
    }
}

impl PotentialIntegrator<VoxelCloudPotential> for NonUniformProjection {
    #[instrument(skip_all, name = "non_uniform_projection")]
    fn integrate(
        &self,
        potential: &VoxelCloudPotential,
        pose: &dyn PoseModel,
        instrument: &InstrumentConfig,
    ) -> Result<Array2<Complex64>, ProjectionError> {
        let points = potential
            .weights()
            .iter()
            .copied()
            .zip(potential.coordinates().iter());
        Ok(project_points(points, potential.voxel_size(), pose, instrument))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::pose::EulerAnglePose;
    use crate::engine::integrators::FourierSliceExtraction;
    use ndarray::Array3;

    const TOLERANCE: f64 = 1e-9;

    fn lumpy_volume(n: usize) -> Array3<f64> {
        Array3::from_shape_fn((n, n, n), |(z, y, x)| {
            if (x + 2 * y + 3 * z) % 7 == 0 {
                1.0 + 0.1 * x as f64 - 0.05 * z as f64
            } else {
                0.0
            }
        })
    }

    fn max_difference(a: &Array2<Complex64>, b: &Array2<Complex64>) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).norm())
            .fold(0.0, f64::max)
    }

    #[test]
    fn agrees_with_slice_for_identity_pose_on_odd_and_even_grids() {
        for n in [7, 8] {
            let potential = VoxelGridPotential::from_real_grid(lumpy_volume(n), 1.0).unwrap();
            let instrument = InstrumentConfig::new((n, n), 1.0, 300.0).unwrap();
            let pose = EulerAnglePose::new(1.0, -2.0, 0.0, 0.0, 0.0).unwrap();
            let exact = NonUniformProjection
                .integrate(&potential, &pose, &instrument)
                .unwrap();
            let slice = FourierSliceExtraction::default()
                .integrate(&potential, &pose, &instrument)
                .unwrap();
            assert!(max_difference(&exact, &slice) < TOLERANCE, "n = {n}");
        }
    }

    #[test]
    fn cloud_and_grid_give_identical_projections() {
        let n = 7;
        let potential = VoxelGridPotential::from_real_grid(lumpy_volume(n), 1.0).unwrap();
        let cloud = potential.to_cloud(0.0).unwrap();
        let instrument = InstrumentConfig::new((n, n), 1.0, 300.0).unwrap();
        let pose = EulerAnglePose::new(0.0, 0.0, 15.0, 40.0, -70.0).unwrap();
        let from_grid = NonUniformProjection
            .integrate(&potential, &pose, &instrument)
            .unwrap();
        let from_cloud = NonUniformProjection
            .integrate(&cloud, &pose, &instrument)
            .unwrap();
        assert!(max_difference(&from_grid, &from_cloud) < TOLERANCE);
    }

    #[test]
    fn fourier_domain_grid_is_unsupported() {
        let potential = VoxelGridPotential::from_fourier_grid(
            Array3::from_elem((3, 3, 3), Complex64::new(1.0, 0.0)),
            1.0,
        )
        .unwrap();
        let instrument = InstrumentConfig::new((3, 3), 1.0, 300.0).unwrap();
        let result =
            NonUniformProjection.integrate(&potential, &EulerAnglePose::identity(), &instrument);
        assert!(matches!(
            result,
            Err(ProjectionError::UnsupportedPotential { .. })
        ));
    }

    #[test]
    fn zero_frequency_is_total_mass_at_any_pose() {
        let n = 6;
        let volume = lumpy_volume(n);
        let total = volume.sum();
        let potential = VoxelGridPotential::from_real_grid(volume, 1.0).unwrap();
        let instrument = InstrumentConfig::new((n, n), 1.0, 300.0).unwrap();
        let pose = EulerAnglePose::new(0.0, 0.0, 33.0, 71.0, 12.0).unwrap();
        let projection = NonUniformProjection
            .integrate(&potential, &pose, &instrument)
            .unwrap();
        assert!((projection[[0, 0]] - Complex64::new(total, 0.0)).norm() < TOLERANCE);
    }
}
