use super::{PotentialIntegrator, ProjectionError, finalize_projection, projection_scale};
use crate::core::error::ConfigError;
use crate::core::fourier::interpolate::{sample_nearest, sample_trilinear};
use crate::core::models::instrument::InstrumentConfig;
use crate::core::models::pose::PoseModel;
use crate::core::potential::voxel::VoxelGridPotential;
use nalgebra::Vector3;
use ndarray::{Array2, Array3};
use rustfft::num_complex::Complex64;
use tracing::{instrument, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationOrder {
    Nearest,
    #[default]
    Trilinear,
}

impl InterpolationOrder {
    pub fn from_order(order: u32) -> Result<Self, ConfigError> {
        match order {
            0 => Ok(InterpolationOrder::Nearest),
            1 => Ok(InterpolationOrder::Trilinear),
            _ => Err(ConfigError::OutOfRange {
                parameter: "interpolation_order",
                value: order as f64,
                min: 0.0,
                max: 1.0,
            }),
        }
    }

    pub fn order(&self) -> u32 {
        match self {
            InterpolationOrder::Nearest => 0,
            InterpolationOrder::Trilinear => 1,
        }
    }

    #[inline]
    pub fn sample(&self, volume: &Array3<Complex64>, position: &Vector3<f64>) -> Complex64 {
        match self {
            InterpolationOrder::Nearest => sample_nearest(volume, position),
            InterpolationOrder::Trilinear => sample_trilinear(volume, position),
        }
    }
}

/// Projects by sampling the central slice of the potential's Fourier volume normal to the
/// viewing direction. Samples that fall outside the stored volume read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FourierSliceExtraction {
    interpolation: InterpolationOrder,
}

impl FourierSliceExtraction {
    pub fn new(interpolation: InterpolationOrder) -> Self {
        Self { interpolation }
    }

    pub fn with_order(order: u32) -> Result<Self, ConfigError> {
        Ok(Self::new(InterpolationOrder::from_order(order)?))
    }

    pub fn interpolation(&self) -> InterpolationOrder {
        self.interpolation
    }
}

impl PotentialIntegrator<VoxelGridPotential> for FourierSliceExtraction {
    #[instrument(skip_all, name = "fourier_slice_extraction")]
    fn integrate(
        &self,
        potential: &VoxelGridPotential,
        pose: &dyn PoseModel,
        instrument: &InstrumentConfig,
    ) -> Result<Array2<Complex64>, ProjectionError> {
        let volume = potential.fourier_grid();
        let grid = instrument.padded_frequency_grid();
        let side_length = potential.side_length();

        // Frequency q maps to index q * n * voxel_size + n / 2 of the centered volume.
        let index_scale = side_length as f64 * potential.voxel_size();
        let center = Vector3::repeat((side_length / 2) as f64);
        let inverse_rotation = pose.rotation().inverse();
        let scale = projection_scale(potential.voxel_size(), instrument.pixel_size());
        trace!(
            side_length,
            order = self.interpolation.order(),
            "Extracting central slice"
        );

        let mut projection = grid.map(|q| {
            let rotated = inverse_rotation * Vector3::new(q.x, q.y, 0.0);
            let position = rotated * index_scale + center;
            self.interpolation.sample(volume, &position) * scale
        });
        finalize_projection(&mut projection, &grid, pose);
        Ok(projection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fourier::fft::{centered_irfft2, centered_rfft2};
    use crate::core::models::pose::{AxisAnglePose, EulerAnglePose};
    use std::f64::consts::PI;

    const TOLERANCE: f64 = 1e-9;

    fn asymmetric_volume(n: usize) -> Array3<f64> {
        let c = (n / 2) as isize;
        let mut volume = Array3::zeros((n, n, n));
        let mut place = |x: isize, y: isize, z: isize, value: f64| {
            volume[[(z + c) as usize, (y + c) as usize, (x + c) as usize]] = value;
        };
        place(0, 0, 0, 1.0);
        place(3, 0, 1, 2.0);
        place(0, -2, -1, 3.0);
        place(-1, 4, 2, 0.5);
        volume
    }

    fn projected_along_z(volume: &Array3<f64>, voxel_size: f64) -> Array2<f64> {
        volume.sum_axis(ndarray::Axis(0)) * voxel_size
    }

    fn max_abs_difference(a: &Array2<f64>, b: &Array2<f64>) -> f64 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).abs())
            .fold(0.0, f64::max)
    }

    #[test]
    fn order_must_be_zero_or_one() {
        assert_eq!(
            FourierSliceExtraction::with_order(0).unwrap().interpolation(),
            InterpolationOrder::Nearest
        );
        assert_eq!(
            FourierSliceExtraction::default().interpolation(),
            InterpolationOrder::Trilinear
        );
        assert!(FourierSliceExtraction::with_order(3).is_err());
    }

    #[test]
    fn identity_slice_matches_direct_projection_without_mirroring() {
        let n = 15;
        let volume = asymmetric_volume(n);
        let potential = VoxelGridPotential::from_real_grid(volume.clone(), 1.0).unwrap();
        let instrument = InstrumentConfig::new((n, n), 1.0, 300.0).unwrap();
        let projection = FourierSliceExtraction::default()
            .integrate(&potential, &EulerAnglePose::identity(), &instrument)
            .unwrap();
        let image = centered_irfft2(&projection, n).unwrap();
        let expected = projected_along_z(&volume, 1.0);
        assert!(max_abs_difference(&image, &expected) < TOLERANCE);
    }

    #[test]
    fn point_mass_projects_to_flat_spectrum_at_any_pose() {
        let n = 9;
        let mut volume = Array3::zeros((n, n, n));
        volume[[n / 2, n / 2, n / 2]] = 1.0;
        let potential = VoxelGridPotential::from_real_grid(volume, 1.0).unwrap();
        let instrument = InstrumentConfig::new((n, n), 1.0, 300.0).unwrap();
        for (phi, theta, psi) in [(0.0, 0.0, 0.0), (30.0, 60.0, 10.0), (-75.0, 135.0, 200.0)] {
            let pose = EulerAnglePose::new(0.0, 0.0, phi, theta, psi).unwrap();
            let projection = FourierSliceExtraction::default()
                .integrate(&potential, &pose, &instrument)
                .unwrap();
            let grid = instrument.frequency_grid();
            // Modes whose rotated neighbours all lie inside the stored volume.
            let supported = |iy: usize, ix: usize| grid.frequency(iy, ix).norm() * n as f64 <= 3.5;
            for ((iy, ix), value) in projection.indexed_iter() {
                if supported(iy, ix) {
                    assert!((value - Complex64::new(1.0, 0.0)).norm() < TOLERANCE);
                }
            }
        }
    }

    #[test]
    fn quarter_turn_about_z_rotates_projection() {
        let n = 15;
        let volume = asymmetric_volume(n);
        let potential = VoxelGridPotential::from_real_grid(volume.clone(), 1.0).unwrap();
        let instrument = InstrumentConfig::new((n, n), 1.0, 300.0).unwrap();
        let pose = AxisAnglePose::new(0.0, 0.0, Vector3::z(), 90.0).unwrap();
        let projection = FourierSliceExtraction::default()
            .integrate(&potential, &pose, &instrument)
            .unwrap();
        let image = centered_irfft2(&projection, n).unwrap();

        // (x, y) -> (-y, x) under a +90 degree turn about z.
        let reference = projected_along_z(&volume, 1.0);
        let c = (n / 2) as isize;
        let expected = Array2::from_shape_fn((n, n), |(iy, ix)| {
            let (x, y) = (ix as isize - c, iy as isize - c);
            let (source_x, source_y) = (y, -x);
            reference[[(source_y + c) as usize, (source_x + c) as usize]]
        });
        assert!(max_abs_difference(&image, &expected) < TOLERANCE);
    }

    #[test]
    fn rotations_about_optical_axis_preserve_projection_of_symmetric_blob() {
        let n = 17;
        let c = (n / 2) as f64;
        let volume = Array3::from_shape_fn((n, n, n), |(z, y, x)| {
            let r2 = (x as f64 - c).powi(2) + (y as f64 - c).powi(2) + (z as f64 - c).powi(2);
            (-0.5 * r2).exp()
        });
        let potential = VoxelGridPotential::from_real_grid(volume, 1.0).unwrap();
        let instrument = InstrumentConfig::new((n, n), 1.0, 300.0).unwrap();
        let project = |pose: EulerAnglePose| {
            let projection = FourierSliceExtraction::default()
                .integrate(&potential, &pose, &instrument)
                .unwrap();
            centered_irfft2(&projection, n).unwrap()
        };
        // Changing phi turns the specimen about the beam axis.
        let a = project(EulerAnglePose::new(0.0, 0.0, 20.0, 50.0, 0.0).unwrap());
        let b = project(EulerAnglePose::new(0.0, 0.0, 93.0, 50.0, 0.0).unwrap());
        let peak = a.iter().cloned().fold(0.0, f64::max);
        assert!(peak > 0.0);
        assert!(max_abs_difference(&a, &b) < 3e-2 * peak);
    }

    #[test]
    fn integer_offset_rolls_the_image() {
        let n = 15;
        let volume = asymmetric_volume(n);
        let potential = VoxelGridPotential::from_real_grid(volume, 1.0).unwrap();
        let instrument = InstrumentConfig::new((n, n), 1.0, 300.0).unwrap();
        let integrator = FourierSliceExtraction::default();
        let still = integrator
            .integrate(&potential, &EulerAnglePose::identity(), &instrument)
            .unwrap();
        let pose = EulerAnglePose::new(2.0, -3.0, 0.0, 0.0, 0.0).unwrap();
        let shifted = integrator.integrate(&potential, &pose, &instrument).unwrap();

        let grid = instrument.frequency_grid();
        for ((iy, ix), value) in shifted.indexed_iter() {
            let q = grid.frequency(iy, ix);
            let ramp = Complex64::from_polar(1.0, -2.0 * PI * (2.0 * q.x - 3.0 * q.y));
            assert!((value - still[[iy, ix]] * ramp).norm() < TOLERANCE);
        }

        let still_image = centered_irfft2(&still, n).unwrap();
        let shifted_image = centered_irfft2(&shifted, n).unwrap();
        let rolled = Array2::from_shape_fn((n, n), |(iy, ix)| {
            still_image[[(iy + n + 3) % n, (ix + n - 2) % n]]
        });
        assert!(max_abs_difference(&shifted_image, &rolled) < TOLERANCE);
        let round_trip = centered_rfft2(&shifted_image);
        assert!((round_trip[[1, 1]] - shifted[[1, 1]]).norm() < TOLERANCE);
    }

    #[test]
    fn pixel_and_voxel_size_scaling_preserves_line_integral() {
        let n = 9;
        let mut volume = Array3::zeros((n, n, n));
        volume[[4, 4, 4]] = 1.0;
        let potential = VoxelGridPotential::from_real_grid(volume, 2.0).unwrap();
        let instrument = InstrumentConfig::new((n, n), 2.0, 300.0).unwrap();
        let projection = FourierSliceExtraction::default()
            .integrate(&potential, &EulerAnglePose::identity(), &instrument)
            .unwrap();
        assert!((projection[[0, 0]] - Complex64::new(2.0, 0.0)).norm() < TOLERANCE);
    }
}
