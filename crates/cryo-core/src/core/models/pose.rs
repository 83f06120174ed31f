//! Rigid-body poses of a particle relative to the detector.
//!
//! A pose is an in-plane offset `(x, y)` in Ångströms plus a rotation `R` that carries the
//! molecular frame into the lab frame: the atom at `r` is imaged at `R r`. The beam runs
//! along `z`, so projections integrate the rotated density over `z`.

use crate::core::error::{ConfigError, require_finite};
use crate::core::fourier::grid::FrequencyGrid;
use nalgebra::{Quaternion, Rotation3, Unit, UnitQuaternion, Vector2, Vector3};
use ndarray::Array2;
use rustfft::num_complex::Complex64;
use std::f64::consts::PI;

const GIMBAL_LOCK_EPSILON: f64 = 1e-10;

pub trait PoseModel: Send + Sync {
    /// The rotation applied to the molecule before projection.
    fn rotation(&self) -> Rotation3<f64>;

    /// In-plane translation `(x, y)` in Ångströms.
    fn offset(&self) -> Vector2<f64>;

    fn to_quaternion(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_rotation_matrix(&self.rotation())
    }

    /// Fourier phase ramp `exp(-2 pi i q . offset)` that translates an image by the offset.
    fn phase_shifts(&self, grid: &FrequencyGrid) -> Array2<Complex64> {
        let offset = self.offset();
        grid.map(|q| Complex64::from_polar(1.0, -2.0 * PI * q.dot(&offset)))
    }
}

fn require_finite_offset(offset_x: f64, offset_y: f64) -> Result<Vector2<f64>, ConfigError> {
    Ok(Vector2::new(
        require_finite("offset_x_in_angstroms", offset_x)?,
        require_finite("offset_y_in_angstroms", offset_y)?,
    ))
}

/// Intrinsic ZYZ Euler angles in degrees: `R = Rz(phi) Ry(theta) Rz(psi)`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EulerAnglePose {
    offset: Vector2<f64>,
    view_phi: f64,
    view_theta: f64,
    view_psi: f64,
}

impl EulerAnglePose {
    pub fn new(
        offset_x_in_angstroms: f64,
        offset_y_in_angstroms: f64,
        view_phi: f64,
        view_theta: f64,
        view_psi: f64,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            offset: require_finite_offset(offset_x_in_angstroms, offset_y_in_angstroms)?,
            view_phi: require_finite("view_phi", view_phi)?,
            view_theta: require_finite("view_theta", view_theta)?,
            view_psi: require_finite("view_psi", view_psi)?,
        })
    }

    pub fn identity() -> Self {
        Self::default()
    }

    pub fn angles(&self) -> (f64, f64, f64) {
        (self.view_phi, self.view_theta, self.view_psi)
    }

    /// Recovers ZYZ angles from a rotation matrix. At `theta = 0` or `180` degrees only
    /// `phi +/- psi` is determined, and `psi` is set to zero.
    pub fn from_rotation(rotation: &Rotation3<f64>, offset: Vector2<f64>) -> Self {
        let m = rotation.matrix();
        let theta = m[(2, 2)].clamp(-1.0, 1.0).acos();
        let (phi, psi) = if theta.sin() > GIMBAL_LOCK_EPSILON {
            (m[(1, 2)].atan2(m[(0, 2)]), m[(2, 1)].atan2(-m[(2, 0)]))
        } else {
            // The upper-left block is Rz(phi + psi) at theta = 0 and Rz(phi - psi) mirrored
            // at theta = 180; both read back the same way once psi is pinned to zero.
            ((-m[(0, 1)]).atan2(m[(1, 1)]), 0.0)
        };
        Self {
            offset,
            view_phi: phi.to_degrees(),
            view_theta: theta.to_degrees(),
            view_psi: psi.to_degrees(),
        }
    }
}

impl PoseModel for EulerAnglePose {
    fn rotation(&self) -> Rotation3<f64> {
        let z = Vector3::z_axis();
        Rotation3::from_axis_angle(&z, self.view_phi.to_radians())
            * Rotation3::from_axis_angle(&Vector3::y_axis(), self.view_theta.to_radians())
            * Rotation3::from_axis_angle(&z, self.view_psi.to_radians())
    }

    fn offset(&self) -> Vector2<f64> {
        self.offset
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuaternionPose {
    offset: Vector2<f64>,
    quaternion: UnitQuaternion<f64>,
}

impl QuaternionPose {
    /// Builds a pose from an unnormalized `(w, x, y, z)` quaternion.
    pub fn new(
        offset_x_in_angstroms: f64,
        offset_y_in_angstroms: f64,
        wxyz: [f64; 4],
    ) -> Result<Self, ConfigError> {
        let offset = require_finite_offset(offset_x_in_angstroms, offset_y_in_angstroms)?;
        let [w, x, y, z] = wxyz;
        let quaternion = Quaternion::new(w, x, y, z);
        let norm = quaternion.norm();
        if !norm.is_finite() || norm < f64::EPSILON {
            return Err(ConfigError::Invalid {
                parameter: "wxyz",
                reason: format!("quaternion {wxyz:?} cannot be normalized"),
            });
        }
        Ok(Self {
            offset,
            quaternion: UnitQuaternion::from_quaternion(quaternion),
        })
    }

    pub fn from_unit_quaternion(offset: Vector2<f64>, quaternion: UnitQuaternion<f64>) -> Self {
        Self { offset, quaternion }
    }

    pub fn quaternion(&self) -> &UnitQuaternion<f64> {
        &self.quaternion
    }
}

impl PoseModel for QuaternionPose {
    fn rotation(&self) -> Rotation3<f64> {
        self.quaternion.to_rotation_matrix()
    }

    fn offset(&self) -> Vector2<f64> {
        self.offset
    }

    fn to_quaternion(&self) -> UnitQuaternion<f64> {
        self.quaternion
    }
}

/// Rotation by `angle` degrees about `axis`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisAnglePose {
    offset: Vector2<f64>,
    axis: Unit<Vector3<f64>>,
    angle: f64,
}

impl AxisAnglePose {
    pub fn new(
        offset_x_in_angstroms: f64,
        offset_y_in_angstroms: f64,
        axis: Vector3<f64>,
        angle: f64,
    ) -> Result<Self, ConfigError> {
        let offset = require_finite_offset(offset_x_in_angstroms, offset_y_in_angstroms)?;
        let angle = require_finite("angle", angle)?;
        let axis = match Unit::try_new(axis, f64::EPSILON) {
            Some(axis) if axis.iter().all(|c| c.is_finite()) => axis,
            // Any axis describes the identity.
            _ if angle == 0.0 => Vector3::z_axis(),
            _ => {
                return Err(ConfigError::Invalid {
                    parameter: "axis",
                    reason: format!(
                        "rotation axis ({}, {}, {}) has no direction",
                        axis.x, axis.y, axis.z
                    ),
                });
            }
        };
        Ok(Self {
            offset,
            axis,
            angle,
        })
    }

    pub fn axis(&self) -> &Unit<Vector3<f64>> {
        &self.axis
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }
}

impl PoseModel for AxisAnglePose {
    fn rotation(&self) -> Rotation3<f64> {
        Rotation3::from_axis_angle(&self.axis, self.angle.to_radians())
    }

    fn offset(&self) -> Vector2<f64> {
        self.offset
    }
}

/// Any of the supported pose parameterizations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pose {
    EulerAngle(EulerAnglePose),
    Quaternion(QuaternionPose),
    AxisAngle(AxisAnglePose),
}

impl Default for Pose {
    fn default() -> Self {
        Pose::EulerAngle(EulerAnglePose::identity())
    }
}

impl Pose {
    pub fn to_euler_angles(&self) -> EulerAnglePose {
        match self {
            Pose::EulerAngle(pose) => *pose,
            other => EulerAnglePose::from_rotation(&other.rotation(), other.offset()),
        }
    }

    pub fn to_quaternion_pose(&self) -> QuaternionPose {
        QuaternionPose::from_unit_quaternion(self.offset(), self.to_quaternion())
    }
}

impl PoseModel for Pose {
    fn rotation(&self) -> Rotation3<f64> {
        match self {
            Pose::EulerAngle(pose) => pose.rotation(),
            Pose::Quaternion(pose) => pose.rotation(),
            Pose::AxisAngle(pose) => pose.rotation(),
        }
    }

    fn offset(&self) -> Vector2<f64> {
        match self {
            Pose::EulerAngle(pose) => pose.offset(),
            Pose::Quaternion(pose) => pose.offset(),
            Pose::AxisAngle(pose) => pose.offset(),
        }
    }
}

impl From<EulerAnglePose> for Pose {
    fn from(pose: EulerAnglePose) -> Self {
        Pose::EulerAngle(pose)
    }
}

impl From<QuaternionPose> for Pose {
    fn from(pose: QuaternionPose) -> Self {
        Pose::Quaternion(pose)
    }
}

impl From<AxisAnglePose> for Pose {
    fn from(pose: AxisAnglePose) -> Self {
        Pose::AxisAngle(pose)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn rotations_close(a: &Rotation3<f64>, b: &Rotation3<f64>) -> bool {
        (a.matrix() - b.matrix()).norm() < TOLERANCE
    }

    #[test]
    fn identity_pose_has_identity_rotation_and_unit_phases() {
        let pose = EulerAnglePose::identity();
        assert!(rotations_close(&pose.rotation(), &Rotation3::identity()));
        let grid = FrequencyGrid::new((4, 4), 1.0);
        assert!(
            pose.phase_shifts(&grid)
                .iter()
                .all(|p| (p - Complex64::new(1.0, 0.0)).norm() < TOLERANCE)
        );
    }

    #[test]
    fn euler_rotation_composes_zyz() {
        let pose = EulerAnglePose::new(0.0, 0.0, 90.0, 0.0, 0.0).unwrap();
        let rotated = pose.rotation() * Vector3::x();
        assert!((rotated - Vector3::y()).norm() < TOLERANCE);

        let tilt = EulerAnglePose::new(0.0, 0.0, 0.0, 90.0, 0.0).unwrap();
        let rotated = tilt.rotation() * Vector3::z();
        assert!((rotated - Vector3::x()).norm() < TOLERANCE);
    }

    #[test]
    fn euler_angles_round_trip_through_rotation_matrix() {
        for (phi, theta, psi) in [(10.0, 20.0, 30.0), (-120.0, 75.0, 160.0), (45.0, 170.0, -60.0)] {
            let pose = EulerAnglePose::new(1.0, 2.0, phi, theta, psi).unwrap();
            let recovered = EulerAnglePose::from_rotation(&pose.rotation(), pose.offset());
            let (rphi, rtheta, rpsi) = recovered.angles();
            assert!((rphi - phi).abs() < 1e-7);
            assert!((rtheta - theta).abs() < 1e-7);
            assert!((rpsi - psi).abs() < 1e-7);
        }
    }

    #[test]
    fn gimbal_lock_conversion_preserves_rotation() {
        for theta in [0.0, 180.0] {
            let pose = EulerAnglePose::new(0.0, 0.0, 25.0, theta, 40.0).unwrap();
            let recovered = EulerAnglePose::from_rotation(&pose.rotation(), Vector2::zeros());
            assert_eq!(recovered.angles().2, 0.0);
            assert!(rotations_close(&recovered.rotation(), &pose.rotation()));
        }
    }

    #[test]
    fn quaternion_pose_normalizes_and_matches_axis_angle() {
        let half = 45f64.to_radians();
        let wxyz = [2.0 * half.cos(), 0.0, 0.0, 2.0 * half.sin()];
        let quaternion = QuaternionPose::new(0.0, 0.0, wxyz).unwrap();
        let axis_angle = AxisAnglePose::new(0.0, 0.0, Vector3::z(), 90.0).unwrap();
        assert!(rotations_close(&quaternion.rotation(), &axis_angle.rotation()));
        let euler = Pose::from(quaternion).to_euler_angles();
        assert!(rotations_close(&euler.rotation(), &axis_angle.rotation()));
    }

    #[test]
    fn degenerate_quaternion_and_axis_are_rejected() {
        assert!(QuaternionPose::new(0.0, 0.0, [0.0; 4]).is_err());
        assert!(AxisAnglePose::new(0.0, 0.0, Vector3::zeros(), 30.0).is_err());
        assert!(AxisAnglePose::new(0.0, 0.0, Vector3::zeros(), 0.0).is_ok());
        assert!(EulerAnglePose::new(f64::NAN, 0.0, 0.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn phase_shifts_encode_offset() {
        let pose = EulerAnglePose::new(2.0, -1.0, 0.0, 0.0, 0.0).unwrap();
        let grid = FrequencyGrid::new((8, 8), 1.0);
        let shifts = pose.phase_shifts(&grid);
        let q = grid.frequency(1, 1);
        let expected = Complex64::from_polar(1.0, -2.0 * PI * (q.x * 2.0 - q.y));
        assert!((shifts[[1, 1]] - expected).norm() < TOLERANCE);
    }

    #[test]
    fn pose_enum_delegates_to_variant() {
        let inner = EulerAnglePose::new(3.0, 4.0, 10.0, 20.0, 30.0).unwrap();
        let pose = Pose::from(inner);
        assert_eq!(pose.offset(), Vector2::new(3.0, 4.0));
        assert!(rotations_close(&pose.rotation(), &inner.rotation()));
        let quaternion = pose.to_quaternion_pose();
        assert!(rotations_close(&quaternion.rotation(), &inner.rotation()));
    }
}
