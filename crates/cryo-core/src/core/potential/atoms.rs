//! Rasterization of atomic models onto voxel grids.
//!
//! Each atom contributes the real-space counterpart of its five-Gaussian scattering factor,
//! `a_i (4 pi / b_i)^{3/2} exp(-4 pi^2 r^2 / b_i)`. Every Gaussian is integrated exactly over
//! each voxel with `erf`, so the voxel values are cell averages and the grid integral of an
//! atom well inside the box is `sum_i a_i`.

use super::PotentialError;
use super::scattering_factors::{ScatteringFactors, scattering_factors};
use super::voxel::VoxelGridPotential;
use crate::core::error::require_positive;
use crate::core::fourier::grid::centered_coordinates;
use nalgebra::Vector3;
use ndarray::Array3;
use scilib::math::basic::erf;
use std::f64::consts::{PI, SQRT_2};
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

// Beyond this many standard deviations a Gaussian's voxel weight is below 1e-15.
const SUPPORT_IN_SIGMAS: f64 = 8.0;
// erf(6) rounds to one in double precision.
const ERF_SATURATION: f64 = 6.0;

/// Non-zero `(index, weight)` pairs of a unit-mass 1-D Gaussian integrated over each cell.
fn axis_weights(centers: &[f64], voxel_size: f64, mean: f64, sigma: f64) -> Vec<(usize, f64)> {
    let scale = 1.0 / (sigma * SQRT_2);
    let reach = SUPPORT_IN_SIGMAS * sigma + voxel_size;
    let standardize = |x: f64| ((x - mean) * scale).clamp(-ERF_SATURATION, ERF_SATURATION);
    centers
        .iter()
        .enumerate()
        .filter(|(_, c)| (**c - mean).abs() <= reach)
        .map(|(i, c)| {
            let lower = standardize(c - 0.5 * voxel_size);
            let upper = standardize(c + 0.5 * voxel_size);
            (i, 0.5 * (erf(upper) - erf(lower)))
        })
        .filter(|(_, w)| *w > 0.0)
        .collect()
}

/// Adds every atom's Gaussians onto a fresh `[z, y, x]` grid of cell-averaged potential.
pub fn rasterize_gaussians(
    positions: &[Vector3<f64>],
    factors: &[ScatteringFactors],
    side_length: usize,
    voxel_size: f64,
) -> Array3<f64> {
    let centers = centered_coordinates(side_length, voxel_size);
    let inverse_volume = voxel_size.powi(-3);
    let mut grid = Array3::zeros((side_length, side_length, side_length));

    for (position, factor) in positions.iter().zip(factors) {
        for (&a, &b) in factor.a.iter().zip(factor.b.iter()) {
            let sigma = (b / (8.0 * PI * PI)).sqrt();
            let wx = axis_weights(&centers, voxel_size, position.x, sigma);
            let wy = axis_weights(&centers, voxel_size, position.y, sigma);
            let wz = axis_weights(&centers, voxel_size, position.z, sigma);
            let amplitude = a * inverse_volume;
            for &(iz, z) in &wz {
                for &(iy, y) in &wy {
                    let zy = amplitude * z * y;
                    for &(ix, x) in &wx {
                        grid[[iz, iy, ix]] += zy * x;
                    }
                }
            }
        }
    }
    grid
}

fn lookup_factors<S: AsRef<str>>(elements: &[S]) -> Result<Vec<ScatteringFactors>, PotentialError> {
    elements
        .iter()
        .map(|element| {
            scattering_factors(element.as_ref())
                .copied()
                .ok_or_else(|| PotentialError::UnknownElement(element.as_ref().to_string()))
        })
        .collect()
}

impl VoxelGridPotential {
    /// Builds a real-space potential from atom positions (Ångströms, `(x, y, z)` about the
    /// grid center) and their element symbols.
    #[instrument(skip_all, name = "voxels_from_atoms", fields(atoms = positions.len()))]
    pub fn from_atoms<S: AsRef<str>>(
        positions: &[Vector3<f64>],
        elements: &[S],
        side_length: usize,
        voxel_size: f64,
    ) -> Result<Self, PotentialError> {
        if positions.len() != elements.len() {
            return Err(PotentialError::AtomCountMismatch {
                positions: positions.len(),
                elements: elements.len(),
            });
        }
        let voxel_size = require_positive("voxel_size", voxel_size)?;
        let factors = lookup_factors(elements)?;
        let grid = rasterize_gaussians(positions, &factors, side_length, voxel_size);
        debug!(side_length, voxel_size, "Rasterized atomic model");
        Self::from_real_grid(grid, voxel_size)
    }

    /// One potential per frame of a trajectory that shares a single element list.
    #[instrument(skip_all, name = "voxels_from_trajectory", fields(frames = frames.len()))]
    pub fn from_trajectory<S: AsRef<str>>(
        frames: &[Vec<Vector3<f64>>],
        elements: &[S],
        side_length: usize,
        voxel_size: f64,
    ) -> Result<Vec<Self>, PotentialError> {
        let voxel_size = require_positive("voxel_size", voxel_size)?;
        if let Some(frame) = frames.iter().find(|frame| frame.len() != elements.len()) {
            return Err(PotentialError::AtomCountMismatch {
                positions: frame.len(),
                elements: elements.len(),
            });
        }
        let factors = lookup_factors(elements)?;
        let build = |frame: &Vec<Vector3<f64>>| {
            let grid = rasterize_gaussians(frame, &factors, side_length, voxel_size);
            Self::from_real_grid(grid, voxel_size)
        };

        #[cfg(feature = "parallel")]
        let potentials = frames.par_iter().map(build).collect();
        #[cfg(not(feature = "parallel"))]
        let potentials = frames.iter().map(build).collect();

        potentials
    }
}
