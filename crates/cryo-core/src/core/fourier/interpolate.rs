use nalgebra::Vector3;
use ndarray::Array3;
use rustfft::num_complex::Complex64;

const ZERO: Complex64 = Complex64::new(0.0, 0.0);

#[inline]
fn value_or_zero(volume: &Array3<Complex64>, iz: isize, iy: isize, ix: isize) -> Complex64 {
    let (nz, ny, nx) = volume.dim();
    let inside = |i: isize, n: usize| i >= 0 && (i as usize) < n;
    if inside(iz, nz) && inside(iy, ny) && inside(ix, nx) {
        volume[[iz as usize, iy as usize, ix as usize]]
    } else {
        ZERO
    }
}

/// Samples the voxel nearest to `position`, given in fractional `(x, y, z)` index
/// coordinates. Positions off the grid read as zero.
pub fn sample_nearest(volume: &Array3<Complex64>, position: &Vector3<f64>) -> Complex64 {
    if !position.iter().all(|c| c.is_finite()) {
        return ZERO;
    }
    value_or_zero(
        volume,
        position.z.round() as isize,
        position.y.round() as isize,
        position.x.round() as isize,
    )
}

/// Trilinear interpolation at fractional `(x, y, z)` index coordinates. Each of the eight
/// neighbours that falls off the grid contributes zero.
pub fn sample_trilinear(volume: &Array3<Complex64>, position: &Vector3<f64>) -> Complex64 {
    if !position.iter().all(|c| c.is_finite()) {
        return ZERO;
    }
    let floor = position.map(f64::floor);
    let frac = position - floor;
    let (x0, y0, z0) = (floor.x as isize, floor.y as isize, floor.z as isize);

    let mut result = ZERO;
    for (dz, wz) in [(0, 1.0 - frac.z), (1, frac.z)] {
        for (dy, wy) in [(0, 1.0 - frac.y), (1, frac.y)] {
            for (dx, wx) in [(0, 1.0 - frac.x), (1, frac.x)] {
                let weight = wz * wy * wx;
                if weight != 0.0 {
                    result += value_or_zero(volume, z0 + dz, y0 + dy, x0 + dx) * weight;
                }
            }
        }
    }
    result
}
