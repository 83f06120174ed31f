use nalgebra::{Vector2, Vector3};
use ndarray::{Array2, Array3};

/// Sample frequencies of a length-`n` DFT with sample spacing `spacing`, in the standard
/// order `0, 1, ..., -2, -1` scaled by `1 / (n * spacing)`.
pub fn fftfreq(n: usize, spacing: f64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let scale = 1.0 / (n as f64 * spacing);
    (0..n)
        .map(|i| {
            let k = if i <= (n - 1) / 2 {
                i as f64
            } else {
                i as f64 - n as f64
            };
            k * scale
        })
        .collect()
}

pub fn rfftfreq(n: usize, spacing: f64) -> Vec<f64> {
    if n == 0 {
        return Vec::new();
    }
    let scale = 1.0 / (n as f64 * spacing);
    (0..=n / 2).map(|i| i as f64 * scale).collect()
}

/// Physical coordinates of a centered axis: sample `i` sits at `(i - n / 2) * spacing`.
pub fn centered_coordinates(n: usize, spacing: f64) -> Vec<f64> {
    let center = (n / 2) as f64;
    (0..n).map(|i| (i as f64 - center) * spacing).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
    /// An independent complex-valued coefficient.
    Complex,
    /// A self-conjugate coefficient, necessarily real for a real image.
    Real,
    /// The conjugate of another coefficient stored in the same half-plane.
    Redundant,
}

/// Classifies coefficient `[iy, ix]` of the half-plane spectrum of an `(ny, nx)` image.
///
/// Only the column `ix = 0` (and `ix = nx / 2` for even `nx`) is closed under conjugation;
/// within those columns row `iy` pairs with row `(ny - iy) % ny`.
pub fn mode_kind(full_shape: (usize, usize), iy: usize, ix: usize) -> ModeKind {
    let (ny, nx) = full_shape;
    let on_edge_column = ix == 0 || (nx % 2 == 0 && ix == nx / 2);
    if !on_edge_column {
        return ModeKind::Complex;
    }
    let self_conjugate_row = iy == 0 || (ny % 2 == 0 && iy == ny / 2);
    if self_conjugate_row {
        ModeKind::Real
    } else if iy > ny / 2 {
        ModeKind::Redundant
    } else {
        ModeKind::Complex
    }
}

/// The half-plane frequency grid of an image with a given real-space shape and pixel size.
///
/// Frequencies are in cycles per Ångström; `frequency(iy, ix)` returns `(qx, qy)`.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyGrid {
    full_shape: (usize, usize),
    pixel_size: f64,
    qy: Vec<f64>,
    qx: Vec<f64>,
}

impl FrequencyGrid {
    pub fn new(full_shape: (usize, usize), pixel_size: f64) -> Self {
        Self {
            full_shape,
            pixel_size,
            qy: fftfreq(full_shape.0, pixel_size),
            qx: rfftfreq(full_shape.1, pixel_size),
        }
    }

    pub fn full_shape(&self) -> (usize, usize) {
        self.full_shape
    }

    /// Shape of the stored half-plane array.
    pub fn shape(&self) -> (usize, usize) {
        (self.qy.len(), self.qx.len())
    }

    pub fn pixel_size(&self) -> f64 {
        self.pixel_size
    }

    pub fn qx(&self) -> &[f64] {
        &self.qx
    }

    pub fn qy(&self) -> &[f64] {
        &self.qy
    }

    pub fn frequency(&self, iy: usize, ix: usize) -> Vector2<f64> {
        Vector2::new(self.qx[ix], self.qy[iy])
    }

    pub fn map<T, F>(&self, f: F) -> Array2<T>
    where
        F: Fn(Vector2<f64>) -> T,
    {
        Array2::from_shape_fn(self.shape(), |(iy, ix)| f(self.frequency(iy, ix)))
    }

    pub fn magnitude_squared(&self) -> Array2<f64> {
        self.map(|q| q.norm_squared())
    }

    /// Polar angle `atan2(qy, qx)` of every mode, in radians.
    pub fn azimuth(&self) -> Array2<f64> {
        self.map(|q| q.y.atan2(q.x))
    }

    pub fn mode_kind(&self, iy: usize, ix: usize) -> ModeKind {
        mode_kind(self.full_shape, iy, ix)
    }

    /// Index of the coefficient whose conjugate `[iy, ix]` duplicates. Only meaningful for
    /// [`ModeKind::Redundant`] entries.
    pub fn conjugate_partner(&self, iy: usize, ix: usize) -> (usize, usize) {
        let ny = self.full_shape.0;
        ((ny - iy) % ny, ix)
    }

    /// Number of independent real degrees of freedom in the half-plane, which equals the
    /// number of real-space pixels.
    pub fn degrees_of_freedom(&self) -> usize {
        let (ny, nxh) = self.shape();
        (0..ny)
            .flat_map(|iy| (0..nxh).map(move |ix| (iy, ix)))
            .map(|(iy, ix)| match self.mode_kind(iy, ix) {
                ModeKind::Complex => 2,
                ModeKind::Real => 1,
                ModeKind::Redundant => 0,
            })
            .sum()
    }
}

/// Centered real-space coordinates of an image, in Ångströms, as `(x, y)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CoordinateGrid {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl CoordinateGrid {
    pub fn new(shape: (usize, usize), pixel_size: f64) -> Self {
        Self {
            y: centered_coordinates(shape.0, pixel_size),
            x: centered_coordinates(shape.1, pixel_size),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.y.len(), self.x.len())
    }

    pub fn coordinate(&self, iy: usize, ix: usize) -> Vector2<f64> {
        Vector2::new(self.x[ix], self.y[iy])
    }

    pub fn map<T, F>(&self, f: F) -> Array2<T>
    where
        F: Fn(Vector2<f64>) -> T,
    {
        Array2::from_shape_fn(self.shape(), |(iy, ix)| f(self.coordinate(iy, ix)))
    }
}

/// Centered coordinates of every voxel of a cubic grid, as `(x, y, z)` indexed `[z, y, x]`.
pub fn voxel_coordinates(side_length: usize, voxel_size: f64) -> Array3<Vector3<f64>> {
    let axis = centered_coordinates(side_length, voxel_size);
    Array3::from_shape_fn((side_length, side_length, side_length), |(iz, iy, ix)| {
        Vector3::new(axis[ix], axis[iy], axis[iz])
    })
}
