use super::FourierError;
use ndarray::{Array, Array2, Array3, Axis, Dimension, s};
use rustfft::FftPlanner;
use rustfft::num_complex::Complex64;

fn transform_axis<D: Dimension>(
    array: &mut Array<Complex64, D>,
    axis: Axis,
    inverse: bool,
    planner: &mut FftPlanner<f64>,
) {
    let len = array.len_of(axis);
    if len <= 1 {
        return;
    }
    let fft = if inverse {
        planner.plan_fft_inverse(len)
    } else {
        planner.plan_fft_forward(len)
    };

    let mut buffer = vec![Complex64::new(0.0, 0.0); len];
    for mut lane in array.lanes_mut(axis) {
        buffer
            .iter_mut()
            .zip(lane.iter())
            .for_each(|(slot, value)| *slot = *value);
        fft.process(&mut buffer);
        lane.iter_mut()
            .zip(buffer.iter())
            .for_each(|(value, slot)| *value = *slot);
    }
}

// Inverse transforms carry the 1/N factor so that `ifft(fft(x)) == x`.
fn transform_all_axes<D: Dimension>(
    mut array: Array<Complex64, D>,
    inverse: bool,
) -> Array<Complex64, D> {
    let mut planner = FftPlanner::new();
    for axis in 0..array.ndim() {
        transform_axis(&mut array, Axis(axis), inverse, &mut planner);
    }
    if inverse && !array.is_empty() {
        let scale = 1.0 / array.len() as f64;
        array.mapv_inplace(|value| value * scale);
    }
    array
}

pub fn fft2(image: &Array2<Complex64>) -> Array2<Complex64> {
    transform_all_axes(image.to_owned(), false)
}

pub fn ifft2(spectrum: &Array2<Complex64>) -> Array2<Complex64> {
    transform_all_axes(spectrum.to_owned(), true)
}

pub fn fftn3(volume: &Array3<Complex64>) -> Array3<Complex64> {
    transform_all_axes(volume.to_owned(), false)
}

pub fn ifftn3(spectrum: &Array3<Complex64>) -> Array3<Complex64> {
    transform_all_axes(spectrum.to_owned(), true)
}

/// Forward transform of a real image, keeping only the non-negative `x` frequencies.
pub fn rfft2(image: &Array2<f64>) -> Array2<Complex64> {
    let width = image.ncols();
    let full = transform_all_axes(image.mapv(|value| Complex64::new(value, 0.0)), false);
    full.slice(s![.., ..width / 2 + 1]).to_owned()
}

/// Inverse of [`rfft2`]. The discarded half of the spectrum is rebuilt from Hermitian
/// symmetry, so inconsistent self-conjugate entries are projected onto the real image
/// they most closely describe.
pub fn irfft2(half: &Array2<Complex64>, width: usize) -> Result<Array2<f64>, FourierError> {
    let (height, half_width) = half.dim();
    let expected = width / 2 + 1;
    if half_width != expected {
        return Err(FourierError::HalfPlaneWidth {
            width,
            expected,
            actual: half_width,
        });
    }

    let full = Array2::from_shape_fn((height, width), |(iy, ix)| {
        if ix < half_width {
            half[[iy, ix]]
        } else {
            half[[(height - iy) % height, width - ix]].conj()
        }
    });
    Ok(transform_all_axes(full, true).mapv(|value| value.re))
}

/// `rfft2(ifftshift(image))`: the half-plane spectrum of a centered real image.
pub fn centered_rfft2(image: &Array2<f64>) -> Array2<Complex64> {
    rfft2(&ifftshift2(image))
}

/// `fftshift(irfft2(half))`: the centered real image of a half-plane spectrum.
pub fn centered_irfft2(
    half: &Array2<Complex64>,
    width: usize,
) -> Result<Array2<f64>, FourierError> {
    Ok(fftshift2(&irfft2(half, width)?))
}

/// `fftshift(fftn(ifftshift(volume)))`: the centered spectrum of a centered real volume.
pub fn centered_fftn3(volume: &Array3<f64>) -> Array3<Complex64> {
    let complex = ifftshift3(volume).mapv(|value| Complex64::new(value, 0.0));
    fftshift3(&fftn3(&complex))
}

fn roll2<T: Clone>(array: &Array2<T>, shift: (usize, usize)) -> Array2<T> {
    let (ny, nx) = array.dim();
    Array2::from_shape_fn((ny, nx), |(iy, ix)| {
        array[[(iy + ny - shift.0) % ny, (ix + nx - shift.1) % nx]].clone()
    })
}

fn roll3<T: Clone>(array: &Array3<T>, shift: (usize, usize, usize)) -> Array3<T> {
    let (nz, ny, nx) = array.dim();
    Array3::from_shape_fn((nz, ny, nx), |(iz, iy, ix)| {
        array[[
            (iz + nz - shift.0) % nz,
            (iy + ny - shift.1) % ny,
            (ix + nx - shift.2) % nx,
        ]]
        .clone()
    })
}

/// Moves the zero frequency from index 0 to index `n / 2` along each axis.
pub fn fftshift2<T: Clone>(array: &Array2<T>) -> Array2<T> {
    let (ny, nx) = array.dim();
    roll2(array, (ny / 2, nx / 2))
}

pub fn ifftshift2<T: Clone>(array: &Array2<T>) -> Array2<T> {
    let (ny, nx) = array.dim();
    roll2(array, (ny - ny / 2, nx - nx / 2))
}

pub fn fftshift3<T: Clone>(array: &Array3<T>) -> Array3<T> {
    let (nz, ny, nx) = array.dim();
    roll3(array, (nz / 2, ny / 2, nx / 2))
}

pub fn ifftshift3<T: Clone>(array: &Array3<T>) -> Array3<T> {
    let (nz, ny, nx) = array.dim();
    roll3(array, (nz - nz / 2, ny - ny / 2, nx - nx / 2))
}
