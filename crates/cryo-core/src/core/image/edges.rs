//! Center-preserving crops and pads.
//!
//! Sample `n / 2` of every axis is the origin, so all routines here keep the source index
//! `n / 2` aligned with the target index `m / 2`.

use super::ImageError;
use ndarray::{Array2, Array3};

#[inline]
fn source_index(target: usize, target_len: usize, source_len: usize) -> Option<usize> {
    let offset = (source_len / 2) as isize - (target_len / 2) as isize;
    let source = target as isize + offset;
    (source >= 0 && (source as usize) < source_len).then_some(source as usize)
}

/// Crops or zero-pads each axis independently so the result has `shape`.
pub fn resize_with_crop_or_pad<T: Clone + Default>(
    image: &Array2<T>,
    shape: (usize, usize),
) -> Array2<T> {
    let (ny, nx) = image.dim();
    Array2::from_shape_fn(shape, |(iy, ix)| {
        match (
            source_index(iy, shape.0, ny),
            source_index(ix, shape.1, nx),
        ) {
            (Some(sy), Some(sx)) => image[[sy, sx]].clone(),
            _ => T::default(),
        }
    })
}

pub fn crop_to_shape<T: Clone + Default>(
    image: &Array2<T>,
    shape: (usize, usize),
) -> Result<Array2<T>, ImageError> {
    let (ny, nx) = image.dim();
    if shape.0 > ny || shape.1 > nx {
        return Err(ImageError::CropLarger {
            actual: vec![ny, nx],
            requested: vec![shape.0, shape.1],
        });
    }
    Ok(resize_with_crop_or_pad(image, shape))
}

pub fn pad_to_shape<T: Clone + Default>(
    image: &Array2<T>,
    shape: (usize, usize),
) -> Result<Array2<T>, ImageError> {
    let (ny, nx) = image.dim();
    if shape.0 < ny || shape.1 < nx {
        return Err(ImageError::PadSmaller {
            actual: vec![ny, nx],
            requested: vec![shape.0, shape.1],
        });
    }
    Ok(resize_with_crop_or_pad(image, shape))
}

pub fn crop_volume_to_shape<T: Clone + Default>(
    volume: &Array3<T>,
    shape: (usize, usize, usize),
) -> Result<Array3<T>, ImageError> {
    let (nz, ny, nx) = volume.dim();
    if shape.0 > nz || shape.1 > ny || shape.2 > nx {
        return Err(ImageError::CropLarger {
            actual: vec![nz, ny, nx],
            requested: vec![shape.0, shape.1, shape.2],
        });
    }
    Ok(resize_volume(volume, shape))
}

pub fn pad_volume_to_shape<T: Clone + Default>(
    volume: &Array3<T>,
    shape: (usize, usize, usize),
) -> Result<Array3<T>, ImageError> {
    let (nz, ny, nx) = volume.dim();
    if shape.0 < nz || shape.1 < ny || shape.2 < nx {
        return Err(ImageError::PadSmaller {
            actual: vec![nz, ny, nx],
            requested: vec![shape.0, shape.1, shape.2],
        });
    }
    Ok(resize_volume(volume, shape))
}

fn resize_volume<T: Clone + Default>(
    volume: &Array3<T>,
    shape: (usize, usize, usize),
) -> Array3<T> {
    let (nz, ny, nx) = volume.dim();
    Array3::from_shape_fn(shape, |(iz, iy, ix)| {
        match (
            source_index(iz, shape.0, nz),
            source_index(iy, shape.1, ny),
            source_index(ix, shape.2, nx),
        ) {
            (Some(sz), Some(sy), Some(sx)) => volume[[sz, sy, sx]].clone(),
            _ => T::default(),
        }
    })
}
