//! Discrete Fourier machinery shared by every imaging stage.
//!
//! Images live on a centered real-space grid (`[y, x]`, origin at index `n / 2`) and on a
//! half-plane Fourier grid of shape `(ny, nx / 2 + 1)` with the zero frequency at `[0, 0]`.
//! Volumes are stored as centered Fourier grids indexed `[z, y, x]` so that trilinear
//! interpolation can run directly on their samples.

pub mod fft;
pub mod grid;
pub mod interpolate;
pub mod operators;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FourierError {
    #[error(
        "Half-plane array has {actual} columns, but a real image of width {width} needs {expected}"
    )]
    HalfPlaneWidth {
        width: usize,
        expected: usize,
        actual: usize,
    },
}
