//! # cryosim
//!
//! Forward simulation of cryo-EM images: scattering potentials are projected under a pose,
//! filtered by the microscope's contrast transfer function, and rendered on a detector grid,
//! with a Gaussian observation model for sampling noisy images and scoring observed ones.
//!
//! ## Architecture
//!
//! The library is split into three layers.
//!
//! - **[`core`]: The Foundation.** Stateless building blocks: FFT and frequency-grid
//!   conventions, image utilities (padding, masks, normalization), poses and instrument
//!   geometry, the contrast transfer function, and voxel potentials rasterized from atoms.
//!
//! - **[`engine`]: Image Formation.** Projection integrators (Fourier-slice extraction and an
//!   exact non-uniform DFT), transfer theories, the linear scattering theory that composes
//!   them over a structural ensemble, and the imaging pipeline that renders the result. It
//!   also owns the error types and the TOML settings layer.
//!
//! - **[`inference`]: The Observation Model.** Noise distributions over retained Fourier
//!   modes, with seeded sampling and log-likelihood evaluation, and particle stacks that pair
//!   images with the distributions that generated them.
//!
//! ## Conventions
//!
//! Real-space images are indexed `[y, x]` and volumes `[z, y, x]`, with the origin at index
//! `n / 2` along every axis. Fourier images are unshifted half-plane spectra of shape
//! `(ny, nx / 2 + 1)`, and frequencies are in cycles per Ångström.

pub mod core;
pub mod engine;
pub mod inference;
