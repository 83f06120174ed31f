pub mod error;
pub mod fourier;
pub mod image;
pub mod models;
pub mod optics;
pub mod potential;
