pub mod config;
pub mod error;
pub mod integrators;
pub mod pipeline;
pub mod progress;
pub mod scattering;
pub mod transfer;
