pub mod ensemble;
pub mod instrument;
pub mod pose;
