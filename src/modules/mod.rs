//! Neural network building blocks that carry an omega rescalar.

pub mod encoder;
pub mod omega_residual;
