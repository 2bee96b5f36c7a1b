//! Spectral diagnostics for SQG trajectories.

pub mod kespec;
