//! Spectral transform engine for SQG Turb Core.

pub mod fft;
pub mod spectral;
