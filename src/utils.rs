/// 2D Fourier transforms and elementwise spectrum arithmetic
pub mod spectrum;

/// Frames, grayscale conversion, sub-pixel extraction and affine warping
pub mod image;

/// Regions of interest in both calling conventions
pub mod region;
