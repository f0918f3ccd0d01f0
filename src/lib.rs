use thiserror::Error;

/// Single-target correlation filter, its tracker capability, the tracker collection and the command layer
pub mod trackers;

/// Spectral transforms, frames, regions
pub mod utils;

/// Commonly used types
pub mod prelude;

/// Synthetic scenes used by tests, benchmarks and the demo
pub mod test_stuff;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Errors {
    #[error("Region must have a positive area, got width={width}, height={height}")]
    InvalidRegion { width: f32, height: f32 },
    #[error("Frame must have a positive size, got {width}x{height}")]
    EmptyFrame { width: usize, height: usize },
    #[error("Frame buffer holds {actual} values while {expected} are required")]
    FrameDimensions { expected: usize, actual: usize },
    #[error("Not a tracker archive: magic bytes mismatch")]
    ArchiveMagic,
    #[error("Unsupported tracker archive version {0}")]
    ArchiveVersion(u32),
    #[error("Tracker archive cannot be decoded: {0}")]
    ArchiveDecode(String),
    #[error("Tracker archive cannot be encoded: {0}")]
    ArchiveEncode(String),
    #[error("Tracker state is inconsistent: {0}")]
    InconsistentTracker(String),
    #[error("No frame is available yet")]
    MissingFrame,
}

pub(crate) const EPS: f32 = 0.00001;

pub trait EstimateClose {
    fn almost_same(&self, other: &Self, eps: f32) -> bool;
}

impl EstimateClose for f32 {
    fn almost_same(&self, other: &Self, eps: f32) -> bool {
        (self - other).abs() < eps
    }
}
