use crate::utils::image::Frame;
use crate::utils::region::Region;
use anyhow::Result;
use nalgebra::Point2;

/// What the point of a [`Detection`] means
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionKind {
    /// Offset of the correlation peak from the patch center; nothing was committed
    Displacement,
    /// The committed target position in frame coordinates
    Position,
}

/// Result of a tracker update
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub point: Point2<f32>,
    pub psr: f32,
    pub kind: DetectionKind,
}

impl Detection {
    pub fn new(point: Point2<f32>, psr: f32, kind: DetectionKind) -> Self {
        Self { point, psr, kind }
    }

    /// The `(0, 0, 0)` result reported when there is nothing to detect with
    ///
    pub fn none() -> Self {
        Self::new(Point2::origin(), 0.0, DetectionKind::Displacement)
    }

    pub fn x(&self) -> f32 {
        self.point.x
    }

    pub fn y(&self) -> f32 {
        self.point.y
    }
}

/// Capability shared by single-target trackers managed by a
/// [`TrackerCollection`](crate::trackers::collection::TrackerCollection)
///
pub trait RegionTracker: Sized {
    type Options: Clone + Default;

    /// Creates and trains a tracker for `region` of `frame`
    ///
    fn initialize(frame: &Frame, region: &Region, opts: &Self::Options) -> Result<Self>;

    /// Locates the target in `frame`.
    ///
    /// Implementations adapt to the new appearance with the given `rate`; rates that are too
    /// low to adapt turn the call into a probe that leaves the tracker untouched.
    ///
    fn update(&mut self, frame: &Frame, rate: f32) -> Detection;

    /// The confidence computed by the most recent update
    fn confidence(&self) -> f32;

    fn is_good(&self) -> bool;

    fn position(&self) -> Point2<f32>;

    /// `(width, height)`
    fn size(&self) -> (usize, usize);

    /// Checks the internal consistency of a tracker restored from outside, e.g. from an archive
    ///
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}
