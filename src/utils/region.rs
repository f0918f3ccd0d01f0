use crate::utils::spectrum::optimal_dft_size;
use crate::Errors;
use anyhow::Result;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Region of interest in frame pixel coordinates.
///
/// The variant is the calling convention: a box given by its top-left corner and size,
/// or a box given by two opposite corners.
///
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Region {
    TopLeft {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    Corners {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
    },
}

impl Region {
    pub fn top_left(x: f32, y: f32, width: f32, height: f32) -> Self {
        Region::TopLeft {
            x,
            y,
            width,
            height,
        }
    }

    pub fn corners(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Region::Corners { x1, y1, x2, y2 }
    }

    /// Corner box of `size` around `center`, coordinates are truncated to whole pixels
    ///
    pub fn from_center(center: Point2<f32>, size: (usize, usize)) -> Self {
        let (hw, hh) = (size.0 as f32 / 2.0, size.1 as f32 / 2.0);
        Region::Corners {
            x1: (center.x - hw).trunc(),
            y1: (center.y - hh).trunc(),
            x2: (center.x + hw).trunc(),
            y2: (center.y + hh).trunc(),
        }
    }

    /// `(x1, y1, x2, y2)` regardless of the convention
    ///
    pub fn corner_pair(&self) -> (f32, f32, f32, f32) {
        match *self {
            Region::TopLeft {
                x,
                y,
                width,
                height,
            } => (x, y, x + width, y + height),
            Region::Corners { x1, y1, x2, y2 } => (x1, y1, x2, y2),
        }
    }

    pub fn width(&self) -> f32 {
        let (x1, _, x2, _) = self.corner_pair();
        x2 - x1
    }

    pub fn height(&self) -> f32 {
        let (_, y1, _, y2) = self.corner_pair();
        y2 - y1
    }

    /// Center and transform-friendly size of the region.
    ///
    /// Each extent is rounded up to the nearest efficient transform size and the rounded box
    /// is re-centered over the original one.
    ///
    pub fn normalize(&self) -> Result<(Point2<f32>, (usize, usize))> {
        let (x1, y1, x2, y2) = self.corner_pair();
        let (width, height) = (x2 - x1, y2 - y1);
        if !(width > 0.0 && height > 0.0) {
            return Err(Errors::InvalidRegion { width, height }.into());
        }

        let w = optimal_dft_size(width.ceil() as usize);
        let h = optimal_dft_size(height.ceil() as usize);
        let left = ((x1 + x2 - w as f32) / 2.0).floor();
        let top = ((y1 + y2 - h as f32) / 2.0).floor();

        Ok((
            Point2::new(left + 0.5 * (w as f32 - 1.0), top + 0.5 * (h as f32 - 1.0)),
            (w, h),
        ))
    }
}
