use crate::Errors;
use anyhow::Result;
use nalgebra::{DMatrix, Matrix2, Matrix2x3, Point2, Vector2};
use std::borrow::Cow;

/// Grayscale image with floating point intensities, indexed as `(y, x)`
pub type GrayImage = DMatrix<f32>;

/// Video frame as supplied by a frame source
///
#[derive(Debug, Clone)]
pub enum Frame {
    Gray(GrayImage),
    /// 3-channel color in the blue, green, red channel order
    Bgr(DMatrix<[u8; 3]>),
}

impl From<GrayImage> for Frame {
    fn from(image: GrayImage) -> Self {
        Frame::Gray(image)
    }
}

impl Frame {
    /// Builds a grayscale frame from a row-major 8-bit buffer
    ///
    pub fn from_gray_u8(width: usize, height: usize, data: &[u8]) -> Result<Self> {
        check_size(width, height)?;
        let expected = width * height;
        if data.len() != expected {
            return Err(Errors::FrameDimensions {
                expected,
                actual: data.len(),
            }
            .into());
        }
        Ok(Frame::Gray(GrayImage::from_row_iterator(
            height,
            width,
            data.iter().map(|&v| v as f32),
        )))
    }

    /// Builds a color frame from a row-major interleaved BGR buffer
    ///
    pub fn from_bgr_u8(width: usize, height: usize, data: &[u8]) -> Result<Self> {
        check_size(width, height)?;
        let expected = width * height * 3;
        if data.len() != expected {
            return Err(Errors::FrameDimensions {
                expected,
                actual: data.len(),
            }
            .into());
        }
        Ok(Frame::Bgr(DMatrix::from_row_iterator(
            height,
            width,
            data.chunks_exact(3).map(|px| [px[0], px[1], px[2]]),
        )))
    }

    pub fn width(&self) -> usize {
        match self {
            Frame::Gray(m) => m.ncols(),
            Frame::Bgr(m) => m.ncols(),
        }
    }

    pub fn height(&self) -> usize {
        match self {
            Frame::Gray(m) => m.nrows(),
            Frame::Bgr(m) => m.nrows(),
        }
    }

    pub fn is_color(&self) -> bool {
        matches!(self, Frame::Bgr(_))
    }

    /// Grayscale view of the frame; color frames are converted with luminance weights
    ///
    pub fn to_gray(&self) -> Cow<'_, GrayImage> {
        match self {
            Frame::Gray(m) => Cow::Borrowed(m),
            Frame::Bgr(m) => Cow::Owned(m.map(|[b, g, r]| luminance(b, g, r))),
        }
    }
}

fn check_size(width: usize, height: usize) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(Errors::EmptyFrame { width, height }.into());
    }
    Ok(())
}

fn luminance(b: u8, g: u8, r: u8) -> f32 {
    0.114 * b as f32 + 0.587 * g as f32 + 0.299 * r as f32
}

/// How samples outside of the image are produced
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorderMode {
    /// `aaaaaa|abcdefgh|hhhhhhh`
    Replicate,
    /// `fedcba|abcdefgh|hgfedcb`
    Reflect,
    /// `gfedcb|abcdefgh|gfedcba`
    Reflect101,
}

pub(crate) fn border_index(i: isize, n: usize, mode: BorderMode) -> usize {
    let n = n as isize;
    let i = match mode {
        BorderMode::Replicate => i.clamp(0, n - 1),
        BorderMode::Reflect101 if n == 1 => 0,
        BorderMode::Reflect101 => {
            let period = 2 * n - 2;
            let k = i.rem_euclid(period);
            if k >= n {
                period - k
            } else {
                k
            }
        }
        BorderMode::Reflect => {
            let period = 2 * n;
            let k = i.rem_euclid(period);
            if k >= n {
                period - 1 - k
            } else {
                k
            }
        }
    };
    i as usize
}

/// Bilinear sample at the sub-pixel location `(x, y)`
///
pub fn sample(image: &GrayImage, x: f32, y: f32, mode: BorderMode) -> f32 {
    let (rows, cols) = image.shape();
    let (xf, yf) = (x.floor(), y.floor());
    let (fx, fy) = (x - xf, y - yf);
    let (xi, yi) = (xf as isize, yf as isize);

    let c0 = border_index(xi, cols, mode);
    let c1 = border_index(xi + 1, cols, mode);
    let r0 = border_index(yi, rows, mode);
    let r1 = border_index(yi + 1, rows, mode);

    let top = image[(r0, c0)] * (1.0 - fx) + image[(r0, c1)] * fx;
    let bottom = image[(r1, c0)] * (1.0 - fx) + image[(r1, c1)] * fx;
    top * (1.0 - fy) + bottom * fy
}

/// Extracts a `width x height` patch centered at the sub-pixel `center`.
///
/// The top-left sample is located at `center - ((width - 1) / 2, (height - 1) / 2)`,
/// pixels outside of the frame repeat the nearest border pixel. An empty image yields a
/// zero patch.
///
pub fn extract_patch(image: &GrayImage, size: (usize, usize), center: Point2<f32>) -> GrayImage {
    let (width, height) = size;
    if image.is_empty() {
        return GrayImage::zeros(height, width);
    }
    let x0 = center.x - (width as f32 - 1.0) * 0.5;
    let y0 = center.y - (height as f32 - 1.0) * 0.5;
    GrayImage::from_fn(height, width, |r, c| {
        sample(image, x0 + c as f32, y0 + r as f32, BorderMode::Replicate)
    })
}

/// Affine warp keeping the image shape.
///
/// `m` maps source coordinates to destination coordinates; every destination pixel reads
/// the source at `m^-1 (x, y)`. A singular transform leaves the image unchanged.
///
pub fn warp_affine(image: &GrayImage, m: &Matrix2x3<f32>, mode: BorderMode) -> GrayImage {
    let a = Matrix2::new(m[(0, 0)], m[(0, 1)], m[(1, 0)], m[(1, 1)]);
    let t = Vector2::new(m[(0, 2)], m[(1, 2)]);
    let Some(inv) = a.try_inverse() else {
        return image.clone();
    };
    let (rows, cols) = image.shape();
    GrayImage::from_fn(rows, cols, |r, c| {
        let src = inv * (Vector2::new(c as f32, r as f32) - t);
        sample(image, src.x, src.y, mode)
    })
}

/// Clamps intensities into `u8`
///
pub fn saturate_u8(image: &GrayImage) -> DMatrix<u8> {
    image.map(|v| v.round().clamp(0.0, 255.0) as u8)
}

#[cfg(test)]
mod tests {
    use crate::utils::image::{
        border_index, extract_patch, sample, warp_affine, BorderMode, Frame, GrayImage,
    };
    use crate::{Errors, EstimateClose};
    use nalgebra::{Matrix2x3, Point2};

    fn ramp(rows: usize, cols: usize) -> GrayImage {
        GrayImage::from_fn(rows, cols, |r, c| (r * cols + c) as f32)
    }

    #[test]
    fn border_indices() {
        assert_eq!(border_index(-1, 5, BorderMode::Replicate), 0);
        assert_eq!(border_index(7, 5, BorderMode::Replicate), 4);
        assert_eq!(border_index(-1, 5, BorderMode::Reflect), 0);
        assert_eq!(border_index(-2, 5, BorderMode::Reflect), 1);
        assert_eq!(border_index(5, 5, BorderMode::Reflect), 4);
        assert_eq!(border_index(6, 5, BorderMode::Reflect), 3);
        assert_eq!(border_index(2, 5, BorderMode::Reflect), 2);
        assert_eq!(border_index(-1, 5, BorderMode::Reflect101), 1);
        assert_eq!(border_index(-2, 5, BorderMode::Reflect101), 2);
        assert_eq!(border_index(5, 5, BorderMode::Reflect101), 3);
        assert_eq!(border_index(9, 5, BorderMode::Reflect101), 1);
        assert_eq!(border_index(3, 1, BorderMode::Reflect101), 0);
    }

    #[test]
    fn gray_from_buffer() {
        let f = Frame::from_gray_u8(3, 2, &[0, 1, 2, 3, 4, 5]).unwrap();
        assert_eq!(f.width(), 3);
        assert_eq!(f.height(), 2);
        let g = f.to_gray();
        assert_eq!(g[(1, 0)], 3.0);
        assert_eq!(g[(0, 2)], 2.0);
    }

    #[test]
    fn bad_buffer_length() {
        let err = Frame::from_bgr_u8(2, 2, &[0; 11]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<Errors>(),
            Some(&Errors::FrameDimensions {
                expected: 12,
                actual: 11
            })
        );
    }

    #[test]
    fn empty_frames() {
        let err = Frame::from_gray_u8(0, 0, &[]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<Errors>(),
            Some(&Errors::EmptyFrame {
                width: 0,
                height: 0
            })
        );
        assert!(Frame::from_bgr_u8(4, 0, &[]).is_err());

        let patch = extract_patch(&GrayImage::zeros(0, 0), (6, 4), Point2::new(10.0, 3.0));
        assert_eq!(patch, GrayImage::zeros(4, 6));
    }

    #[test]
    fn bgr_luminance() {
        let f = Frame::from_bgr_u8(2, 1, &[255, 0, 0, 0, 0, 255]).unwrap();
        assert!(f.is_color());
        let g = f.to_gray();
        assert!(g[(0, 0)].almost_same(&(0.114 * 255.0), 1e-3));
        assert!(g[(0, 1)].almost_same(&(0.299 * 255.0), 1e-3));
    }

    #[test]
    fn bilinear_sampling() {
        let img = ramp(4, 4);
        assert_eq!(sample(&img, 1.0, 2.0, BorderMode::Replicate), 9.0);
        assert!((sample(&img, 1.5, 2.0, BorderMode::Replicate) - 9.5).abs() < 1e-6);
        assert!((sample(&img, 1.0, 2.5, BorderMode::Replicate) - 11.0).abs() < 1e-6);
        assert_eq!(sample(&img, -3.0, 0.0, BorderMode::Replicate), 0.0);
    }

    #[test]
    fn patch_inside_is_a_crop() {
        let img = ramp(10, 10);
        // 4x4 patch, center 4.5 => top-left sample at 3
        let patch = extract_patch(&img, (4, 4), Point2::new(4.5, 4.5));
        assert_eq!(patch.shape(), (4, 4));
        for r in 0..4 {
            for c in 0..4 {
                assert_eq!(patch[(r, c)], img[(r + 3, c + 3)]);
            }
        }
    }

    #[test]
    fn patch_outside_replicates_border() {
        let img = ramp(5, 5);
        let patch = extract_patch(&img, (3, 3), Point2::new(0.0, 0.0));
        assert_eq!(patch[(0, 0)], img[(0, 0)]);
        assert_eq!(patch[(0, 2)], img[(0, 1)]);
        assert_eq!(patch[(2, 2)], img[(1, 1)]);
    }

    #[test]
    fn identity_and_translation_warp() {
        let img = ramp(6, 6);
        let id = Matrix2x3::new(1.0, 0.0, 0.0, 0.0, 1.0, 0.0);
        assert_eq!(warp_affine(&img, &id, BorderMode::Reflect), img);

        let shift = Matrix2x3::new(1.0, 0.0, 1.0, 0.0, 1.0, 0.0);
        let moved = warp_affine(&img, &shift, BorderMode::Reflect);
        assert_eq!(moved[(2, 3)], img[(2, 2)]);
        // x = -1 mirrors to x = 0
        assert_eq!(moved[(2, 0)], img[(2, 0)]);
    }
}
