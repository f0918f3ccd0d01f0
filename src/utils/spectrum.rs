use crate::utils::image::GrayImage;
use nalgebra::DMatrix;
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::fmt;
use std::sync::Arc;

/// Complex spectrum of a 2D image, rows are image lines
pub type Spectrum = DMatrix<Complex<f32>>;

/// The smallest size that is not less than `n` and which factors into 2, 3 and 5 only.
///
/// Transforms of such sizes run with the mixed-radix algorithms and avoid the slow
/// Bluestein path. `0` is returned for `0`.
///
pub fn optimal_dft_size(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    (n..).find(|&m| is_regular(m)).unwrap_or(n)
}

fn is_regular(mut m: usize) -> bool {
    for p in [2, 3, 5] {
        while m % p == 0 {
            m /= p;
        }
    }
    m == 1
}

/// Planned forward and inverse 2D transforms for a fixed shape
///
#[derive(Clone)]
pub struct Fft2d {
    rows: usize,
    cols: usize,
    forward_height: Arc<dyn Fft<f32>>,
    forward_width: Arc<dyn Fft<f32>>,
    inverse_height: Arc<dyn Fft<f32>>,
    inverse_width: Arc<dyn Fft<f32>>,
}

impl fmt::Debug for Fft2d {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fft2d")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .finish()
    }
}

impl Fft2d {
    /// Plans transforms for `rows x cols` images
    ///
    pub fn new(rows: usize, cols: usize) -> Self {
        assert!(rows > 0 && cols > 0, "Transform shape must not be empty");
        let mut planner = FftPlanner::new();
        Self {
            rows,
            cols,
            forward_height: planner.plan_fft_forward(rows),
            forward_width: planner.plan_fft_forward(cols),
            inverse_height: planner.plan_fft_inverse(rows),
            inverse_width: planner.plan_fft_inverse(cols),
        }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Full complex spectrum of a real image
    ///
    pub fn forward(&self, image: &GrayImage) -> Spectrum {
        assert_eq!(
            image.shape(),
            (self.rows, self.cols),
            "Image shape does not match the planned transform"
        );
        let mut data = image.map(|v| Complex::new(v, 0.0));
        Self::transform(&mut data, &self.forward_height, &self.forward_width);
        data
    }

    /// Scaled inverse transform, the imaginary part is dropped
    ///
    pub fn inverse_real(&self, spectrum: &Spectrum) -> GrayImage {
        assert_eq!(
            spectrum.shape(),
            (self.rows, self.cols),
            "Spectrum shape does not match the planned transform"
        );
        let mut data = spectrum.clone();
        Self::transform(&mut data, &self.inverse_height, &self.inverse_width);
        let scale = 1.0 / (self.rows * self.cols) as f32;
        data.map(|c| c.re * scale)
    }

    fn transform(data: &mut Spectrum, height: &Arc<dyn Fft<f32>>, width: &Arc<dyn Fft<f32>>) {
        // storage is column-major, so every chunk of `rows` values is one column
        height.process(data.as_mut_slice());
        let mut transposed = data.transpose();
        width.process(transposed.as_mut_slice());
        *data = transposed.transpose();
    }
}

/// Elementwise product `a * b`, or `a * conj(b)` when `conj_b` is set
///
pub fn mul_spectrums(a: &Spectrum, b: &Spectrum, conj_b: bool) -> Spectrum {
    assert_eq!(a.shape(), b.shape(), "Spectra must have the same shape");
    a.zip_map(b, |x, y| if conj_b { x * y.conj() } else { x * y })
}

/// Elementwise complex division `a / b`
///
pub fn div_spectrums(a: &Spectrum, b: &Spectrum) -> Spectrum {
    assert_eq!(a.shape(), b.shape(), "Spectra must have the same shape");
    a.zip_map(b, |x, y| x / y)
}

/// Circularly rolls the image so that the element at the origin moves to the center
///
pub fn fft_shift(image: &GrayImage) -> GrayImage {
    let (rows, cols) = image.shape();
    GrayImage::from_fn(rows, cols, |r, c| {
        image[((r + rows / 2) % rows, (c + cols / 2) % cols)]
    })
}
