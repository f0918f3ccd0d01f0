use crate::utils::image::GrayImage;
use crate::EPS;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Separable raised-cosine window, `0.5 * (1 - cos(2 pi i / (n - 1)))` along each axis
///
pub fn hanning_window(width: usize, height: usize) -> GrayImage {
    let wx = hanning(width);
    let wy = hanning(height);
    GrayImage::from_fn(height, width, |r, c| wy[r] * wx[c])
}

fn hanning(n: usize) -> Vec<f32> {
    if n < 2 {
        return vec![1.0; n];
    }
    let k = 2.0 * PI / (n - 1) as f32;
    (0..n).map(|i| 0.5 * (1.0 - (k * i as f32).cos())).collect()
}

/// Log compression followed by zero-mean, unit-variance scaling
///
pub fn normalize(patch: &GrayImage) -> GrayImage {
    let logged = patch.map(|v| (v + 1.0).ln());
    let n = logged.len() as f32;
    let mean = logged.sum() / n;
    let var = logged.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n;
    let denom = var.sqrt() + EPS;
    logged.map(|v| (v - mean) / denom)
}

/// Appearance preprocessor owning the fixed window of a tracker
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    window: GrayImage,
}

impl Preprocessor {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            window: hanning_window(width, height),
        }
    }

    pub fn window(&self) -> &GrayImage {
        &self.window
    }

    /// Normalizes the patch and applies the window. The patch must have the window's shape.
    ///
    pub fn preprocess(&self, patch: &GrayImage) -> GrayImage {
        assert_eq!(
            patch.shape(),
            self.window.shape(),
            "Patch shape does not match the tracker window"
        );
        normalize(patch).component_mul(&self.window)
    }
}

#[cfg(test)]
mod tests {
    use crate::trackers::mosse::preprocess::{hanning_window, normalize, Preprocessor};
    use crate::utils::image::GrayImage;
    use crate::EstimateClose;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn window_shape() {
        let w = hanning_window(8, 5);
        assert_eq!(w.shape(), (5, 8));
        assert_eq!(w[(0, 0)], 0.0);
        assert!(w[(4, 7)].abs() < 1e-6);
        assert!(w[(2, 3)].almost_same(&w[(2, 4)], 1e-6));
        assert!(w.iter().all(|v| (0.0..=1.0).contains(v)));

        let odd = hanning_window(9, 9);
        assert!(odd[(4, 4)].almost_same(&1.0, 1e-6));
    }

    #[test]
    fn normalized_statistics() {
        let mut rng = StdRng::seed_from_u64(11);
        let patch = GrayImage::from_fn(16, 16, |_, _| rng.gen_range(0.0..255.0));
        let n = normalize(&patch);
        let mean = n.mean();
        let var = n.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n.len() as f32;
        assert!(mean.abs() < 1e-4);
        assert!(var.almost_same(&1.0, 1e-3));
    }

    #[test]
    fn flat_patch_is_zero() {
        let p = Preprocessor::new(8, 8);
        let out = p.preprocess(&GrayImage::from_element(8, 8, 77.0));
        assert!(out.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn contrast_invariance_of_log_domain() {
        let mut rng = StdRng::seed_from_u64(5);
        let patch = GrayImage::from_fn(12, 12, |_, _| rng.gen_range(0.0..100.0));
        // a gain in the log domain is removed by standardization
        let squared = patch.map(|v| (v + 1.0) * (v + 1.0) - 1.0);
        let p = Preprocessor::new(12, 12);
        let (a, b) = (p.preprocess(&patch), p.preprocess(&squared));
        for (x, y) in a.iter().zip(b.iter()) {
            assert!(x.almost_same(y, 1e-3));
        }
    }

    #[test]
    #[should_panic]
    fn shape_mismatch_is_fatal() {
        Preprocessor::new(8, 8).preprocess(&GrayImage::zeros(8, 9));
    }
}
