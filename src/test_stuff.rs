use crate::utils::image::GrayImage;
use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// Dark frame with a bright axis-aligned square.
///
/// Pixels within `half_side` of `center` along both axes get `fg`, the rest `bg`.
///
pub fn square_scene(
    width: usize,
    height: usize,
    center: (f32, f32),
    half_side: usize,
    fg: f32,
    bg: f32,
) -> GrayImage {
    let half = half_side as f32;
    GrayImage::from_fn(height, width, |r, c| {
        if (c as f32 - center.0).abs() <= half && (r as f32 - center.1).abs() <= half {
            fg
        } else {
            bg
        }
    })
}

#[derive(Debug, Clone, Copy)]
struct Blob {
    x: f32,
    y: f32,
    sigma: f32,
    amplitude: f32,
}

/// Textured frame made of random gaussian blobs over a flat background.
///
/// The texture is evaluated analytically, so `shift` moves the whole content by any,
/// including sub-pixel, amount. Equal seeds produce equal textures.
///
pub fn blob_scene(width: usize, height: usize, shift: (f32, f32), seed: u64) -> GrayImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let blobs = (0..(width * height / 400).max(8))
        .map(|_| Blob {
            x: rng.gen_range(0.0..width as f32),
            y: rng.gen_range(0.0..height as f32),
            sigma: rng.gen_range(2.0..6.0),
            amplitude: rng.gen_range(40.0..160.0),
        })
        .collect::<Vec<_>>();

    GrayImage::from_fn(height, width, |r, c| {
        let (x, y) = (c as f32 - shift.0, r as f32 - shift.1);
        let v = blobs
            .iter()
            .map(|b| {
                let d2 = (x - b.x).powi(2) + (y - b.y).powi(2);
                b.amplitude * (-d2 / (2.0 * b.sigma * b.sigma)).exp()
            })
            .sum::<f32>();
        (30.0 + v).min(255.0)
    })
}

/// Adds zero-mean gaussian noise with the given standard deviation, clamped to `[0, 255]`
///
pub fn add_gaussian_noise<R: Rng>(
    image: &GrayImage,
    sigma: f32,
    rng: &mut R,
) -> Result<GrayImage> {
    if sigma == 0.0 {
        return Ok(image.map(|v| v.clamp(0.0, 255.0)));
    }
    let normal = Normal::new(0.0, sigma)?;
    Ok(image.map(|v| (v + normal.sample(&mut *rng)).clamp(0.0, 255.0)))
}
