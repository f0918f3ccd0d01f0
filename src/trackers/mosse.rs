use crate::trackers::mosse::options::MosseOptions;
use crate::trackers::mosse::preprocess::Preprocessor;
use crate::trackers::tracker_api::{Detection, DetectionKind, RegionTracker};
use crate::utils::image::{
    border_index, extract_patch, saturate_u8, warp_affine, BorderMode, Frame, GrayImage,
};
use crate::utils::region::Region;
use crate::utils::spectrum::{div_spectrums, fft_shift, mul_spectrums, Fft2d, Spectrum};
use crate::{Errors, EPS};
use anyhow::Result;
use itertools::{Itertools, MinMaxResult};
use log::{debug, info, warn};
use nalgebra::{DMatrix, Matrix2x3, Point2, Vector2};
use once_cell::sync::OnceCell;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Tracker configuration
pub mod options;

/// Appearance preprocessing applied to every patch before it is transformed
pub mod preprocess;

/// The adaptation rate used when the caller has no preference
pub const DEFAULT_ADAPTATION_RATE: f32 = 0.125;

/// Gaussian peak of height `1` at `(height / 2, width / 2)`.
///
/// The separable kernel is truncated at the radius of `4 * sigma`. Taps that fall outside of
/// a small patch are mirrored back into it (`gfedcb|abcdefgh|gfedcba`) before the result is
/// scaled to its maximum.
///
pub fn desired_response(width: usize, height: usize, sigma: f32) -> GrayImage {
    let radius = (4.0 * sigma).round() as isize;
    let profile = |n: usize| {
        let mut p = vec![0.0f32; n];
        let center = (n / 2) as isize;
        for d in -radius..=radius {
            p[border_index(center + d, n, BorderMode::Reflect101)] +=
                (-((d * d) as f32) / (2.0 * sigma * sigma)).exp();
        }
        p
    };
    let (px, py) = (profile(width), profile(height));
    let g = GrayImage::from_fn(height, width, |r, c| py[r] * px[c]);
    let max = g.max();
    g / max
}

/// Rotates and scales the patch around its center by random amounts drawn from
/// `[-coef/2, coef/2)` and `[1 - coef/2, 1 + coef/2)`
///
fn random_warp<R: Rng>(patch: &GrayImage, coef: f32, rng: &mut R) -> GrayImage {
    let (h, w) = patch.shape();
    let angle = (rng.gen::<f32>() - 0.5) * coef;
    let scale = 1.0 + (rng.gen::<f32>() - 0.5) * coef;
    let (c, s) = (angle.cos() * scale, angle.sin() * scale);
    let (cx, cy) = (w as f32 / 2.0, h as f32 / 2.0);
    let m = Matrix2x3::new(
        c,
        -s,
        cx - (c * cx - s * cy),
        s,
        c,
        cy - (s * cx + c * cy),
    );
    warp_affine(patch, &m, BorderMode::Reflect)
}

/// Combined filter `conj(H1 / H2)`
///
pub fn synthesize_filter(numerator: &Spectrum, denominator: &Spectrum) -> Spectrum {
    div_spectrums(numerator, denominator).map(|c| c.conj())
}

/// Exponential moving average `old * (1 - rate) + new * rate`
///
fn blend(old: &Spectrum, new: &Spectrum, rate: f32) -> Spectrum {
    old.zip_map(new, |o, n| o * (1.0 - rate) + n * rate)
}

/// Sums correlation statistics of training samples into fresh accumulators
///
#[derive(Debug, Clone)]
pub struct FilterAccumulator {
    numerator: Spectrum,
    denominator: Spectrum,
    samples: usize,
}

impl FilterAccumulator {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            numerator: Spectrum::zeros(rows, cols),
            denominator: Spectrum::zeros(rows, cols),
            samples: 0,
        }
    }

    /// Adds a sample spectrum `a` against the desired response spectrum `g`
    ///
    pub fn accumulate(&mut self, g: &Spectrum, a: &Spectrum) {
        self.numerator += mul_spectrums(g, a, true);
        self.denominator += mul_spectrums(a, a, true);
        self.samples += 1;
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// `(H1, H2, H)`
    ///
    pub fn finalize(self) -> (Spectrum, Spectrum, Spectrum) {
        assert!(self.samples > 0, "Filter cannot be built without samples");
        let filter = synthesize_filter(&self.numerator, &self.denominator);
        (self.numerator, self.denominator, filter)
    }
}

struct Correlation {
    response: GrayImage,
    displacement: Vector2<f32>,
    psr: f32,
}

/// MOSSE correlation filter tracking a single rigid appearance patch
///
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MosseTracker {
    position: Point2<f32>,
    size: (usize, usize),
    preprocessor: Preprocessor,
    desired_response: Spectrum,
    numerator: Spectrum,
    denominator: Spectrum,
    filter: Spectrum,
    initial_patch: GrayImage,
    psr: f32,
    good: bool,
    opts: MosseOptions,
    #[serde(skip)]
    last_patch: Option<GrayImage>,
    #[serde(skip)]
    last_response: Option<GrayImage>,
    #[serde(skip)]
    fft: OnceCell<Fft2d>,
}

impl MosseTracker {
    /// Creates the tracker and trains it on randomly perturbed copies of the region's patch
    ///
    /// # Parameters
    /// * `frame` - the frame the region was selected in
    /// * `region` - the region; its size is rounded up to a transform-friendly size
    /// * `opts` - tracker options
    ///
    pub fn new(frame: &Frame, region: &Region, opts: MosseOptions) -> Result<Self> {
        let (position, size) = region.normalize()?;
        let (w, h) = size;
        let gray = frame.to_gray();
        let initial_patch = extract_patch(&gray, size, position);
        let preprocessor = Preprocessor::new(w, h);
        let fft = Fft2d::new(h, w);
        let desired_response = fft.forward(&self::desired_response(w, h, opts.gaussian_sigma));

        let mut rng = match opts.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut acc = FilterAccumulator::new(h, w);
        for _ in 0..opts.bootstrap_samples {
            let warped = random_warp(&initial_patch, opts.perturbation, &mut rng);
            let a = fft.forward(&preprocessor.preprocess(&warped));
            acc.accumulate(&desired_response, &a);
        }
        let (numerator, denominator, filter) = acc.finalize();

        let fft_cell = OnceCell::new();
        let _ = fft_cell.set(fft);

        let mut tracker = Self {
            position,
            size,
            preprocessor,
            desired_response,
            numerator,
            denominator,
            filter,
            initial_patch,
            psr: 0.0,
            good: false,
            opts,
            last_patch: None,
            last_response: None,
            fft: fft_cell,
        };
        tracker.update(frame, DEFAULT_ADAPTATION_RATE);
        info!(
            "New tracker at ({:.1}, {:.1}), size {}x{}, psr={:.2}",
            tracker.position.x, tracker.position.y, w, h, tracker.psr
        );
        Ok(tracker)
    }

    fn fft(&self) -> &Fft2d {
        self.fft.get_or_init(|| Fft2d::new(self.size.1, self.size.0))
    }

    fn correlate(&self, image: &GrayImage) -> Correlation {
        let fft = self.fft();
        let spectrum = mul_spectrums(&fft.forward(image), &self.filter, true);
        let response = fft.inverse_real(&spectrum);
        let (rows, cols) = response.shape();

        let (mut my, mut mx, mut peak) = (0, 0, f32::MIN);
        for r in 0..rows {
            for c in 0..cols {
                if response[(r, c)] > peak {
                    (my, mx, peak) = (r, c, response[(r, c)]);
                }
            }
        }

        let radius = self.opts.sidelobe_radius;
        let mut sidelobe = response.clone();
        for r in my.saturating_sub(radius)..=(my + radius).min(rows - 1) {
            for c in mx.saturating_sub(radius)..=(mx + radius).min(cols - 1) {
                sidelobe[(r, c)] = 0.0;
            }
        }
        let n = sidelobe.len() as f32;
        let mean = sidelobe.sum() / n;
        let std = (sidelobe.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>() / n).sqrt();
        let psr = (peak - mean) / (std + EPS);

        Correlation {
            response,
            displacement: Vector2::new(
                mx as f32 - (cols / 2) as f32,
                my as f32 - (rows / 2) as f32,
            ),
            psr,
        }
    }

    /// Locates the target in `frame` and, when `rate` is high enough, adapts to it.
    ///
    /// With `rate` below the probe threshold the returned point is the displacement of the
    /// correlation peak from the current position and neither the position nor the filter
    /// change. Otherwise the position moves by that displacement, the filter is blended
    /// with the appearance at the new position and the new position is returned.
    ///
    pub fn update(&mut self, frame: &Frame, rate: f32) -> Detection {
        let gray = frame.to_gray();
        let patch = extract_patch(&gray, self.size, self.position);
        let corr = self.correlate(&self.preprocessor.preprocess(&patch));

        self.last_patch = Some(patch);
        self.last_response = Some(corr.response);
        self.psr = corr.psr;
        self.good = corr.psr > self.opts.psr_threshold;

        if rate < self.opts.probe_rate_threshold {
            debug!(
                "Probe: displacement=({}, {}), psr={:.2}",
                corr.displacement.x, corr.displacement.y, corr.psr
            );
            return Detection::new(
                Point2::from(corr.displacement),
                corr.psr,
                DetectionKind::Displacement,
            );
        }

        self.position += corr.displacement;
        let patch = extract_patch(&gray, self.size, self.position);
        let a = self.fft().forward(&self.preprocessor.preprocess(&patch));
        let numerator = mul_spectrums(&self.desired_response, &a, true);
        let denominator = mul_spectrums(&a, &a, true);
        self.numerator = blend(&self.numerator, &numerator, rate);
        self.denominator = blend(&self.denominator, &denominator, rate);
        self.filter = synthesize_filter(&self.numerator, &self.denominator);
        self.last_patch = Some(patch);

        if self.good {
            debug!(
                "Update: position=({:.1}, {:.1}), psr={:.2}",
                self.position.x, self.position.y, self.psr
            );
        } else {
            warn!(
                "Low confidence at ({:.1}, {:.1}): psr={:.2} is below {}",
                self.position.x, self.position.y, self.psr, self.opts.psr_threshold
            );
        }

        Detection::new(self.position, self.psr, DetectionKind::Position)
    }

    pub fn position(&self) -> Point2<f32> {
        self.position
    }

    /// `(width, height)`
    pub fn size(&self) -> (usize, usize) {
        self.size
    }

    pub fn psr(&self) -> f32 {
        self.psr
    }

    pub fn is_good(&self) -> bool {
        self.good
    }

    pub fn options(&self) -> &MosseOptions {
        &self.opts
    }

    pub fn window(&self) -> &GrayImage {
        self.preprocessor.window()
    }

    /// Spectrum of the desired gaussian response
    pub fn desired_response(&self) -> &Spectrum {
        &self.desired_response
    }

    /// `H1`
    pub fn numerator(&self) -> &Spectrum {
        &self.numerator
    }

    /// `H2`
    pub fn denominator(&self) -> &Spectrum {
        &self.denominator
    }

    /// `H`
    pub fn filter(&self) -> &Spectrum {
        &self.filter
    }

    pub fn initial_patch(&self) -> &GrayImage {
        &self.initial_patch
    }

    pub fn last_patch(&self) -> Option<&GrayImage> {
        self.last_patch.as_ref()
    }

    pub fn last_response(&self) -> Option<&GrayImage> {
        self.last_response.as_ref()
    }

    /// Verifies that every learned matrix has the tracker's shape.
    ///
    /// Trackers built by [`MosseTracker::new`] always pass; restored ones may not.
    ///
    pub fn validate(&self) -> Result<()> {
        let (w, h) = self.size;
        if w == 0 || h == 0 {
            return Err(Errors::InconsistentTracker(format!("empty size {}x{}", w, h)).into());
        }
        let shapes = [
            ("window", self.preprocessor.window().shape()),
            ("initial patch", self.initial_patch.shape()),
            ("desired response", self.desired_response.shape()),
            ("numerator", self.numerator.shape()),
            ("denominator", self.denominator.shape()),
            ("filter", self.filter.shape()),
        ];
        if let Some((name, (rows, cols))) = shapes.into_iter().find(|(_, s)| *s != (h, w)) {
            return Err(Errors::InconsistentTracker(format!(
                "{} is {}x{} while the tracker is {}x{}",
                name, cols, rows, w, h
            ))
            .into());
        }
        Ok(())
    }

    /// Corner box around the current position
    ///
    pub fn bounding_box(&self) -> Region {
        Region::from_center(self.position, self.size)
    }

    /// The spatial filter with its origin moved to the patch center
    ///
    pub fn filter_kernel(&self) -> GrayImage {
        fft_shift(&self.fft().inverse_real(&self.filter))
    }

    /// The spatial filter stretched to the full `u8` range
    ///
    pub fn filter_kernel_image(&self) -> DMatrix<u8> {
        let kernel = self.filter_kernel();
        match kernel.iter().minmax() {
            MinMaxResult::MinMax(&min, &max) if max > min => {
                kernel.map(|v| ((v - min) / (max - min) * 255.0) as u8)
            }
            _ => DMatrix::zeros(kernel.nrows(), kernel.ncols()),
        }
    }

    /// Last patch, initial patch and the last response scaled by its maximum, side by side
    ///
    pub fn state_visualization(&self) -> Option<DMatrix<u8>> {
        let (patch, response) = (self.last_patch.as_ref()?, self.last_response.as_ref()?);
        let (w, h) = self.size;
        let max = response.max();
        let response = if max > 0.0 {
            response.map(|v| (v / max).clamp(0.0, 1.0) * 255.0)
        } else {
            GrayImage::zeros(h, w)
        };
        let parts = [
            saturate_u8(patch),
            saturate_u8(&self.initial_patch),
            saturate_u8(&response),
        ];
        Some(DMatrix::from_fn(h, 3 * w, |r, c| parts[c / w][(r, c % w)]))
    }
}

impl RegionTracker for MosseTracker {
    type Options = MosseOptions;

    fn initialize(frame: &Frame, region: &Region, opts: &Self::Options) -> Result<Self> {
        MosseTracker::new(frame, region, opts.clone())
    }

    fn update(&mut self, frame: &Frame, rate: f32) -> Detection {
        MosseTracker::update(self, frame, rate)
    }

    fn confidence(&self) -> f32 {
        self.psr
    }

    fn is_good(&self) -> bool {
        self.good
    }

    fn position(&self) -> Point2<f32> {
        self.position
    }

    fn size(&self) -> (usize, usize) {
        self.size
    }

    fn validate(&self) -> Result<()> {
        MosseTracker::validate(self)
    }
}
