use serde::{Deserialize, Serialize};

/// Class that is used to configure the MOSSE tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MosseOptions {
    pub(crate) psr_threshold: f32,
    pub(crate) bootstrap_samples: usize,
    pub(crate) perturbation: f32,
    pub(crate) gaussian_sigma: f32,
    pub(crate) sidelobe_radius: usize,
    pub(crate) probe_rate_threshold: f32,
    pub(crate) seed: Option<u64>,
}

impl Default for MosseOptions {
    fn default() -> Self {
        Self {
            psr_threshold: 8.0,
            bootstrap_samples: 128,
            perturbation: 0.2,
            gaussian_sigma: 2.0,
            sidelobe_radius: 5,
            probe_rate_threshold: 0.01,
            seed: None,
        }
    }
}

impl MosseOptions {
    /// The peak-to-sidelobe ratio above which the tracker reports itself as good.
    ///
    pub fn psr_threshold(mut self, threshold: f32) -> Self {
        self.psr_threshold = threshold;
        self
    }

    /// The number of randomly perturbed copies of the initial patch the filter is trained on.
    ///
    pub fn bootstrap_samples(mut self, n: usize) -> Self {
        assert!(n > 0, "At least one bootstrap sample is required");
        self.bootstrap_samples = n;
        self
    }

    /// Full width of the perturbation ranges. Rotation (radians) and scale are drawn uniformly
    /// from `[-p/2, p/2)` and `[1 - p/2, 1 + p/2)`.
    ///
    pub fn perturbation(mut self, p: f32) -> Self {
        assert!((0.0..1.0).contains(&p), "Perturbation must be in [0, 1)");
        self.perturbation = p;
        self
    }

    /// Sigma of the synthetic gaussian peak the filter should respond with.
    ///
    pub fn gaussian_sigma(mut self, sigma: f32) -> Self {
        assert!(sigma > 0.0, "Sigma must be positive");
        self.gaussian_sigma = sigma;
        self
    }

    /// Half width of the area around the correlation peak excluded from sidelobe statistics.
    ///
    pub fn sidelobe_radius(mut self, r: usize) -> Self {
        self.sidelobe_radius = r;
        self
    }

    /// Updates with a rate below this value do not adapt the tracker and only probe the frame.
    ///
    pub fn probe_rate_threshold(mut self, rate: f32) -> Self {
        self.probe_rate_threshold = rate;
        self
    }

    /// Seed for the bootstrap perturbations; without a seed the generator is seeded from
    /// OS entropy.
    ///
    pub fn seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::trackers::mosse::options::MosseOptions;

    #[test]
    fn builder() {
        let opts = MosseOptions::default()
            .psr_threshold(6.5)
            .bootstrap_samples(16)
            .seed(Some(42));
        assert_eq!(opts.psr_threshold, 6.5);
        assert_eq!(opts.bootstrap_samples, 16);
        assert_eq!(opts.seed, Some(42));
        assert_eq!(opts.sidelobe_radius, 5);
    }

    #[test]
    #[should_panic]
    fn no_samples() {
        MosseOptions::default().bootstrap_samples(0);
    }
}
