use crate::trackers;
use crate::utils;

pub use trackers::collection::{TrackerCollection, DEFAULT_ARCHIVE_NAME};
pub use trackers::mosse::options::MosseOptions;
pub use trackers::mosse::{MosseTracker, DEFAULT_ADAPTATION_RATE};
pub use trackers::session::{Command, DetectorSession};
pub use trackers::tracker_api::{Detection, DetectionKind, RegionTracker};

pub use utils::image::{Frame, GrayImage};
pub use utils::region::Region;
pub use utils::spectrum::{Fft2d, Spectrum};

pub use crate::EstimateClose;
