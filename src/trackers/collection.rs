use crate::trackers::mosse::MosseTracker;
use crate::trackers::tracker_api::{Detection, RegionTracker};
use crate::utils::image::Frame;
use crate::utils::region::Region;
use crate::Errors;
use anyhow::Result;
use log::{debug, info};
use rayon::prelude::*;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::borrow::Cow;
use std::path::Path;

/// Versioned on-disk format of a tracker collection
pub mod archive;

/// The file name used for the collection archive when the caller has no preference
pub const DEFAULT_ARCHIVE_NAME: &str = "trackers.mosse";

/// Ordered collection of independently trained trackers.
///
/// Trackers are addressed by insertion index. Detection runs every tracker on the frame and
/// reports the result of the most confident one.
///
pub struct TrackerCollection<T: RegionTracker = MosseTracker> {
    trackers: Vec<T>,
    opts: T::Options,
}

impl<T: RegionTracker> Default for TrackerCollection<T> {
    fn default() -> Self {
        Self::new(T::Options::default())
    }
}

impl<T: RegionTracker> TrackerCollection<T> {
    /// Creates an empty collection
    ///
    /// # Parameters
    /// * `opts` - options every new tracker is initialized with
    ///
    pub fn new(opts: T::Options) -> Self {
        Self {
            trackers: Vec::default(),
            opts,
        }
    }

    pub fn options(&self) -> &T::Options {
        &self.opts
    }

    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.trackers.get(index)
    }

    pub fn last(&self) -> Option<&T> {
        self.trackers.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.trackers.iter()
    }

    /// Appends an already trained tracker, returns its index
    ///
    pub fn push(&mut self, tracker: T) -> usize {
        self.trackers.push(tracker);
        self.trackers.len() - 1
    }

    /// Trains a new tracker on `region` of `frame` and appends it
    ///
    /// # Parameters
    /// * `frame` - the frame the region is selected in
    /// * `region` - the region to track
    ///
    pub fn add(&mut self, frame: &Frame, region: &Region) -> Result<usize> {
        let tracker = T::initialize(frame, region, &self.opts)?;
        let index = self.push(tracker);
        info!("Tracker #{} added, {} in total", index, self.len());
        Ok(index)
    }

    /// Trains a new tracker on the box of the last tracker, i.e. adds the current best guess
    /// as a new appearance. Nothing happens for an empty collection.
    ///
    pub fn duplicate_last(&mut self, frame: &Frame) -> Result<Option<usize>> {
        let Some(last) = self.trackers.last() else {
            return Ok(None);
        };
        let region = Region::from_center(last.position(), last.size());
        self.add(frame, &region).map(Some)
    }

    /// Removes the tracker at `index`; trackers after it move one index down
    ///
    pub fn remove(&mut self, index: usize) -> Option<T> {
        if index < self.trackers.len() {
            info!("Tracker #{} removed", index);
            Some(self.trackers.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        info!("{} trackers cleared", self.trackers.len());
        self.trackers.clear();
    }
}

impl<T> TrackerCollection<T>
where
    T: RegionTracker + Send,
{
    /// Runs every tracker on `frame` and returns the most confident result.
    ///
    /// The frame is converted to grayscale once. With the default `rate` of `0.0` trackers only
    /// probe the frame and their state stays untouched. Trackers are processed in parallel;
    /// on equal confidence the earlier tracker wins. An empty collection yields
    /// [`Detection::none`].
    ///
    pub fn detect(&mut self, frame: &Frame, rate: f32) -> Detection {
        let frame: Cow<'_, Frame> = if frame.is_color() {
            Cow::Owned(Frame::Gray(frame.to_gray().into_owned()))
        } else {
            Cow::Borrowed(frame)
        };
        let frame = frame.as_ref();

        let results = self
            .trackers
            .par_iter_mut()
            .map(|t| t.update(frame, rate))
            .collect::<Vec<_>>();

        let best = results
            .into_iter()
            .fold(Detection::none(), |best, d| if d.psr > best.psr { d } else { best });
        debug!(
            "Detection among {} trackers: ({:.1}, {:.1}), psr={:.2}",
            self.trackers.len(),
            best.x(),
            best.y(),
            best.psr
        );
        best
    }
}

impl<T> TrackerCollection<T>
where
    T: RegionTracker + Serialize + DeserializeOwned,
{
    /// Writes all trackers into the archive at `path`
    ///
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        archive::write(&path, &self.trackers)?;
        info!(
            "{} trackers saved to {}",
            self.trackers.len(),
            path.as_ref().display()
        );
        Ok(())
    }

    /// Replaces the trackers with the ones stored in the archive at `path`.
    ///
    /// Every record is validated before the swap. The collection stays unchanged when the
    /// archive cannot be read or holds an inconsistent tracker.
    ///
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let trackers: Vec<T> = archive::read(&path)?;
        for (i, t) in trackers.iter().enumerate() {
            t.validate()
                .map_err(|e| Errors::ArchiveDecode(format!("tracker {}: {}", i, e)))?;
        }
        self.trackers = trackers;
        info!(
            "{} trackers loaded from {}",
            self.trackers.len(),
            path.as_ref().display()
        );
        Ok(())
    }
}
