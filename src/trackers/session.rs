use crate::trackers::collection::{TrackerCollection, DEFAULT_ARCHIVE_NAME};
use crate::trackers::mosse::MosseTracker;
use crate::trackers::tracker_api::{Detection, RegionTracker};
use crate::utils::image::Frame;
use crate::utils::region::Region;
use crate::Errors;
use anyhow::Result;
use log::info;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// The adaptation rate switched on by [`Command::ToggleAdaptation`]
pub const CONTINUOUS_ADAPTATION_RATE: f32 = 0.2;

/// Operator commands of an interactive frame loop
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Stop or resume taking new frames
    TogglePause,
    /// Train one more tracker on the box of the last added tracker
    AddBestGuess,
    /// Drop all trackers
    Clear,
    /// Write the trackers into the session archive
    Save,
    /// Replace the trackers with the session archive content
    Load,
    /// Switch between probing and continuous adaptation
    ToggleAdaptation,
}

/// Drives a tracker collection from a frame loop.
///
/// The session owns the current frame and the loop state; user input is mapped to
/// [`Command`]s and region selections by the caller.
///
pub struct DetectorSession<T: RegionTracker = MosseTracker> {
    collection: TrackerCollection<T>,
    frame: Option<Frame>,
    paused: bool,
    update_rate: f32,
    archive_path: PathBuf,
}

impl<T: RegionTracker> DetectorSession<T> {
    pub fn new(collection: TrackerCollection<T>) -> Self {
        Self {
            collection,
            frame: None,
            paused: false,
            update_rate: 0.0,
            archive_path: PathBuf::from(DEFAULT_ARCHIVE_NAME),
        }
    }

    /// Where `Save` and `Load` keep the trackers
    ///
    pub fn archive_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.archive_path = path.as_ref().to_path_buf();
        self
    }

    pub fn collection(&self) -> &TrackerCollection<T> {
        &self.collection
    }

    pub fn collection_mut(&mut self) -> &mut TrackerCollection<T> {
        &mut self.collection
    }

    pub fn frame(&self) -> Option<&Frame> {
        self.frame.as_ref()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn update_rate(&self) -> f32 {
        self.update_rate
    }

    /// Adds a tracker for a region selected on the current frame
    ///
    pub fn select_region(&mut self, region: &Region) -> Result<usize> {
        let frame = self.frame.as_ref().ok_or(Errors::MissingFrame)?;
        self.collection.add(frame, region)
    }
}

impl<T> DetectorSession<T>
where
    T: RegionTracker + Send + Serialize + DeserializeOwned,
{
    /// Takes the next frame from the source and runs detection on the current frame.
    ///
    /// A paused session keeps detecting on the frame it had when it was paused.
    ///
    pub fn process_frame(&mut self, frame: Frame) -> Detection {
        if !self.paused || self.frame.is_none() {
            self.frame = Some(frame);
        }
        match &self.frame {
            Some(frame) => self.collection.detect(frame, self.update_rate),
            None => Detection::none(),
        }
    }

    pub fn handle(&mut self, command: Command) -> Result<()> {
        match command {
            Command::TogglePause => {
                self.paused = !self.paused;
                info!("Paused: {}", self.paused);
            }
            Command::AddBestGuess => {
                let frame = self.frame.as_ref().ok_or(Errors::MissingFrame)?;
                self.collection.duplicate_last(frame)?;
            }
            Command::Clear => self.collection.clear(),
            Command::Save => self.collection.save(&self.archive_path)?,
            Command::Load => self.collection.load(&self.archive_path)?,
            Command::ToggleAdaptation => {
                self.update_rate = if self.update_rate < 0.1 {
                    CONTINUOUS_ADAPTATION_RATE
                } else {
                    0.0
                };
                info!("Update rate {}", self.update_rate);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_stuff::blob_scene;
    use crate::trackers::collection::TrackerCollection;
    use crate::trackers::mosse::options::MosseOptions;
    use crate::trackers::mosse::MosseTracker;
    use crate::trackers::session::{Command, DetectorSession, CONTINUOUS_ADAPTATION_RATE};
    use crate::trackers::tracker_api::{Detection, DetectionKind};
    use crate::utils::image::Frame;
    use crate::utils::region::Region;
    use crate::Errors;
    use nalgebra::Point2;

    fn session() -> DetectorSession {
        DetectorSession::new(TrackerCollection::<MosseTracker>::new(
            MosseOptions::default().seed(Some(8)).bootstrap_samples(32),
        ))
    }

    fn scene(dx: f32, dy: f32) -> Frame {
        Frame::from(blob_scene(160, 160, (dx, dy), 31))
    }

    #[test]
    fn nothing_to_do_without_frames() {
        let mut s = session();
        assert!(s.frame().is_none());
        let err = s
            .select_region(&Region::top_left(10.0, 10.0, 32.0, 32.0))
            .unwrap_err();
        assert_eq!(err.downcast_ref::<Errors>(), Some(&Errors::MissingFrame));
        assert!(s.handle(Command::AddBestGuess).is_err());
        assert_eq!(s.process_frame(scene(0.0, 0.0)), Detection::none());
    }

    #[test]
    fn pause_keeps_current_frame() {
        let mut s = session();
        s.process_frame(scene(0.0, 0.0));
        s.select_region(&Region::top_left(50.0, 50.0, 48.0, 48.0))
            .unwrap();
        s.handle(Command::TogglePause).unwrap();
        assert!(s.is_paused());

        let d = s.process_frame(scene(3.0, 1.0));
        assert_eq!(d.kind, DetectionKind::Displacement);
        assert_eq!(d.point, Point2::new(0.0, 0.0));

        s.handle(Command::TogglePause).unwrap();
        let d = s.process_frame(scene(3.0, 1.0));
        assert_eq!(d.point, Point2::new(3.0, 1.0));
    }

    #[test]
    fn adaptation_toggle_commits_positions() {
        let mut s = session();
        s.process_frame(scene(0.0, 0.0));
        s.select_region(&Region::top_left(50.0, 50.0, 48.0, 48.0))
            .unwrap();
        let start = s.collection().get(0).unwrap().position();

        s.handle(Command::ToggleAdaptation).unwrap();
        assert_eq!(s.update_rate(), CONTINUOUS_ADAPTATION_RATE);
        let d = s.process_frame(scene(2.0, 2.0));
        assert_eq!(d.kind, DetectionKind::Position);
        assert_eq!(d.point, start + nalgebra::Vector2::new(2.0, 2.0));

        s.handle(Command::ToggleAdaptation).unwrap();
        assert_eq!(s.update_rate(), 0.0);
    }

    #[test]
    fn best_guess_clear_save_load() {
        let path = std::env::temp_dir().join(format!("mosse-session-{}.bin", std::process::id()));
        let mut s = session().archive_path(&path);
        s.process_frame(scene(0.0, 0.0));
        s.select_region(&Region::corners(40.0, 40.0, 88.0, 88.0))
            .unwrap();
        s.handle(Command::AddBestGuess).unwrap();
        assert_eq!(s.collection().len(), 2);

        s.handle(Command::Save).unwrap();
        s.handle(Command::Clear).unwrap();
        assert!(s.collection().is_empty());

        s.handle(Command::Load).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(s.collection().len(), 2);
        assert!(s.handle(Command::Load).is_err());
        assert_eq!(s.collection().len(), 2);
    }
}
