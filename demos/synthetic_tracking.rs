use anyhow::Result;
use mosse::prelude::{
    Command, DetectorSession, Frame, MosseOptions, MosseTracker, Region, TrackerCollection,
};
use mosse::test_stuff::blob_scene;

fn main() -> Result<()> {
    env_logger::init();

    let mut session = DetectorSession::new(TrackerCollection::<MosseTracker>::new(
        MosseOptions::default().seed(Some(42)),
    ))
    .archive_path(std::env::temp_dir().join("synthetic_tracking.mosse"));

    // the scene drifts right and slightly down
    let scene = |i: usize| Frame::from(blob_scene(320, 240, (i as f32 * 1.5, i as f32 * 0.5), 7));

    session.process_frame(scene(0));
    let id = session.select_region(&Region::top_left(120.0, 80.0, 64.0, 64.0))?;
    eprintln!("Tracker {} selected", id);

    for i in 1..6 {
        let d = session.process_frame(scene(i));
        eprintln!("Probe {}: {:?}", i, d);
    }

    session.handle(Command::ToggleAdaptation)?;
    for i in 6..20 {
        let d = session.process_frame(scene(i));
        eprintln!("Frame {}: ({:.1}, {:.1}) psr={:.2}", i, d.x(), d.y(), d.psr);
    }

    session.handle(Command::AddBestGuess)?;
    session.handle(Command::Save)?;
    session.handle(Command::Clear)?;
    session.handle(Command::Load)?;
    eprintln!("Trackers after reload: {}", session.collection().len());

    for t in session.collection().iter() {
        eprintln!("Box: {:?}, good: {}", t.bounding_box(), t.is_good());
    }
    Ok(())
}
