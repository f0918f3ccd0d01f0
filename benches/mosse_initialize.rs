#![feature(test)]

extern crate test;

use mosse::prelude::{Frame, MosseOptions, MosseTracker, Region};
use mosse::test_stuff::blob_scene;
use test::Bencher;

#[bench]
fn mosse_initialize_032(b: &mut Bencher) {
    bench_initialize(32, b);
}

#[bench]
fn mosse_initialize_064(b: &mut Bencher) {
    bench_initialize(64, b);
}

#[bench]
fn mosse_initialize_128(b: &mut Bencher) {
    bench_initialize(128, b);
}

fn bench_initialize(side: usize, b: &mut Bencher) {
    let frame = Frame::from(blob_scene(side * 3, side * 3, (0.0, 0.0), 1));
    let region = Region::top_left(side as f32, side as f32, side as f32, side as f32);
    let opts = MosseOptions::default().seed(Some(1));
    b.iter(|| {
        MosseTracker::new(&frame, &region, opts.clone()).unwrap();
    });
}
