//! Integration tests: multi-pointer stroke capture (hw-core).
//!
//! Drives `StrokeBatcher` with the headless `FrameQueue` and checks what
//! reached the `RecordingSink` frame by frame.

use hw_core::{
    FrameQueue, InputEvent, Line, Point, PointerId, Rect, RecordingSink, ReleasePolicy,
    StrokeBatcher, SurfaceGeometry, Vec2,
};
use pretty_assertions::assert_eq;

type Batcher = StrokeBatcher<RecordingSink, FrameQueue>;

const A: PointerId = PointerId(1);
const B: PointerId = PointerId(2);

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn make_batcher() -> Batcher {
    init_logging();
    StrokeBatcher::new(RecordingSink::new(), FrameQueue::new())
}

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn screen() -> Rect {
    Rect::new(0.0, 0.0, 800.0, 600.0)
}

/// Expected segments for consecutive samples, shifted by `offset`.
fn chain(samples: &[Point], offset: Vec2) -> Vec<Line> {
    samples
        .windows(2)
        .map(|w| Line::new(w[0] + offset, w[1] + offset))
        .collect()
}

// ─── Scenarios ──────────────────────────────────────────────────────────

#[test]
fn tap_drag_release_draws_one_segment() {
    let mut batcher = make_batcher();
    batcher.handle(&InputEvent::down(A, 10.0, 10.0), screen);
    batcher.handle(&InputEvent::moved(A, 20.0, 20.0), screen);
    assert_eq!(batcher.tick(), 1);
    let trace = batcher.handle(&InputEvent::up(A, 20.0, 20.0), screen).unwrap();

    assert_eq!(
        batcher.sink().segments_for(A),
        vec![Line::new(pt(10.0, 10.0), pt(20.0, 20.0))]
    );
    assert_eq!(trace.points, vec![pt(10.0, 10.0), pt(20.0, 20.0)]);
    assert_eq!(trace.pointer_id, A);
}

#[test]
fn two_moves_in_one_frame_draw_once() {
    let mut batcher = make_batcher();
    batcher.start(A, pt(0.0, 0.0), screen());
    batcher.extend(A, &[pt(5.0, 5.0)]);
    batcher.extend(A, &[pt(9.0, 9.0)]);

    assert_eq!(batcher.tick(), 1);
    assert_eq!(batcher.sink().batches().len(), 1);
    assert_eq!(
        batcher.sink().batches()[0].segments,
        vec![
            Line::new(pt(0.0, 0.0), pt(5.0, 5.0)),
            Line::new(pt(5.0, 5.0), pt(9.0, 9.0)),
        ]
    );
}

// ─── Scheduling invariants ──────────────────────────────────────────────

#[test]
fn at_most_one_pending_frame_per_pointer() {
    let mut batcher = make_batcher();
    batcher.start(A, pt(0.0, 0.0), screen());
    batcher.start(B, pt(0.0, 0.0), screen());

    for i in 1..=50 {
        let v = i as f64;
        batcher.extend(A, &[pt(v, 0.0)]);
        batcher.extend(B, &[pt(0.0, v)]);
        assert_eq!(batcher.scheduler().pending_for(A), 1);
        assert_eq!(batcher.scheduler().pending_for(B), 1);
    }
    assert_eq!(batcher.scheduler().cancelled(), 98);
    assert_eq!(batcher.tick(), 2);
    assert!(batcher.scheduler().is_empty());
}

#[test]
fn nothing_is_drawn_after_release() {
    let mut batcher = make_batcher();
    batcher.set_release_policy(ReleasePolicy::KeepContent);
    batcher.start(A, pt(0.0, 0.0), screen());
    batcher.extend(A, &[pt(1.0, 1.0)]);
    let in_flight = batcher.session(A).unwrap().scheduled().unwrap();
    batcher.cancel(A);

    // The host may still deliver a callback it failed to withdraw.
    assert!(!batcher.run_frame(A, in_flight));
    assert_eq!(batcher.tick(), 0);
    assert!(batcher.sink().batches().is_empty());
}

#[test]
fn reused_pointer_id_ignores_old_frame() {
    let mut batcher = make_batcher();
    batcher.start(A, pt(0.0, 0.0), screen());
    batcher.extend(A, &[pt(1.0, 1.0)]);
    let old = batcher.session(A).unwrap().scheduled().unwrap();
    batcher.end(A);

    batcher.start(A, pt(50.0, 50.0), screen());
    batcher.extend(A, &[pt(60.0, 60.0)]);
    assert!(!batcher.run_frame(A, old));
    assert_eq!(batcher.tick(), 1);
    assert_eq!(
        batcher.sink().segments_for(A),
        vec![Line::new(pt(50.0, 50.0), pt(60.0, 60.0))]
    );
}

// ─── Segment fidelity ───────────────────────────────────────────────────

#[test]
fn segments_across_flushes_match_samples_exactly() {
    let mut batcher = make_batcher();
    // Surface shown at (30, 40) at half its backing size: scale 2.
    let bounds = Rect::new(30.0, 40.0, 430.0, 340.0);
    let start = pt(31.0, 41.0);
    batcher.start(A, start, bounds);
    let offset = batcher.session(A).unwrap().origin_offset();
    assert_eq!(offset, Vec2::new(-60.0, -80.0));

    let mut samples = vec![start];
    let mut expected_batches = 0;
    for frame in 0..6 {
        for event in 0..3 {
            let base = (frame * 3 + event) as f64;
            let coalesced = [pt(32.0 + base, 41.0), pt(32.5 + base, 42.0)];
            samples.extend_from_slice(&coalesced);
            batcher.handle(
                &InputEvent::moved_coalesced(A, 32.5 + base, 42.0, coalesced),
                || unreachable!(),
            );
        }
        expected_batches += batcher.tick();
    }
    let trace = batcher.end(A).unwrap();

    assert_eq!(expected_batches, 6);
    assert_eq!(batcher.sink().segments_for(A), chain(&samples, offset));
    assert_eq!(trace.points, samples);
    assert_eq!(trace.drawn_segments, samples.len() - 1);
    assert_eq!(trace.dropped_segments, 0);
}

#[test]
fn interleaved_pointers_keep_their_own_segments() {
    let mut batcher = make_batcher();
    batcher.set_release_policy(ReleasePolicy::KeepContent);
    batcher.start(A, pt(0.0, 0.0), screen());
    batcher.start(B, pt(100.0, 100.0), screen());

    let a_samples = [pt(0.0, 0.0), pt(1.0, 0.0), pt(2.0, 0.0), pt(3.0, 0.0)];
    let b_samples = [pt(100.0, 100.0), pt(100.0, 101.0), pt(100.0, 102.0)];
    batcher.extend(A, &a_samples[1..2]);
    batcher.extend(B, &b_samples[1..2]);
    batcher.extend(A, &a_samples[2..3]);
    batcher.tick();
    batcher.extend(B, &b_samples[2..3]);
    batcher.extend(A, &a_samples[3..4]);

    // Releasing B must not withdraw A's frame.
    batcher.end(B);
    assert_eq!(batcher.scheduler().pending_for(A), 1);
    batcher.tick();

    assert_eq!(batcher.sink().segments_for(A), chain(&a_samples, Vec2::ZERO));
    assert_eq!(
        batcher.sink().segments_for(B),
        chain(&b_samples[..2], Vec2::ZERO)
    );
}

// ─── Surface clearing ───────────────────────────────────────────────────

#[test]
fn geometry_change_clears_drawn_strokes() {
    let mut batcher = make_batcher();
    batcher.start(A, pt(0.0, 0.0), screen());
    batcher.extend(A, &[pt(4.0, 4.0)]);
    batcher.tick();
    assert!(!batcher.sink().is_blank());

    batcher.on_geometry_changed(SurfaceGeometry::new(1024.0, 768.0, 2.0));
    assert!(batcher.sink().is_blank());
    assert_eq!(batcher.sink().geometry().backing_size(), (2048, 1536));
    // The stroke itself survives the resize.
    assert!(batcher.is_active(A));
}

#[test]
fn pending_segments_land_on_resized_surface() {
    let mut batcher = make_batcher();
    let shifted = Rect::new(10.0, 20.0, 810.0, 620.0);
    batcher.start(A, pt(10.0, 20.0), shifted);
    batcher.extend(A, &[pt(14.0, 24.0)]);

    batcher.on_geometry_changed(SurfaceGeometry::new(400.0, 300.0, 2.0));
    assert!(batcher.sink().is_blank());
    assert_eq!(batcher.tick(), 1);

    // Offset fixed at pointer-down (scale 1), not recomputed for scale 2.
    assert_eq!(
        batcher.sink().visible(),
        &[Line::new(pt(0.0, 0.0), pt(4.0, 4.0))]
    );
}

#[test]
fn last_release_clears_everything() {
    let mut batcher = make_batcher();
    batcher.start(A, pt(0.0, 0.0), screen());
    batcher.start(B, pt(10.0, 0.0), screen());
    batcher.extend(A, &[pt(0.0, 5.0)]);
    batcher.extend(B, &[pt(10.0, 5.0)]);
    batcher.tick();

    batcher.end(A);
    assert_eq!(
        batcher.sink().visible(),
        &[
            Line::new(pt(0.0, 0.0), pt(0.0, 5.0)),
            Line::new(pt(10.0, 0.0), pt(10.0, 5.0)),
        ],
        "B still drawing: nothing is erased yet"
    );

    batcher.end(B);
    assert!(batcher.sink().is_blank());
}

#[test]
fn keep_content_policy_leaves_strokes() {
    let mut batcher = make_batcher();
    batcher.set_release_policy(ReleasePolicy::KeepContent);
    batcher.start(A, pt(0.0, 0.0), screen());
    batcher.extend(A, &[pt(0.0, 5.0)]);
    batcher.tick();
    batcher.end(A);
    assert_eq!(batcher.sink().visible().len(), 1);
}

#[test]
fn active_pointers_are_sorted() {
    let mut batcher = make_batcher();
    batcher.start(PointerId(7), pt(0.0, 0.0), screen());
    batcher.start(PointerId(3), pt(0.0, 0.0), screen());
    assert_eq!(batcher.active_pointers(), vec![PointerId(3), PointerId(7)]);
}
