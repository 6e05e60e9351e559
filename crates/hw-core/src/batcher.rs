//! Frame-aligned stroke batching.
//!
//! Move events only accumulate segments and (re)arm one frame request per
//! pointer. Drawing happens when the host fires that frame, so a pen
//! reporting at 240 Hz still costs one draw call per pointer per frame.
//!
//! ## Lifecycle per pointer
//!
//! | Event         | Absent            | Active                                   |
//! |---------------|-------------------|------------------------------------------|
//! | start         | create session    | ignored                                  |
//! | move          | ignored           | append segments, cancel + request frame  |
//! | frame fires   | ignored           | draw pending batch (if handle current)   |
//! | end / cancel  | ignored           | cancel frame, drop pending, return trace |

use crate::config::{CanvasConfig, ReleasePolicy};
use crate::geometry::{CoordinateMapper, SurfaceGeometry};
use crate::input::{InputEvent, PointerId};
use crate::scheduler::{FrameHandle, FrameQueue, Scheduler};
use crate::session::{PointerSession, SessionPool, StrokeTrace};
use crate::sink::{RenderSink, SegmentBatch};
use kurbo::{Point, Rect};

/// Routes pointer events to per-pointer sessions and flushes them to a
/// [`RenderSink`] at most once per frame.
pub struct StrokeBatcher<S, Q> {
    sink: S,
    scheduler: Q,
    sessions: SessionPool,
    geometry: SurfaceGeometry,
    release_policy: ReleasePolicy,
}

impl<S: RenderSink, Q: Scheduler> StrokeBatcher<S, Q> {
    /// Create a batcher with default geometry. The sink is sized
    /// immediately.
    pub fn new(sink: S, scheduler: Q) -> Self {
        Self::with_config(sink, scheduler, &CanvasConfig::default())
    }

    pub fn with_config(mut sink: S, scheduler: Q, config: &CanvasConfig) -> Self {
        sink.resize(&config.geometry);
        if sink.is_degraded() {
            log::warn!("drawing surface has no 2D context; strokes will not be rendered");
        }
        Self {
            sink,
            scheduler,
            sessions: SessionPool::new(),
            geometry: config.geometry,
            release_policy: config.release_policy,
        }
    }

    pub fn geometry(&self) -> SurfaceGeometry {
        self.geometry
    }

    pub fn release_policy(&self) -> ReleasePolicy {
        self.release_policy
    }

    pub fn set_release_policy(&mut self, policy: ReleasePolicy) {
        self.release_policy = policy;
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn scheduler(&self) -> &Q {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut Q {
        &mut self.scheduler
    }

    pub fn session(&self, pointer: PointerId) -> Option<&PointerSession> {
        self.sessions.get(pointer)
    }

    pub fn is_active(&self, pointer: PointerId) -> bool {
        self.sessions.contains(pointer)
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn active_pointers(&self) -> Vec<PointerId> {
        let mut pointers: Vec<_> = self.sessions.pointers().collect();
        pointers.sort();
        pointers
    }

    pub fn is_degraded(&self) -> bool {
        self.sink.is_degraded()
    }

    /// Apply new surface geometry. The surface is resized and every drawn
    /// stroke is lost. Active strokes keep the origin offset they started
    /// with.
    pub fn on_geometry_changed(&mut self, geometry: SurfaceGeometry) {
        debug_assert!(geometry.is_valid(), "invalid geometry {geometry:?}");
        log::debug!("geometry {:?} -> {:?}", self.geometry, geometry);
        self.geometry = geometry;
        self.sink.resize(&geometry);
    }

    /// Wipe the surface without touching geometry or active strokes.
    pub fn clear(&mut self) {
        self.sink.clear();
    }

    /// Begin a stroke for `pointer` at `position` (viewport coordinates).
    ///
    /// `bounds` is the surface's current on-screen rectangle; it fixes the
    /// stroke's origin offset. Returns `false` if the pointer is already
    /// drawing.
    pub fn start(&mut self, pointer: PointerId, position: Point, bounds: Rect) -> bool {
        let mapper = CoordinateMapper::for_geometry(bounds, &self.geometry);
        let offset = mapper.origin_offset();
        match self.sessions.insert(pointer, position, offset) {
            Some(_) => {
                log::debug!("stroke {pointer} start at {position:?}, offset {offset:?}");
                true
            }
            None => {
                log::trace!("stroke {pointer} already active; start ignored");
                false
            }
        }
    }

    /// Extend the stroke of `pointer` with `samples` (viewport coordinates,
    /// in delivery order) and arm a flush for the next frame, replacing any
    /// flush already armed for this pointer.
    ///
    /// Returns `false` when the pointer has no active stroke.
    pub fn extend(&mut self, pointer: PointerId, samples: &[Point]) -> bool {
        let Some(session) = self.sessions.get_mut(pointer) else {
            log::trace!("move for inactive pointer {pointer} ignored");
            return false;
        };
        if samples.is_empty() {
            return true;
        }
        session.append_samples(samples);

        if let Some(previous) = session.take_scheduled() {
            self.scheduler.cancel_frame(previous);
        }
        let handle = self.scheduler.request_frame(pointer);
        session.set_scheduled(handle);
        log::trace!(
            "stroke {pointer}: +{} samples, {} pending, armed {handle:?}",
            samples.len(),
            session.pending().len()
        );
        true
    }

    /// Finish the stroke of `pointer`. Segments not yet flushed are
    /// discarded. Returns `None` for an unknown pointer.
    pub fn end(&mut self, pointer: PointerId) -> Option<StrokeTrace> {
        let Some(session) = self.sessions.get_mut(pointer) else {
            log::trace!("release for inactive pointer {pointer} ignored");
            return None;
        };
        if let Some(handle) = session.take_scheduled() {
            self.scheduler.cancel_frame(handle);
        }
        let trace = self.sessions.remove(pointer)?;
        log::debug!(
            "stroke {pointer} end: {} points, {} drawn, {} dropped",
            trace.points.len(),
            trace.drawn_segments,
            trace.dropped_segments
        );

        if self.sessions.is_empty() && self.release_policy == ReleasePolicy::ClearSurface {
            log::debug!("last pointer released; clearing surface");
            self.sink.clear();
        }
        Some(trace)
    }

    /// Same as [`end`](Self::end): an interrupted stroke is not rolled back,
    /// only its unflushed tail is dropped.
    pub fn cancel(&mut self, pointer: PointerId) -> Option<StrokeTrace> {
        self.end(pointer)
    }

    /// Dispatch a normalized input event.
    ///
    /// `bounds` is only evaluated for pointer-down, since reading layout can
    /// be expensive on the host. Returns the finished stroke for
    /// up/cancel events.
    pub fn handle(&mut self, event: &InputEvent, bounds: impl FnOnce() -> Rect) -> Option<StrokeTrace> {
        match event {
            InputEvent::PointerDown { pointer, position } => {
                self.start(*pointer, *position, bounds());
                None
            }
            InputEvent::PointerMove { pointer, .. } => {
                self.extend(*pointer, event.samples());
                None
            }
            InputEvent::PointerUp { pointer, .. } => self.end(*pointer),
            InputEvent::PointerCancel { pointer, .. } => self.cancel(*pointer),
        }
    }

    /// Frame callback for `pointer`. Draws the pending batch if `handle` is
    /// still the one armed for that pointer; a superseded, cancelled or
    /// unknown handle does nothing. Returns whether anything was drawn.
    pub fn run_frame(&mut self, pointer: PointerId, handle: FrameHandle) -> bool {
        let Some(session) = self.sessions.get_mut(pointer) else {
            log::trace!("{handle:?} fired after {pointer} ended");
            return false;
        };
        if session.scheduled() != Some(handle) {
            log::trace!("{handle:?} for {pointer} superseded");
            return false;
        }
        session.take_scheduled();
        if session.pending().is_empty() {
            return false;
        }

        let batch = SegmentBatch {
            pointer,
            segments: session.pending(),
            bounds: session.pending_bounds().unwrap_or(Rect::ZERO),
        };
        log::trace!("flush {pointer}: {} segments in {:?}", batch.segments.len(), batch.bounds);
        self.sink.draw_segments(&batch);
        session.mark_flushed();
        true
    }
}

impl<S: RenderSink> StrokeBatcher<S, FrameQueue> {
    /// Fire every due frame of the headless queue. Returns the number of
    /// batches drawn.
    pub fn tick(&mut self) -> usize {
        let due = self.scheduler.take_due();
        due.into_iter()
            .filter(|&(pointer, handle)| self.run_frame(pointer, handle))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;
    use kurbo::{Line, Vec2};
    use pretty_assertions::assert_eq;

    const P1: PointerId = PointerId(1);
    const P2: PointerId = PointerId(2);

    fn pt(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn seg(x0: f64, y0: f64, x1: f64, y1: f64) -> Line {
        Line::new(pt(x0, y0), pt(x1, y1))
    }

    fn at_origin() -> Rect {
        Rect::new(0.0, 0.0, 800.0, 600.0)
    }

    fn batcher() -> StrokeBatcher<RecordingSink, FrameQueue> {
        StrokeBatcher::new(RecordingSink::new(), FrameQueue::new())
    }

    #[test]
    fn construction_sizes_the_sink() {
        let b = batcher();
        assert_eq!(b.sink().geometry(), SurfaceGeometry::default());
        assert_eq!(b.active_count(), 0);
    }

    #[test]
    fn single_segment_stroke() {
        let mut b = batcher();
        b.start(P1, pt(10.0, 10.0), at_origin());
        b.extend(P1, &[pt(20.0, 20.0)]);
        assert_eq!(b.tick(), 1);
        let trace = b.end(P1).unwrap();

        assert_eq!(b.sink().segments_for(P1), vec![seg(10.0, 10.0, 20.0, 20.0)]);
        assert_eq!(trace.points, vec![pt(10.0, 10.0), pt(20.0, 20.0)]);
        assert_eq!(trace.drawn_segments, 1);
    }

    #[test]
    fn moves_before_a_frame_share_one_flush() {
        let mut b = batcher();
        b.start(P1, pt(0.0, 0.0), at_origin());
        b.extend(P1, &[pt(5.0, 5.0)]);
        b.extend(P1, &[pt(9.0, 9.0)]);

        assert_eq!(b.scheduler().pending_for(P1), 1);
        assert_eq!(b.scheduler().cancelled(), 1);
        assert_eq!(b.tick(), 1);
        assert_eq!(
            b.sink().batches()[0].segments,
            vec![seg(0.0, 0.0, 5.0, 5.0), seg(5.0, 5.0, 9.0, 9.0)]
        );
    }

    #[test]
    fn flush_reports_dirty_rect_of_its_own_segments() {
        let mut b = batcher();
        b.set_release_policy(ReleasePolicy::KeepContent);
        b.start(P1, pt(0.0, 0.0), at_origin());
        b.extend(P1, &[pt(4.0, 2.0)]);
        b.tick();
        b.extend(P1, &[pt(1.0, 8.0)]);
        b.tick();

        let bounds: Vec<_> = b.sink().batches().iter().map(|batch| batch.bounds).collect();
        assert_eq!(
            bounds,
            vec![Rect::new(0.0, 0.0, 4.0, 2.0), Rect::new(1.0, 2.0, 4.0, 8.0)]
        );
    }

    #[test]
    fn superseded_handle_is_a_no_op() {
        let mut b = batcher();
        b.start(P1, pt(0.0, 0.0), at_origin());
        b.extend(P1, &[pt(1.0, 0.0)]);
        let stale = b.session(P1).unwrap().scheduled().unwrap();
        b.extend(P1, &[pt(2.0, 0.0)]);

        assert!(!b.run_frame(P1, stale));
        assert!(b.sink().batches().is_empty());
        assert_eq!(b.session(P1).unwrap().pending().len(), 2);
    }

    #[test]
    fn release_drops_unflushed_segments() {
        let mut b = batcher();
        b.set_release_policy(ReleasePolicy::KeepContent);
        b.start(P1, pt(0.0, 0.0), at_origin());
        b.extend(P1, &[pt(1.0, 1.0)]);
        b.tick();
        b.extend(P1, &[pt(2.0, 2.0)]);
        let trace = b.end(P1).unwrap();

        assert_eq!(trace.dropped_segments, 1);
        assert!(b.scheduler().is_empty());
        assert_eq!(b.tick(), 0);
        assert_eq!(b.sink().segments_for(P1), vec![seg(0.0, 0.0, 1.0, 1.0)]);
    }

    #[test]
    fn unknown_pointer_events_are_ignored() {
        let mut b = batcher();
        assert!(!b.extend(P2, &[pt(1.0, 1.0)]));
        assert!(b.end(P2).is_none());
        assert!(b.cancel(P2).is_none());
        assert!(!b.run_frame(P2, FrameHandle(42)));
        assert!(b.scheduler().is_empty());
        assert_eq!(b.sink().clear_count(), 1, "only the initial resize");
    }

    #[test]
    fn second_start_keeps_the_running_stroke() {
        let mut b = batcher();
        assert!(b.start(P1, pt(0.0, 0.0), at_origin()));
        assert!(!b.start(P1, pt(50.0, 50.0), at_origin()));
        assert_eq!(b.session(P1).unwrap().last_position(), pt(0.0, 0.0));
    }

    #[test]
    fn offset_follows_surface_position() {
        let mut b = batcher();
        // Surface placed at (100, 50) on screen, displayed at backing size.
        b.start(P1, pt(110.0, 60.0), Rect::new(100.0, 50.0, 900.0, 650.0));
        assert_eq!(b.session(P1).unwrap().origin_offset(), Vec2::new(-100.0, -50.0));
        b.extend(P1, &[pt(120.0, 70.0)]);
        b.tick();
        assert_eq!(b.sink().visible(), &[seg(10.0, 10.0, 20.0, 20.0)]);
    }

    #[test]
    fn handle_dispatches_events() {
        let mut b = batcher();
        let mut bounds_reads = 0;
        b.handle(&InputEvent::down(P1, 1.0, 1.0), || {
            bounds_reads += 1;
            at_origin()
        });
        b.handle(&InputEvent::moved(P1, 2.0, 2.0), || unreachable!());
        b.tick();
        let trace = b.handle(&InputEvent::up(P1, 2.0, 2.0), || unreachable!());

        assert_eq!(bounds_reads, 1);
        assert_eq!(trace.unwrap().points, vec![pt(1.0, 1.0), pt(2.0, 2.0)]);
    }

    #[test]
    fn degraded_sink_still_tracks_strokes() {
        let mut b = StrokeBatcher::new(RecordingSink::degraded(), FrameQueue::new());
        assert!(b.is_degraded());
        b.start(P1, pt(0.0, 0.0), at_origin());
        b.extend(P1, &[pt(3.0, 4.0)]);
        b.tick();
        let trace = b.end(P1).unwrap();
        assert_eq!(trace.points.len(), 2);
        assert!(b.sink().batches().is_empty());
    }
}
