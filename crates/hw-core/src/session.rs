//! Per-pointer stroke state and the pool that holds it.
//!
//! A `PointerSession` lives from pointer-down to pointer-up/cancel. Sessions
//! are kept in a slot pool indexed by pointer id: ending a stroke frees its
//! slot (and keeps the pending-segment buffer's allocation) so rapid
//! tap-tap-tap input does not churn the allocator.

use crate::input::PointerId;
use crate::scheduler::FrameHandle;
use crate::sink::segment_bounds;
use kurbo::{Line, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// State of one in-progress stroke.
#[derive(Debug, Clone)]
pub struct PointerSession {
    pointer: PointerId,
    origin_offset: Vec2,
    last_position: Point,
    /// Segments sampled since the last flush, already offset.
    pending: Vec<Line>,
    /// Raw (un-offset) samples, including the start point.
    trace: Vec<Point>,
    scheduled: Option<FrameHandle>,
    /// Extent of every segment emitted for this stroke, offset.
    bounds: Option<Rect>,
    drawn: usize,
}

impl PointerSession {
    pub fn new(pointer: PointerId, position: Point, origin_offset: Vec2) -> Self {
        Self {
            pointer,
            origin_offset,
            last_position: position,
            pending: Vec::new(),
            trace: vec![position],
            scheduled: None,
            bounds: None,
            drawn: 0,
        }
    }

    /// Reinitialize a freed slot for a new stroke, reusing its buffers.
    fn restart(&mut self, pointer: PointerId, position: Point, origin_offset: Vec2) {
        self.pointer = pointer;
        self.origin_offset = origin_offset;
        self.last_position = position;
        self.pending.clear();
        self.trace.clear();
        self.trace.push(position);
        self.scheduled = None;
        self.bounds = None;
        self.drawn = 0;
    }

    pub fn pointer(&self) -> PointerId {
        self.pointer
    }

    pub fn origin_offset(&self) -> Vec2 {
        self.origin_offset
    }

    pub fn last_position(&self) -> Point {
        self.last_position
    }

    pub fn pending(&self) -> &[Line] {
        &self.pending
    }

    pub fn trace(&self) -> &[Point] {
        &self.trace
    }

    pub fn scheduled(&self) -> Option<FrameHandle> {
        self.scheduled
    }

    /// Bounding box of the stroke so far, in backing pixels.
    pub fn bounds(&self) -> Option<Rect> {
        self.bounds
    }

    /// Append one segment per sample, chaining from the last position.
    pub fn append_samples(&mut self, samples: &[Point]) {
        for &sample in samples {
            let segment = Line::new(
                self.last_position + self.origin_offset,
                sample + self.origin_offset,
            );
            self.bounds = Some(match self.bounds {
                Some(rect) => rect.union_pt(segment.p0).union_pt(segment.p1),
                None => Rect::from_points(segment.p0, segment.p1),
            });
            self.pending.push(segment);
            self.trace.push(sample);
            self.last_position = sample;
        }
    }

    /// Dirty rectangle of the segments waiting for the next flush.
    pub fn pending_bounds(&self) -> Option<Rect> {
        segment_bounds(&self.pending)
    }

    pub(crate) fn set_scheduled(&mut self, handle: FrameHandle) {
        self.scheduled = Some(handle);
    }

    pub(crate) fn take_scheduled(&mut self) -> Option<FrameHandle> {
        self.scheduled.take()
    }

    /// Forget the pending segments after they have been drawn.
    pub(crate) fn mark_flushed(&mut self) {
        self.drawn += self.pending.len();
        self.pending.clear();
    }

    /// Move the stroke result out, leaving the buffers empty for reuse.
    fn finish(&mut self) -> StrokeTrace {
        let dropped = self.pending.len();
        self.pending.clear();
        self.scheduled = None;
        StrokeTrace {
            pointer_id: self.pointer,
            points: std::mem::take(&mut self.trace),
            bounds: self.bounds.take(),
            drawn_segments: self.drawn,
            dropped_segments: dropped,
        }
    }
}

/// What a finished stroke hands back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrokeTrace {
    pub pointer_id: PointerId,
    /// Every raw sample of the stroke, start point first.
    pub points: Vec<Point>,
    /// Extent of the stroke in backing pixels; `None` for a stroke that
    /// never moved.
    pub bounds: Option<Rect>,
    /// Segments that reached the surface.
    pub drawn_segments: usize,
    /// Segments sampled after the last flush and discarded on release.
    pub dropped_segments: usize,
}

#[derive(Debug)]
struct Slot {
    session: PointerSession,
    live: bool,
}

/// Active sessions keyed by pointer id, stored in reusable slots.
#[derive(Debug, Default)]
pub struct SessionPool {
    slots: Vec<Slot>,
    free: Vec<usize>,
    index: HashMap<PointerId, usize>,
}

impl SessionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session for `pointer`. Returns `None` if one is already live.
    pub fn insert(
        &mut self,
        pointer: PointerId,
        position: Point,
        origin_offset: Vec2,
    ) -> Option<&mut PointerSession> {
        if self.index.contains_key(&pointer) {
            return None;
        }
        let slot = match self.free.pop() {
            Some(slot) => {
                let entry = &mut self.slots[slot];
                entry.session.restart(pointer, position, origin_offset);
                entry.live = true;
                slot
            }
            None => {
                self.slots.push(Slot {
                    session: PointerSession::new(pointer, position, origin_offset),
                    live: true,
                });
                self.slots.len() - 1
            }
        };
        self.index.insert(pointer, slot);
        Some(&mut self.slots[slot].session)
    }

    pub fn get(&self, pointer: PointerId) -> Option<&PointerSession> {
        let slot = *self.index.get(&pointer)?;
        Some(&self.slots[slot].session)
    }

    pub fn get_mut(&mut self, pointer: PointerId) -> Option<&mut PointerSession> {
        let slot = *self.index.get(&pointer)?;
        Some(&mut self.slots[slot].session)
    }

    /// End the session for `pointer`, freeing its slot.
    ///
    /// Any scheduled frame must already have been cancelled by the caller;
    /// the handle is discarded here.
    pub fn remove(&mut self, pointer: PointerId) -> Option<StrokeTrace> {
        let slot = self.index.remove(&pointer)?;
        let entry = &mut self.slots[slot];
        entry.live = false;
        self.free.push(slot);
        Some(entry.session.finish())
    }

    pub fn contains(&self, pointer: PointerId) -> bool {
        self.index.contains_key(&pointer)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of slots ever allocated (live + free).
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Ids of every live session, in no particular order.
    pub fn pointers(&self) -> impl Iterator<Item = PointerId> + '_ {
        self.slots
            .iter()
            .filter(|slot| slot.live)
            .map(|slot| slot.session.pointer)
    }
}
