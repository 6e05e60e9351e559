//! Drawing surface contract.

use crate::geometry::SurfaceGeometry;
use crate::input::PointerId;
use kurbo::{Line, Rect};

/// One flush worth of segments for a single pointer.
///
/// Segments are in backing-pixel coordinates and ordered as sampled. A sink
/// should issue the whole batch as one path.
#[derive(Debug, Clone, Copy)]
pub struct SegmentBatch<'a> {
    pub pointer: PointerId,
    pub segments: &'a [Line],
    /// Smallest rectangle containing every segment endpoint.
    pub bounds: Rect,
}

impl SegmentBatch<'_> {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// A surface the batcher can draw onto.
pub trait RenderSink {
    /// Stroke every segment of the batch in a single drawing operation.
    fn draw_segments(&mut self, batch: &SegmentBatch<'_>);

    /// Reset the backing store to `geometry`, reapply the scale transform
    /// and discard all pixels.
    fn resize(&mut self, geometry: &SurfaceGeometry);

    /// Discard all pixels, keeping the geometry.
    fn clear(&mut self);

    /// `true` when the surface could not provide a drawing context and every
    /// operation above is silently skipped.
    fn is_degraded(&self) -> bool {
        false
    }
}

/// A batch as it reached a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBatch {
    pub pointer: PointerId,
    pub segments: Vec<Line>,
    /// Dirty rectangle the batcher reported for this flush.
    pub bounds: Rect,
}

/// In-memory sink that remembers what was drawn.
///
/// `batches` is the full draw-call history; `visible` is what the surface
/// would currently show, emptied by `clear` and `resize`.
#[derive(Debug, Default)]
pub struct RecordingSink {
    batches: Vec<RecordedBatch>,
    visible: Vec<Line>,
    geometry: SurfaceGeometry,
    clears: usize,
    degraded: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose drawing context is missing: nothing is ever recorded.
    pub fn degraded() -> Self {
        Self {
            degraded: true,
            ..Self::default()
        }
    }

    pub fn batches(&self) -> &[RecordedBatch] {
        &self.batches
    }

    pub fn visible(&self) -> &[Line] {
        &self.visible
    }

    pub fn is_blank(&self) -> bool {
        self.visible.is_empty()
    }

    pub fn geometry(&self) -> SurfaceGeometry {
        self.geometry
    }

    /// Number of times pixel content was discarded, by clear or resize.
    pub fn clear_count(&self) -> usize {
        self.clears
    }

    /// Every segment drawn for `pointer`, across all batches, in order.
    pub fn segments_for(&self, pointer: PointerId) -> Vec<Line> {
        self.batches
            .iter()
            .filter(|batch| batch.pointer == pointer)
            .flat_map(|batch| batch.segments.iter().copied())
            .collect()
    }
}

impl RenderSink for RecordingSink {
    fn draw_segments(&mut self, batch: &SegmentBatch<'_>) {
        if self.degraded || batch.is_empty() {
            return;
        }
        self.visible.extend_from_slice(batch.segments);
        self.batches.push(RecordedBatch {
            pointer: batch.pointer,
            segments: batch.segments.to_vec(),
            bounds: batch.bounds,
        });
    }

    fn resize(&mut self, geometry: &SurfaceGeometry) {
        self.geometry = *geometry;
        if self.degraded {
            return;
        }
        self.visible.clear();
        self.clears += 1;
    }

    fn clear(&mut self) {
        if self.degraded {
            return;
        }
        self.visible.clear();
        self.clears += 1;
    }

    fn is_degraded(&self) -> bool {
        self.degraded
    }
}

/// Bounding box of a run of segments; `None` when there are none.
pub fn segment_bounds(segments: &[Line]) -> Option<Rect> {
    let mut iter = segments.iter();
    let first = iter.next()?;
    let start = Rect::from_points(first.p0, first.p1);
    Some(iter.fold(start, |acc, line| {
        acc.union_pt(line.p0).union_pt(line.p1)
    }))
}
