//! Stroke batches → Vello drawing commands.
//!
//! Each flush batch becomes one `BezPath` of disjoint `MoveTo`/`LineTo`
//! pairs, stroked once. Segment coordinates are in backing pixels; the
//! device-scale transform is applied on top, matching how a 2D canvas
//! context is scaled after a resize.

use hw_core::config::{LineCap, LineJoin, Rgba, StrokeStyle};
use hw_core::{RenderSink, SegmentBatch, SurfaceGeometry};
use kurbo::{Affine, BezPath, Cap, Join, Line, Stroke as KurboStroke};
use peniko::Color;
use vello::Scene;

/// A `RenderSink` that records strokes into a retained Vello scene.
pub struct SceneSink {
    scene: Scene,
    stroke: KurboStroke,
    color: Color,
    transform: Affine,
    geometry: SurfaceGeometry,
    batch_count: usize,
}

impl Default for SceneSink {
    fn default() -> Self {
        Self::new(StrokeStyle::default())
    }
}

impl SceneSink {
    pub fn new(style: StrokeStyle) -> Self {
        Self {
            scene: Scene::new(),
            stroke: map_stroke(&style),
            color: map_color(style.color),
            transform: Affine::IDENTITY,
            geometry: SurfaceGeometry::default(),
            batch_count: 0,
        }
    }

    /// The scene to hand to `vello::Renderer::render_to_texture`.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn geometry(&self) -> SurfaceGeometry {
        self.geometry
    }

    /// Transform applied to every batch.
    pub fn transform(&self) -> Affine {
        self.transform
    }

    /// Batches stroked since the last clear or resize.
    pub fn batch_count(&self) -> usize {
        self.batch_count
    }

    /// Change the style used for batches drawn from now on.
    pub fn set_style(&mut self, style: &StrokeStyle) {
        self.stroke = map_stroke(style);
        self.color = map_color(style.color);
    }
}

impl RenderSink for SceneSink {
    fn draw_segments(&mut self, batch: &SegmentBatch<'_>) {
        if batch.is_empty() {
            return;
        }
        let path = segments_to_path(batch.segments);
        self.scene
            .stroke(&self.stroke, self.transform, self.color, None, &path);
        self.batch_count += 1;
        log::trace!(
            "stroke {}: {} segments in scene, dirty {:?}",
            batch.pointer,
            batch.segments.len(),
            batch.bounds
        );
    }

    fn resize(&mut self, geometry: &SurfaceGeometry) {
        self.geometry = *geometry;
        self.transform = Affine::scale(geometry.scale);
        self.scene.reset();
        self.batch_count = 0;
    }

    fn clear(&mut self) {
        self.scene.reset();
        self.batch_count = 0;
    }
}

/// One subpath per segment; consecutive segments are not joined.
pub fn segments_to_path(segments: &[Line]) -> BezPath {
    let mut path = BezPath::new();
    for segment in segments {
        path.move_to(segment.p0);
        path.line_to(segment.p1);
    }
    path
}

// ─── Style mapping ───────────────────────────────────────────────────────────

fn map_stroke(style: &StrokeStyle) -> KurboStroke {
    let cap = match style.cap {
        LineCap::Butt => Cap::Butt,
        LineCap::Round => Cap::Round,
        LineCap::Square => Cap::Square,
    };
    KurboStroke {
        width: style.width,
        join: match style.join {
            LineJoin::Miter => Join::Miter,
            LineJoin::Round => Join::Round,
            LineJoin::Bevel => Join::Bevel,
        },
        start_cap: cap,
        end_cap: cap,
        ..Default::default()
    }
}

fn map_color(c: Rgba) -> Color {
    Color::from_rgba8(c.r, c.g, c.b, c.a)
}
