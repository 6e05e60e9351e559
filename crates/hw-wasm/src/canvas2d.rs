//! Canvas2D render sink.
//!
//! Draws flush batches onto an HTML `<canvas>` via
//! `CanvasRenderingContext2d`. If the element cannot hand out a 2D context
//! the sink stays usable but every drawing call is skipped.

use hw_core::{Rect, RenderSink, SegmentBatch, StrokeStyle, SurfaceGeometry};
use hw_core::config::{LineCap, LineJoin};
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

pub struct Canvas2dSink {
    canvas: HtmlCanvasElement,
    ctx: Option<CanvasRenderingContext2d>,
    style: StrokeStyle,
    stroke_color: String,
}

impl Canvas2dSink {
    pub fn new(canvas: HtmlCanvasElement, style: StrokeStyle) -> Self {
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()
            .and_then(|obj| obj.dyn_into::<CanvasRenderingContext2d>().ok());
        Self {
            canvas,
            ctx,
            stroke_color: style.color.to_css(),
            style,
        }
    }

    pub fn set_style(&mut self, style: StrokeStyle) {
        self.stroke_color = style.color.to_css();
        self.style = style;
    }

    fn apply_style(&self, ctx: &CanvasRenderingContext2d) {
        ctx.set_stroke_style_str(&self.stroke_color);
        ctx.set_line_width(self.style.width);
        ctx.set_line_cap(match self.style.cap {
            LineCap::Butt => "butt",
            LineCap::Round => "round",
            LineCap::Square => "square",
        });
        ctx.set_line_join(match self.style.join {
            LineJoin::Miter => "miter",
            LineJoin::Round => "round",
            LineJoin::Bevel => "bevel",
        });
    }
}

/// The element's on-screen rectangle in viewport coordinates.
pub fn bounding_rect(canvas: &HtmlCanvasElement) -> Rect {
    let r = canvas.get_bounding_client_rect();
    Rect::new(r.left(), r.top(), r.right(), r.bottom())
}

impl RenderSink for Canvas2dSink {
    fn draw_segments(&mut self, batch: &SegmentBatch<'_>) {
        let Some(ctx) = &self.ctx else {
            return;
        };
        if batch.is_empty() {
            return;
        }

        ctx.save();
        self.apply_style(ctx);
        ctx.begin_path();
        for segment in batch.segments {
            ctx.move_to(segment.p0.x, segment.p0.y);
            ctx.line_to(segment.p1.x, segment.p1.y);
        }
        ctx.stroke();
        ctx.restore();
    }

    fn resize(&mut self, geometry: &SurfaceGeometry) {
        let (width, height) = geometry.backing_size();
        // Assigning width/height wipes the bitmap and the context state.
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        if let Some(ctx) = &self.ctx {
            let _ = ctx.reset_transform();
            let _ = ctx.scale(geometry.scale, geometry.scale);
        }
    }

    fn clear(&mut self) {
        if let Some(ctx) = &self.ctx {
            ctx.clear_rect(
                0.0,
                0.0,
                self.canvas.width() as f64,
                self.canvas.height() as f64,
            );
        }
    }

    fn is_degraded(&self) -> bool {
        self.ctx.is_none()
    }
}
