//! Surface geometry and screen → surface coordinate mapping.
//!
//! Pointer events arrive in viewport (client) coordinates. Strokes are drawn
//! in backing-pixel coordinates of the surface, so every stroke carries a
//! fixed origin offset derived from where the surface sat on screen when the
//! stroke started.

use kurbo::{Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Logical size and device scale of the drawing surface.
///
/// The physical backing store is `logical × scale`, truncated toward zero
/// (the same rule the HTML canvas applies to its integer `width`/`height`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SurfaceGeometry {
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

impl Default for SurfaceGeometry {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            scale: 1.0,
        }
    }
}

impl SurfaceGeometry {
    pub const fn new(width: f64, height: f64, scale: f64) -> Self {
        Self {
            width,
            height,
            scale,
        }
    }

    /// Backing store dimensions in physical pixels.
    pub fn backing_size(&self) -> (u32, u32) {
        (
            (self.width * self.scale) as u32,
            (self.height * self.scale) as u32,
        )
    }

    /// Whether the values can be handed to a surface as-is.
    pub fn is_valid(&self) -> bool {
        self.width.is_finite()
            && self.height.is_finite()
            && self.scale.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
            && self.scale > 0.0
    }
}

/// Maps viewport coordinates onto the surface's backing pixels.
///
/// Built once per stroke from the surface's on-screen bounding rectangle and
/// its backing size. The result is not refreshed while the
/// stroke is in progress: if the page scrolls mid-stroke, the stroke keeps
/// the offset it started with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    scale: Vec2,
    offset: Vec2,
}

impl CoordinateMapper {
    /// `bounds` is the displayed rectangle in viewport coordinates,
    /// `backing` the surface size in physical pixels.
    pub fn new(bounds: Rect, backing: (u32, u32)) -> Self {
        let scale_x = axis_scale(backing.0, bounds.width());
        let scale_y = axis_scale(backing.1, bounds.height());
        Self {
            scale: Vec2::new(scale_x, scale_y),
            offset: Vec2::new(-bounds.x0 * scale_x, -bounds.y0 * scale_y),
        }
    }

    /// Convenience for the common case of mapping against a known geometry.
    pub fn for_geometry(bounds: Rect, geometry: &SurfaceGeometry) -> Self {
        Self::new(bounds, geometry.backing_size())
    }

    /// Backing pixels per displayed pixel on each axis.
    pub fn scale(&self) -> Vec2 {
        self.scale
    }

    /// Translation added to every raw coordinate of the stroke.
    pub fn origin_offset(&self) -> Vec2 {
        self.offset
    }
}

// A collapsed element (display: none, zero-sized parent) reports a zero
// displayed size; fall back to identity instead of dividing by zero.
fn axis_scale(backing: u32, displayed: f64) -> f64 {
    if displayed > 0.0 && displayed.is_finite() {
        backing as f64 / displayed
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backing_size_truncates() {
        let geometry = SurfaceGeometry::new(100.5, 50.0, 1.5);
        assert_eq!(geometry.backing_size(), (150, 75));
    }

    #[test]
    fn default_geometry_is_800_by_600() {
        let geometry = SurfaceGeometry::default();
        assert_eq!(geometry.backing_size(), (800, 600));
        assert!(geometry.is_valid());
    }

    #[test]
    fn rejects_non_finite_and_zero_scale() {
        assert!(!SurfaceGeometry::new(f64::NAN, 10.0, 1.0).is_valid());
        assert!(!SurfaceGeometry::new(10.0, -1.0, 1.0).is_valid());
        assert!(!SurfaceGeometry::new(10.0, 10.0, 0.0).is_valid());
        assert!(SurfaceGeometry::new(0.0, 0.0, 2.0).is_valid());
    }

    #[test]
    fn offset_at_origin_is_zero() {
        let mapper = CoordinateMapper::new(Rect::new(0.0, 0.0, 800.0, 600.0), (800, 600));
        assert_eq!(mapper.origin_offset(), Vec2::ZERO);
        assert_eq!(mapper.scale(), Vec2::new(1.0, 1.0));
    }

    #[test]
    fn offset_scales_with_backing_resolution() {
        // 400×300 displayed, 800×600 backing, placed at (10, 20).
        let bounds = Rect::new(10.0, 20.0, 410.0, 320.0);
        let mapper = CoordinateMapper::new(bounds, (800, 600));
        assert_eq!(mapper.scale(), Vec2::new(2.0, 2.0));
        assert_eq!(mapper.origin_offset(), Vec2::new(-20.0, -40.0));
    }

    #[test]
    fn collapsed_bounds_fall_back_to_identity_scale() {
        let mapper = CoordinateMapper::new(Rect::new(5.0, 7.0, 5.0, 7.0), (800, 600));
        assert_eq!(mapper.scale(), Vec2::new(1.0, 1.0));
        assert_eq!(mapper.origin_offset(), Vec2::new(-5.0, -7.0));
    }
}
