//! Handwriting canvas core: multi-pointer stroke capture with frame-aligned
//! rendering.
//!
//! Platform-free. Hosts feed pointer events into a [`StrokeBatcher`], supply
//! a [`Scheduler`] that fires once per display frame, and a [`RenderSink`]
//! that puts line segments on a surface.

pub mod batcher;
pub mod config;
pub mod geometry;
pub mod input;
pub mod scheduler;
pub mod session;
pub mod sink;

pub use batcher::StrokeBatcher;
pub use config::{CanvasConfig, ConfigError, LineCap, LineJoin, ReleasePolicy, Rgba, StrokeStyle};
pub use geometry::{CoordinateMapper, SurfaceGeometry};
pub use input::{InputEvent, PointerId};
pub use scheduler::{FrameHandle, FrameQueue, Scheduler};
pub use session::{PointerSession, SessionPool, StrokeTrace};
pub use sink::{RecordingSink, RenderSink, SegmentBatch};

// Re-export kurbo geometry types so hosts don't need a direct dependency
pub use kurbo::{Line, Point, Rect, Vec2};
