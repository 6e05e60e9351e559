//! Vello renderer for handwriting strokes.
//!
//! `SceneSink` implements `hw_core::RenderSink` by accumulating flush
//! batches into a retained `vello::Scene`. The host presents that scene with
//! its own `vello::Renderer` each frame.

pub mod paint;

pub use paint::{SceneSink, segments_to_path};
