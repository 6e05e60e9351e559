//! WASM bridge for the handwriting canvas. Exposes the Rust stroke engine
//! to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. The host element forwards
//! its pointer events and observed attribute changes; drawing happens on
//! `requestAnimationFrame`.

mod canvas2d;
mod console;
mod events;
mod frame;

use canvas2d::{Canvas2dSink, bounding_rect};
use frame::{FrameCallback, RafScheduler};
use hw_core::config::OBSERVED_ATTRIBUTES;
use hw_core::input::{Coalesced, points_from_flat};
use hw_core::{
    CanvasConfig, FrameHandle, Point, PointerId, ReleasePolicy, StrokeBatcher, StrokeTrace,
    SurfaceGeometry,
};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, PointerEvent};

struct CanvasState {
    batcher: StrokeBatcher<Canvas2dSink, RafScheduler>,
    canvas: HtmlCanvasElement,
    config: CanvasConfig,
}

/// The JS-facing canvas controller.
///
/// Shared with the animation-frame callbacks, hence the `Rc<RefCell<_>>`.
/// Everything runs on the page's main thread.
#[wasm_bindgen]
pub struct HandwritingCanvas {
    state: Rc<RefCell<CanvasState>>,
}

#[wasm_bindgen]
impl HandwritingCanvas {
    /// Attach to `canvas` with the default 800×600 @1× geometry.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self::build(canvas, CanvasConfig::default())
    }

    /// Attach with a JSON `CanvasConfig`. Malformed JSON falls back to the
    /// defaults.
    pub fn with_config_json(canvas: HtmlCanvasElement, json: &str) -> Self {
        let config = CanvasConfig::from_json(json).unwrap_or_else(|err| {
            log::warn!("invalid canvas config, using defaults: {err}");
            CanvasConfig::default()
        });
        Self::build(canvas, config)
    }

    /// Attribute names the host element should observe.
    pub fn observed_attributes() -> js_sys::Array {
        OBSERVED_ATTRIBUTES
            .iter()
            .map(|name| JsValue::from_str(name))
            .collect()
    }

    /// Forward an observed attribute change. Any accepted change resizes
    /// the surface and erases it. Returns `false` if the value was rejected.
    pub fn set_attribute(&self, name: &str, value: &str) -> bool {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        match state.config.set_attribute(name, value) {
            Ok(geometry) => {
                state.batcher.on_geometry_changed(geometry);
                true
            }
            Err(err) => {
                log::warn!("{err}");
                false
            }
        }
    }

    /// Set all geometry at once. Same erase semantics as `set_attribute`.
    pub fn set_geometry(&self, width: f64, height: f64, scale: f64) -> bool {
        let geometry = SurfaceGeometry::new(width, height, scale);
        if !geometry.is_valid() {
            log::warn!("rejected geometry {geometry:?}");
            return false;
        }
        let mut state = self.state.borrow_mut();
        state.config.geometry = geometry;
        state.batcher.on_geometry_changed(geometry);
        true
    }

    /// `true` keeps finished strokes on screen when the last pointer lifts;
    /// `false` (the default) wipes the surface.
    pub fn set_keep_content(&self, keep: bool) {
        let policy = if keep {
            ReleasePolicy::KeepContent
        } else {
            ReleasePolicy::ClearSurface
        };
        let mut state = self.state.borrow_mut();
        state.config.release_policy = policy;
        state.batcher.set_release_policy(policy);
    }

    /// Line width for batches drawn from now on, in surface units.
    pub fn set_line_width(&self, width: f64) -> bool {
        if !(width.is_finite() && width > 0.0) {
            return false;
        }
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.config.stroke.width = width;
        state.batcher.sink_mut().set_style(state.config.stroke);
        true
    }

    /// Feed a DOM `PointerEvent` (`pointerdown`/`move`/`up`/`cancel`).
    ///
    /// Returns the finished stroke as JSON on up/cancel, `undefined`
    /// otherwise.
    pub fn handle_pointer_event(&self, event: &PointerEvent) -> Option<String> {
        let input = events::decode_pointer_event(event)?;
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let canvas = &state.canvas;
        let trace = state.batcher.handle(&input, || bounding_rect(canvas));
        trace.as_ref().and_then(trace_to_json)
    }

    pub fn pointer_down(&self, pointer_id: i32, x: f64, y: f64) -> bool {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        let bounds = bounding_rect(&state.canvas);
        state
            .batcher
            .start(PointerId(pointer_id), Point::new(x, y), bounds)
    }

    /// `coalesced` is a flat `[x0, y0, x1, y1, ...]` list; pass an empty
    /// array when the platform does not coalesce.
    pub fn pointer_move(&self, pointer_id: i32, x: f64, y: f64, coalesced: &[f64]) -> bool {
        let samples = move_samples(x, y, coalesced);
        self.state
            .borrow_mut()
            .batcher
            .extend(PointerId(pointer_id), &samples)
    }

    pub fn pointer_up(&self, pointer_id: i32, _x: f64, _y: f64) -> Option<String> {
        let trace = self.state.borrow_mut().batcher.end(PointerId(pointer_id));
        trace.as_ref().and_then(trace_to_json)
    }

    pub fn pointer_cancel(&self, pointer_id: i32, _x: f64, _y: f64) -> Option<String> {
        let trace = self.state.borrow_mut().batcher.cancel(PointerId(pointer_id));
        trace.as_ref().and_then(trace_to_json)
    }

    pub fn active_pointers(&self) -> Vec<i32> {
        self.state
            .borrow()
            .batcher
            .active_pointers()
            .into_iter()
            .map(|pointer| pointer.0)
            .collect()
    }

    /// Animation frames requested and not yet fired.
    pub fn pending_frames(&self) -> usize {
        self.state.borrow().batcher.scheduler().pending()
    }

    /// `true` when the canvas had no 2D context; input is still tracked
    /// but nothing is drawn.
    pub fn is_degraded(&self) -> bool {
        self.state.borrow().batcher.is_degraded()
    }

    pub fn clear(&self) {
        self.state.borrow_mut().batcher.clear();
    }
}

// ─── Private helpers ─────────────────────────────────────────────────────

impl HandwritingCanvas {
    fn build(canvas: HtmlCanvasElement, config: CanvasConfig) -> Self {
        console::install_panic_hook();

        let sink = Canvas2dSink::new(canvas.clone(), config.stroke);
        let state = Rc::new_cyclic(|weak: &Weak<RefCell<CanvasState>>| {
            let weak = weak.clone();
            let on_frame: FrameCallback = Rc::new(move |pointer: PointerId, handle: FrameHandle| {
                let Some(shared) = weak.upgrade() else {
                    return;
                };
                let Ok(mut state) = shared.try_borrow_mut() else {
                    log::warn!("{handle:?} fired while the canvas was busy; skipped");
                    return;
                };
                state.batcher.scheduler_mut().retire(handle);
                state.batcher.run_frame(pointer, handle);
            });
            let batcher = StrokeBatcher::with_config(sink, RafScheduler::new(on_frame), &config);
            RefCell::new(CanvasState {
                batcher,
                canvas,
                config,
            })
        });
        Self { state }
    }
}

/// Samples for one move: the coalesced list when it holds at least one
/// full `(x, y)` pair, otherwise the event's own position.
fn move_samples(x: f64, y: f64, coalesced: &[f64]) -> Coalesced {
    if coalesced.len() >= 2 {
        points_from_flat(coalesced)
    } else {
        std::iter::once(Point::new(x, y)).collect()
    }
}

fn trace_to_json(trace: &StrokeTrace) -> Option<String> {
    serde_json::to_string(trace).ok()
}

/// Route Rust `log` output to the browser console at `level`
/// (`"error"`, `"warn"`, `"info"`, `"debug"`, `"trace"` or `"off"`).
#[wasm_bindgen]
pub fn init_logging(level: &str) {
    console::init_logging(console::parse_level(level));
}
