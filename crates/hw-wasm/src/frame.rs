//! `requestAnimationFrame`-backed scheduler.
//!
//! Every request owns a JS closure that must stay alive until it fires or is
//! cancelled. A fired closure cannot be dropped from inside its own call, so
//! it is parked in `spent` and released on the next request.

use hw_core::{FrameHandle, PointerId, Scheduler};
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

/// Invoked from the animation frame with the pointer and handle it was
/// requested for.
pub type FrameCallback = Rc<dyn Fn(PointerId, FrameHandle)>;

struct PendingFrame {
    raf_id: i32,
    closure: Closure<dyn FnMut(f64)>,
}

pub struct RafScheduler {
    window: Option<web_sys::Window>,
    on_frame: FrameCallback,
    live: HashMap<FrameHandle, PendingFrame>,
    spent: Vec<Closure<dyn FnMut(f64)>>,
    next_handle: u64,
}

impl RafScheduler {
    pub fn new(on_frame: FrameCallback) -> Self {
        Self {
            window: web_sys::window(),
            on_frame,
            live: HashMap::new(),
            spent: Vec::new(),
            next_handle: 0,
        }
    }

    /// Called from inside the frame callback for `handle`; keeps its closure
    /// alive until the callback has returned.
    pub fn retire(&mut self, handle: FrameHandle) {
        if let Some(frame) = self.live.remove(&handle) {
            self.spent.push(frame.closure);
        }
    }

    pub fn pending(&self) -> usize {
        self.live.len()
    }
}

impl Scheduler for RafScheduler {
    fn request_frame(&mut self, pointer: PointerId) -> FrameHandle {
        self.spent.clear();
        self.next_handle += 1;
        let handle = FrameHandle(self.next_handle);

        let Some(window) = &self.window else {
            log::warn!("no window; frame for {pointer} will never fire");
            return handle;
        };

        let on_frame = Rc::clone(&self.on_frame);
        let closure = Closure::wrap(
            Box::new(move |_timestamp: f64| on_frame(pointer, handle)) as Box<dyn FnMut(f64)>
        );
        match window.request_animation_frame(closure.as_ref().unchecked_ref()) {
            Ok(raf_id) => {
                self.live.insert(handle, PendingFrame { raf_id, closure });
            }
            Err(err) => log::warn!("requestAnimationFrame failed: {err:?}"),
        }
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if let Some(frame) = self.live.remove(&handle)
            && let Some(window) = &self.window
        {
            let _ = window.cancel_animation_frame(frame.raf_id);
        }
    }
}

impl Drop for RafScheduler {
    fn drop(&mut self) {
        // A registered callback whose closure is gone throws in JS.
        if let Some(window) = &self.window {
            for frame in self.live.values() {
                let _ = window.cancel_animation_frame(frame.raf_id);
            }
        }
    }
}
