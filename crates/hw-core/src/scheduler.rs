//! Frame-aligned scheduling capability.
//!
//! The batcher never draws from an input handler. It asks the host for a
//! callback at the next render frame and the host's loop driver answers by
//! calling [`StrokeBatcher::run_frame`](crate::batcher::StrokeBatcher::run_frame)
//! with the pointer and handle it was given. Hosts can back this with
//! `requestAnimationFrame`, a vsync callback, a timer, or explicit ticks.

use crate::input::PointerId;
use std::fmt;

/// Identifies one outstanding frame request.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

impl fmt::Debug for FrameHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame:{}", self.0)
    }
}

/// Requests and cancels frame callbacks on behalf of one pointer each.
pub trait Scheduler {
    /// Ask for `pointer` to be flushed at the next frame.
    fn request_frame(&mut self, pointer: PointerId) -> FrameHandle;

    /// Withdraw a request. Cancelling an already-fired or unknown handle is
    /// a no-op.
    fn cancel_frame(&mut self, handle: FrameHandle);
}

/// Headless scheduler: frames fire only when the owner drains the queue.
///
/// Used by tests and by native hosts that own their own render loop.
#[derive(Debug, Default)]
pub struct FrameQueue {
    next_handle: u64,
    pending: Vec<(FrameHandle, PointerId)>,
    cancelled: u64,
}

impl FrameQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return every request that is due at this frame, in the
    /// order they were made.
    pub fn take_due(&mut self) -> Vec<(PointerId, FrameHandle)> {
        self.pending
            .drain(..)
            .map(|(handle, pointer)| (pointer, handle))
            .collect()
    }

    /// Outstanding requests for one pointer.
    pub fn pending_for(&self, pointer: PointerId) -> usize {
        self.pending.iter().filter(|(_, p)| *p == pointer).count()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Total number of requests withdrawn before they fired.
    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }
}

impl Scheduler for FrameQueue {
    fn request_frame(&mut self, pointer: PointerId) -> FrameHandle {
        self.next_handle += 1;
        let handle = FrameHandle(self.next_handle);
        self.pending.push((handle, pointer));
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        let before = self.pending.len();
        self.pending.retain(|(h, _)| *h != handle);
        if self.pending.len() != before {
            self.cancelled += 1;
        }
    }
}
